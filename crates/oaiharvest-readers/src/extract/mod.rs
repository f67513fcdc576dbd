//! Small independent extractors over a Dublin-Core metadata subtree.
//!
//! Every extractor is best effort: a missing element yields an empty or
//! absent value and never an error.

pub mod agents;
pub mod format;
pub mod pids;
pub mod rights;

pub use agents::{OrgAuthor, Project, contributors, maintainers, org_authors, project, rights_holder};
pub use format::{algorithm, checksum, download_urls};
pub use pids::{PidPartition, data_pids, metadata_pids, promote_primary, provider};
pub use rights::{Rights, RightsCategory, dc_rights, ida_rights, read_rights};

use crate::xml::Element;

/// IDA persistent identifier namespace.
pub const IDA_PID_PREFIX: &str = "urn:nbn:fi:csc-ida";

/// First value that is present and not empty.
pub fn first_nonempty<I, S>(values: I) -> Option<S>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    values.into_iter().find(|value| !value.as_ref().is_empty())
}

/// Texts of direct children with this local name, in any namespace.
pub(crate) fn child_texts<'a>(parent: &'a Element, local_name: &'a str) -> impl Iterator<Item = &'a str> {
    parent.children_named(local_name).filter_map(Element::text)
}

/// Split a `key: value` description on its first colon.
pub fn key_value(text: &str) -> Option<(&str, &str)> {
    let (key, value) = text.trim().split_once(':')?;
    Some((key.trim(), value.trim()))
}
