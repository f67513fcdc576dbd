//! Selection of the reader for a harvest source.

use std::fmt;
use std::sync::Arc;

use oaiharvest_core::{CatalogLookup, PidType, UnifiedRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cmdi::{CmdiParser, CmdiReader, UnconfiguredCmdiParser};
use crate::context::ReaderContext;
use crate::datacite::DataCiteReader;
use crate::dc::{DcReader, DcVariant};
use crate::envelope::Envelope;
use crate::error::Result;
use crate::reader::MetadataReader;
use crate::xml::Element;

/// Metadata schemas with a reader. Unknown metadata prefixes read as
/// Dublin Core.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaKind {
    OaiDc(DcVariant),
    DataCite,
    Cmdi,
}

impl Default for SchemaKind {
    fn default() -> Self {
        Self::OaiDc(DcVariant::Default)
    }
}

impl SchemaKind {
    pub fn from_metadata_prefix(prefix: &str, harvest_type: &str) -> Self {
        match prefix.trim().to_ascii_lowercase().as_str() {
            "oai_datacite" | "datacite" => Self::DataCite,
            "cmdi0571" => Self::Cmdi,
            _ => Self::OaiDc(DcVariant::from_harvest_type(harvest_type)),
        }
    }

    pub fn metadata_prefix(&self) -> &'static str {
        match self {
            Self::OaiDc(_) => "oai_dc",
            Self::DataCite => "oai_datacite",
            Self::Cmdi => "cmdi0571",
        }
    }
}

impl fmt::Display for SchemaKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.metadata_prefix())
    }
}

/// The reader of one harvest source, chosen once from its [`SchemaKind`].
#[derive(Debug, Clone)]
pub enum HarvestReader {
    Dc(DcReader),
    DataCite(DataCiteReader),
    Cmdi(CmdiReader),
}

impl HarvestReader {
    /// CMDI sources get a parser that rejects every record; use
    /// [`HarvestReader::with_cmdi_parser`] to supply a real one.
    pub fn new(kind: SchemaKind, ctx: ReaderContext) -> Self {
        Self::with_cmdi_parser(kind, ctx, Arc::new(UnconfiguredCmdiParser))
    }

    pub fn with_cmdi_parser(
        kind: SchemaKind,
        ctx: ReaderContext,
        parser: Arc<dyn CmdiParser>,
    ) -> Self {
        debug!(schema = %kind, "reader selected");
        match kind {
            SchemaKind::OaiDc(variant) => Self::Dc(DcReader::new(ctx, variant)),
            SchemaKind::DataCite => Self::DataCite(DataCiteReader::new(ctx)),
            SchemaKind::Cmdi => Self::Cmdi(CmdiReader::new(ctx, parser)),
        }
    }

    pub fn kind(&self) -> SchemaKind {
        match self {
            Self::Dc(reader) => SchemaKind::OaiDc(reader.variant()),
            Self::DataCite(_) => SchemaKind::DataCite,
            Self::Cmdi(_) => SchemaKind::Cmdi,
        }
    }
}

impl MetadataReader for HarvestReader {
    fn read_data(&self, document: &Element) -> Result<UnifiedRecord> {
        match self {
            Self::Dc(reader) => reader.read_data(document),
            Self::DataCite(reader) => reader.read_data(document),
            Self::Cmdi(reader) => reader.read_data(document),
        }
    }
}

/// Catalog record to mark deleted for a deleted header: the record whose
/// primary pid is the header identifier.
pub fn resolve_deleted(envelope: &Envelope, lookup: &dyn CatalogLookup) -> Result<Option<String>> {
    if !envelope.deleted {
        return Ok(None);
    }
    let id = lookup.find_record_by_pid(&envelope.identifier, PidType::Primary)?;
    debug!(identifier = %envelope.identifier, found = id.is_some(), "deleted record resolved");
    Ok(id)
}
