use super::{IDA_PID_PREFIX, child_texts};
use crate::xml::Element;

pub const HELDA_DOMAIN: &str = "helda.helsinki.fi";
pub const HELDA_PROVIDER: &str = "http://helda.helsinki.fi/oai/request";
pub const IDA_PROVIDER: &str = "ida";
pub const UNKNOWN_PROVIDER: &str = "unknown";

/// Data identifiers of a record: direct `identifier` children, those
/// containing `urn` (any case) first. Relative order is kept within both
/// groups.
pub fn data_pids(dc: &Element) -> Vec<String> {
    let (urns, others): (Vec<&str>, Vec<&str>) = child_texts(dc, "identifier")
        .partition(|pid| pid.to_ascii_lowercase().contains("urn"));
    urns.into_iter().chain(others).map(str::to_string).collect()
}

/// Result of splitting the primary PID off the data identifiers.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PidPartition {
    pub primary: Option<String>,
    pub relations: Vec<String>,
}

/// Promote the first IDA identifier to primary; the rest become relations.
pub fn promote_primary(data_pids: &[String]) -> PidPartition {
    match data_pids.iter().position(|pid| pid.starts_with(IDA_PID_PREFIX)) {
        Some(index) => PidPartition {
            primary: Some(data_pids[index].clone()),
            relations: data_pids
                .iter()
                .enumerate()
                .filter(|(i, _)| *i != index)
                .map(|(_, pid)| pid.clone())
                .collect(),
        },
        None => PidPartition {
            primary: None,
            relations: data_pids.to_vec(),
        },
    }
}

/// Identifier of an OAI `header` nested in the payload, if any.
pub fn metadata_pids(dc: &Element) -> Vec<String> {
    dc.navigate(&["header", "identifier"])
        .and_then(Element::text)
        .map(|text| vec![text.to_string()])
        .unwrap_or_default()
}

/// Guess the metadata provider from every `identifier` in the document.
///
/// A Helda URL anywhere wins over an IDA URN anywhere.
pub fn provider(document: &Element) -> &'static str {
    let identifiers: Vec<&str> = document
        .find_all("identifier")
        .filter_map(Element::text)
        .collect();

    if identifiers.iter().any(|id| id.contains(HELDA_DOMAIN)) {
        HELDA_PROVIDER
    } else if identifiers.iter().any(|id| id.starts_with(IDA_PID_PREFIX)) {
        IDA_PROVIDER
    } else {
        UNKNOWN_PROVIDER
    }
}
