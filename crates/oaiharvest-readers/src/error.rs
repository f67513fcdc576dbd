use oaiharvest_core::HarvestError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ReaderError {
    #[error("XML error: {0}")]
    Xml(#[from] quick_xml::Error),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("malformed OAI-PMH envelope: {0}")]
    MalformedEnvelope(String),

    #[error("mandatory element not found: {0}")]
    ElementNotFound(String),

    #[error("no catalog identifier could be resolved or generated for {0}")]
    IdentifierUnavailable(String),

    #[error("CMDI parser error: {0}")]
    Cmdi(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] HarvestError),
}

impl ReaderError {
    /// Protocol-level failure, as opposed to a problem with the metadata payload.
    pub fn is_envelope_error(&self) -> bool {
        matches!(self, Self::MalformedEnvelope(_))
    }
}

pub type Result<T> = std::result::Result<T, ReaderError>;
