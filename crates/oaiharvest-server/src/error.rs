use oaiharvest_core::HarvestError;
use thiserror::Error;

/// Errors of the OAI-PMH verbs. Protocol errors carry their OAI-PMH code.
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("no dataset with id {0}")]
    IdDoesNotExist(String),

    #[error("metadata format {0} is not supported")]
    CannotDisseminateFormat(String),

    #[error("no records match the request")]
    NoRecordsMatch,

    #[error("bad argument: {0}")]
    BadArgument(String),

    #[error("catalog error: {0}")]
    Catalog(#[from] HarvestError),
}

impl ProviderError {
    /// OAI-PMH error code, `None` for failures of the catalog itself.
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Self::IdDoesNotExist(_) => Some("idDoesNotExist"),
            Self::CannotDisseminateFormat(_) => Some("cannotDisseminateFormat"),
            Self::NoRecordsMatch => Some("noRecordsMatch"),
            Self::BadArgument(_) => Some("badArgument"),
            Self::Catalog(_) => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ProviderError>;
