use thiserror::Error;

/// All errors that can occur in oaiharvest-core.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Config error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] crate::storage::database::DatabaseError),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),
}

pub type Result<T> = std::result::Result<T, HarvestError>;
