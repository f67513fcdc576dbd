use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Connection(#[source] rusqlite::Error),

    #[error("Migration error at version {version}: {message}")]
    Migration { version: u32, message: String },
}

impl From<rusqlite::Error> for DatabaseError {
    fn from(e: rusqlite::Error) -> Self {
        DatabaseError::Connection(e)
    }
}
