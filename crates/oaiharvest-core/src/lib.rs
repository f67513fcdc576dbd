pub mod catalog;
pub mod config;
pub mod error;
pub mod identifiers;
pub mod models;
pub mod storage;

pub use catalog::{CatalogLookup, MAX_ID_ATTEMPTS, PidGenerator, TimestampPidGenerator};
pub use config::{HarvestConfig, SiteConfig};
pub use error::{HarvestError, Result};
pub use models::*;

pub use storage::database::{Catalog, ConnectionPool, DatabaseError, open_database, open_in_memory};
pub use storage::repositories::{
    GroupRepository, RecordQuery, RecordRepository, Repository, SqliteGroupRepository,
    SqliteRecordRepository,
};
