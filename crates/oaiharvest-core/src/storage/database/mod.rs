mod connection;
mod error;
mod migrations;
mod schema;

pub use connection::ConnectionPool;
pub use error::DatabaseError;
pub use migrations::{Migration, get_applied_versions, run_migrations};
pub use schema::SCHEMA_VERSION;

use std::path::Path;

use chrono::{DateTime, Utc};

use crate::catalog::CatalogLookup;
use crate::error::{HarvestError, Result};
use crate::models::{Group, PidType, StoredRecord};

use super::repositories::{
    GroupRepository, RecordQuery, RecordRepository, Repository, SqliteGroupRepository,
    SqliteRecordRepository,
};

pub fn open_database(path: &Path) -> Result<ConnectionPool> {
    let pool = ConnectionPool::open(path)?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

pub fn open_in_memory() -> Result<ConnectionPool> {
    let pool = ConnectionPool::open_in_memory()?;
    {
        let conn = pool.get_connection();
        migrations::run_migrations(&conn)?;
    }
    Ok(pool)
}

/// The local dataset catalog.
///
/// Every call takes the connection lock for its own duration only, so a
/// `Catalog` can be shared between harvest workers.
pub struct Catalog {
    pool: ConnectionPool,
}

impl Catalog {
    pub fn open(path: &Path) -> Result<Self> {
        let pool = open_database(path)?;
        Ok(Self { pool })
    }

    pub fn open_in_memory() -> Result<Self> {
        let pool = open_in_memory()?;
        Ok(Self { pool })
    }

    fn records(&self) -> SqliteRecordRepository<'_> {
        SqliteRecordRepository::new(self.pool.get_connection())
    }

    fn groups(&self) -> SqliteGroupRepository<'_> {
        SqliteGroupRepository::new(self.pool.get_connection())
    }

    pub fn save_record(&self, record: &StoredRecord) -> Result<()> {
        self.records().save(record)
    }

    pub fn get_record(&self, id: &str) -> Result<StoredRecord> {
        self.records()
            .find_by_id(id)?
            .ok_or_else(|| HarvestError::RecordNotFound(id.to_string()))
    }

    pub fn find_record(&self, id: &str) -> Result<Option<StoredRecord>> {
        self.records().find_by_id(id)
    }

    pub fn delete_record(&self, id: &str) -> Result<()> {
        if !self.records().delete(id)? {
            return Err(HarvestError::RecordNotFound(id.to_string()));
        }
        Ok(())
    }

    pub fn list_records(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>> {
        self.records().list(query)
    }

    pub fn count_records(&self) -> Result<usize> {
        self.records().count()
    }

    pub fn earliest_datestamp(&self) -> Result<Option<DateTime<Utc>>> {
        self.records().earliest_created()
    }

    pub fn save_group(&self, group: &Group) -> Result<()> {
        self.groups().save(group)
    }

    pub fn get_group(&self, id: &str) -> Result<Option<Group>> {
        self.groups().find_by_id(id)
    }

    pub fn find_group_by_name(&self, name: &str) -> Result<Option<Group>> {
        self.groups().find_by_name(name)
    }

    pub fn list_groups(&self) -> Result<Vec<Group>> {
        self.groups().list()
    }
}

impl CatalogLookup for Catalog {
    fn find_record_by_pid(&self, pid: &str, pid_type: PidType) -> Result<Option<String>> {
        self.records().find_by_pid(pid, pid_type)
    }

    fn record_exists(&self, id: &str) -> Result<bool> {
        self.records().exists(id)
    }
}
