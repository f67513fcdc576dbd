use std::str::FromStr;
use std::sync::MutexGuard;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{Connection, OptionalExtension, params};

use crate::error::{HarvestError, Result};
use crate::models::{PidType, RecordState, StoredRecord, UnifiedRecord};

use super::Repository;

pub trait RecordRepository: Repository<Entity = StoredRecord, Id = str> {
    /// Owner of the active PID-extra `pid` whose companion type extra equals `pid_type`.
    fn find_by_pid(&self, pid: &str, pid_type: PidType) -> Result<Option<String>>;
    fn exists(&self, id: &str) -> Result<bool>;
    /// Active, public records matching `query`, oldest first.
    fn list(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>>;
    fn count(&self) -> Result<usize>;
    fn earliest_created(&self) -> Result<Option<DateTime<Utc>>>;
}

/// Selection used by the OAI-PMH list verbs. Date bounds are inclusive.
#[derive(Debug, Clone, Default)]
pub struct RecordQuery {
    pub owner_org: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

pub struct SqliteRecordRepository<'a> {
    conn: MutexGuard<'a, Connection>,
}

/// Fixed-width UTC timestamps so that text comparison orders correctly.
fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn pid_type_key(id_key: &str) -> Option<String> {
    id_key
        .split('_')
        .nth(1)
        .map(|index| format!("pids_{index}_type"))
}

impl<'a> SqliteRecordRepository<'a> {
    pub fn new(conn: MutexGuard<'a, Connection>) -> Self {
        Self { conn }
    }

    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<StoredRecord> {
        let record_json: String = row.get(0)?;
        let state: String = row.get(3)?;
        let created: String = row.get(4)?;
        let modified: String = row.get(5)?;

        let record: UnifiedRecord = serde_json::from_str(&record_json)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(0, Type::Text, Box::new(e)))?;

        Ok(StoredRecord {
            record,
            owner_org: row.get(1)?,
            private: row.get(2)?,
            state: RecordState::from_str(&state).unwrap_or_default(),
            metadata_created: parse_timestamp(4, &created)?,
            metadata_modified: parse_timestamp(5, &modified)?,
        })
    }
}

const RECORD_COLUMNS: &str =
    "record, owner_org, private, state, metadata_created, metadata_modified";

impl<'a> Repository for SqliteRecordRepository<'a> {
    type Entity = StoredRecord;
    type Id = str;

    fn find_by_id(&self, id: &str) -> Result<Option<StoredRecord>> {
        let sql = format!("SELECT {RECORD_COLUMNS} FROM packages WHERE id = ?1");
        let record = self
            .conn
            .query_row(&sql, params![id], Self::row_to_record)
            .optional()?;
        Ok(record)
    }

    /// Insert or update the record by id and rebuild its PID extras.
    ///
    /// Fails without touching the catalog when another record already uses
    /// the same name.
    fn save(&self, stored: &StoredRecord) -> Result<()> {
        let record_json = serde_json::to_string(&stored.record)?;
        let tx = self.conn.unchecked_transaction()?;

        let holder: Option<String> = tx
            .query_row(
                "SELECT id FROM packages WHERE name = ?1 AND id <> ?2",
                params![stored.record.name, stored.record.id],
                |row| row.get(0),
            )
            .optional()?;
        if let Some(holder) = holder {
            return Err(HarvestError::ValidationError(format!(
                "record name {} of {} is already used by {holder}",
                stored.record.name, stored.record.id
            )));
        }

        tx.execute(
            "INSERT INTO packages
                (id, name, title, owner_org, private, state,
                 metadata_created, metadata_modified, record)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                title = excluded.title,
                owner_org = excluded.owner_org,
                private = excluded.private,
                state = excluded.state,
                metadata_created = excluded.metadata_created,
                metadata_modified = excluded.metadata_modified,
                record = excluded.record",
            params![
                stored.record.id,
                stored.record.name,
                stored.record.title,
                stored.owner_org,
                stored.private,
                stored.state.to_string(),
                format_timestamp(&stored.metadata_created),
                format_timestamp(&stored.metadata_modified),
                record_json,
            ],
        )?;

        tx.execute(
            "DELETE FROM package_extras WHERE package_id = ?1",
            params![stored.record.id],
        )?;

        let extra_state = stored.state.to_string();
        for (index, pid) in stored.record.pids.iter().enumerate() {
            for (field, value) in [
                ("id", pid.id.as_str()),
                ("type", pid.pid_type.as_str()),
                ("provider", pid.provider.as_str()),
            ] {
                tx.execute(
                    "INSERT INTO package_extras (package_id, key, value, state)
                     VALUES (?1, ?2, ?3, ?4)",
                    params![stored.record.id, format!("pids_{index}_{field}"), value, extra_state],
                )?;
            }
        }

        tx.commit()?;
        Ok(())
    }

    /// Marks the record and its extras deleted; rows are kept.
    fn delete(&self, id: &str) -> Result<bool> {
        let now = format_timestamp(&Utc::now());
        let tx = self.conn.unchecked_transaction()?;
        let changed = tx.execute(
            "UPDATE packages SET state = 'deleted', metadata_modified = ?2
             WHERE id = ?1 AND state = 'active'",
            params![id, now],
        )?;
        if changed > 0 {
            tx.execute(
                "UPDATE package_extras SET state = 'deleted' WHERE package_id = ?1",
                params![id],
            )?;
        }
        tx.commit()?;
        Ok(changed > 0)
    }
}

impl<'a> RecordRepository for SqliteRecordRepository<'a> {
    fn find_by_pid(&self, pid: &str, pid_type: PidType) -> Result<Option<String>> {
        let mut stmt = self.conn.prepare(
            "SELECT key, package_id FROM package_extras
             WHERE value = ?1 AND key LIKE 'pids_%_id' AND state = 'active'
             ORDER BY rowid",
        )?;
        let candidates = stmt
            .query_map(params![pid], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        for (id_key, package_id) in candidates {
            let Some(type_key) = pid_type_key(&id_key) else {
                continue;
            };
            let owner: Option<String> = self
                .conn
                .query_row(
                    "SELECT package_id FROM package_extras
                     WHERE value = ?1 AND key = ?2 AND state = 'active' AND package_id = ?3",
                    params![pid_type.as_str(), type_key, package_id],
                    |row| row.get(0),
                )
                .optional()?;
            if owner.is_some() {
                return Ok(owner);
            }
        }

        Ok(None)
    }

    fn exists(&self, id: &str) -> Result<bool> {
        let exists = self
            .conn
            .prepare("SELECT 1 FROM packages WHERE id = ?1")?
            .exists(params![id])?;
        Ok(exists)
    }

    fn list(&self, query: &RecordQuery) -> Result<Vec<StoredRecord>> {
        let sql = format!(
            "SELECT {RECORD_COLUMNS} FROM packages
             WHERE state = 'active' AND private = 0
               AND (?1 IS NULL OR owner_org = ?1)
               AND (?2 IS NULL OR metadata_modified >= ?2)
               AND (?3 IS NULL OR metadata_modified <= ?3)
             ORDER BY metadata_created, id"
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt
            .query_map(
                params![
                    query.owner_org,
                    query.from.as_ref().map(format_timestamp),
                    query.until.as_ref().map(format_timestamp),
                ],
                Self::row_to_record,
            )?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    fn count(&self) -> Result<usize> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM packages WHERE state = 'active'",
            [],
            |row| row.get(0),
        )?;
        Ok(count as usize)
    }

    fn earliest_created(&self) -> Result<Option<DateTime<Utc>>> {
        let earliest: Option<String> = self.conn.query_row(
            "SELECT MIN(metadata_created) FROM packages WHERE state = 'active'",
            [],
            |row| row.get(0),
        )?;
        earliest
            .map(|value| parse_timestamp(0, &value).map_err(HarvestError::from))
            .transpose()
    }
}
