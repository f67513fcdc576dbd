use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::record::UnifiedRecord;
use crate::error::{HarvestError, Result};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordState {
    #[default]
    Active,
    Deleted,
}

impl fmt::Display for RecordState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => f.write_str("active"),
            Self::Deleted => f.write_str("deleted"),
        }
    }
}

impl FromStr for RecordState {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "active" => Ok(Self::Active),
            "deleted" => Ok(Self::Deleted),
            other => Err(HarvestError::ValidationError(format!("unknown record state: {other}"))),
        }
    }
}

/// A unified record as persisted in the local catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub record: UnifiedRecord,
    /// Id of the owning group; its name is the OAI-PMH set spec.
    pub owner_org: Option<String>,
    pub private: bool,
    pub state: RecordState,
    pub metadata_created: DateTime<Utc>,
    pub metadata_modified: DateTime<Utc>,
}

impl StoredRecord {
    /// Wrap a freshly read record as an active, public catalog entry.
    pub fn new(record: UnifiedRecord) -> Self {
        let now = Utc::now();
        Self {
            record,
            owner_org: None,
            private: false,
            state: RecordState::Active,
            metadata_created: now,
            metadata_modified: now,
        }
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }
}

/// A catalog group, exposed as an OAI-PMH set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Group {
    pub id: String,
    pub name: String,
    pub title: String,
    pub description: String,
}
