use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{HarvestError, Result};

/// Value of `UnifiedRecord::type` for every harvested record.
pub const DATASET_TYPE: &str = "dataset";

/// Relation label attached to non-primary PIDs.
pub const GENERAL_RELATION: &str = "generalRelation";

/// Fixed availability vocabulary produced by rights classification.
pub mod availability {
    pub const CONTACT_OWNER: &str = "contact_owner";
    pub const DIRECT_DOWNLOAD: &str = "direct_download";
    pub const ACCESS_APPLICATION_OTHER: &str = "access_application_other";
}

// ─── PIDs ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PidType {
    Primary,
    Relation,
    Version,
}

impl PidType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Primary => "primary",
            Self::Relation => "relation",
            Self::Version => "version",
        }
    }
}

impl fmt::Display for PidType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PidType {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "primary" => Ok(Self::Primary),
            "relation" => Ok(Self::Relation),
            "version" => Ok(Self::Version),
            other => Err(HarvestError::ValidationError(format!("unknown pid type: {other}"))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pid {
    pub id: String,
    #[serde(rename = "type")]
    pub pid_type: PidType,
    pub provider: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relation: Option<String>,
}

impl Pid {
    pub fn primary(id: impl Into<String>, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pid_type: PidType::Primary,
            provider: provider.into(),
            relation: None,
        }
    }

    /// A `generalRelation` PID of the given type.
    pub fn related(id: impl Into<String>, pid_type: PidType, provider: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            pid_type,
            provider: provider.into(),
            relation: Some(GENERAL_RELATION.to_string()),
        }
    }

    pub fn is_primary(&self) -> bool {
        self.pid_type == PidType::Primary
    }
}

// ─── Agents, contacts, events ──────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AgentRole {
    Author,
    Contributor,
    Funder,
    Owner,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Agent {
    pub role: AgentRole,
    pub name: String,
    pub organisation: String,
    pub id: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub fundingid: String,
}

impl Agent {
    /// Agent with only role, name and organisation filled in.
    pub fn new(role: AgentRole, name: impl Into<String>, organisation: impl Into<String>) -> Self {
        Self {
            role,
            name: name.into(),
            organisation: organisation.into(),
            id: String::new(),
            url: String::new(),
            fundingid: String::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub name: String,
    pub email: String,
    #[serde(rename = "URL")]
    pub url: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    #[serde(rename = "type")]
    pub event_type: String,
    pub when: String,
    pub who: String,
    pub descr: String,
}

// ─── Language maps ─────────────────────────────────────────

/// Language code → text, JSON-encoded in `title` and `notes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LangMap(BTreeMap<String, String>);

impl LangMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(lang: impl Into<String>, text: impl Into<String>) -> Self {
        let mut map = Self::new();
        map.insert(lang, text);
        map
    }

    /// Later values for the same language replace earlier ones.
    pub fn insert(&mut self, lang: impl Into<String>, text: impl Into<String>) {
        self.0.insert(lang.into(), text.into());
    }

    pub fn get(&self, lang: &str) -> Option<&str> {
        self.0.get(lang).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn values(&self) -> impl Iterator<Item = &str> {
        self.0.values().map(String::as_str)
    }

    /// Encode as a JSON object. An empty map encodes as `{"und": ""}`.
    pub fn to_json(&self) -> String {
        let encoded = if self.0.is_empty() {
            serde_json::to_string(&Self::single("und", ""))
        } else {
            serde_json::to_string(self)
        };
        encoded.unwrap_or_else(|_| "{}".to_string())
    }

    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

// ─── Unified record ────────────────────────────────────────

/// Schema-independent representation of one harvested dataset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnifiedRecord {
    pub id: String,
    pub name: String,
    /// JSON object of language → title.
    pub title: String,
    pub pids: Vec<Pid>,
    pub agent: Vec<Agent>,
    pub contact: Vec<Contact>,
    pub event: Vec<Event>,
    pub license_id: String,
    #[serde(rename = "license_URL")]
    pub license_url: String,
    #[serde(rename = "access_application_URL")]
    pub access_application_url: String,
    #[serde(rename = "access_request_URL")]
    pub access_request_url: String,
    pub availability: String,
    pub tag_string: String,
    pub language: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub langdis: bool,
    /// JSON object of language → description.
    pub notes: String,
    pub version: String,
    #[serde(rename = "type")]
    pub record_type: String,
    pub algorithm: String,
    pub checksum: String,
    #[serde(rename = "direct_download_URL")]
    pub direct_download_url: String,
    pub discipline: String,
    pub geographic_coverage: String,
    pub mimetype: String,
    pub smear_url: String,
    pub temporal_coverage_begin: String,
    pub temporal_coverage_end: String,
    pub uploader: String,
}

impl UnifiedRecord {
    pub fn primary_pid(&self) -> Option<&Pid> {
        self.pids.iter().find(|pid| pid.is_primary())
    }

    pub fn agents_with_role(&self, role: AgentRole) -> impl Iterator<Item = &Agent> {
        self.agent.iter().filter(move |agent| agent.role == role)
    }

    pub fn tags(&self) -> impl Iterator<Item = &str> {
        self.tag_string.split(',').map(str::trim).filter(|tag| !tag.is_empty())
    }
}
