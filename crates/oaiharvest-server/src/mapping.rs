//! Dublin-Core view of a stored catalog record.

use std::collections::BTreeMap;

use oaiharvest_core::{AgentRole, DATASET_TYPE, StoredRecord, UnifiedRecord};
use serde::{Deserialize, Serialize};

/// `oai_dc` element name → values. Fields without values are absent.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DcMetadata(BTreeMap<String, Vec<String>>);

impl DcMetadata {
    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn fields(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, values)| (name.as_str(), values.as_slice()))
    }

    fn set<I, S>(&mut self, field: &str, values: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values
            .into_iter()
            .map(Into::into)
            .filter(|value| !value.trim().is_empty())
            .collect();
        if !values.is_empty() {
            self.0.insert(field.to_string(), values);
        }
    }
}

/// Values of a JSON language map, or the raw string when it is not one.
fn json_values(raw: &str) -> Vec<String> {
    match serde_json::from_str::<BTreeMap<String, String>>(raw) {
        Ok(map) => map.into_values().collect(),
        Err(_) => vec![raw.to_string()],
    }
}

fn agent_names(record: &UnifiedRecord, role: AgentRole) -> Vec<String> {
    record
        .agents_with_role(role)
        .map(|agent| agent.name.clone())
        .collect()
}

pub fn dc_metadata(stored: &StoredRecord, site_url: &str) -> DcMetadata {
    let record = &stored.record;
    let mut dc = DcMetadata::default();

    let title = if record.title.is_empty() { &record.name } else { &record.title };
    dc.set("title", json_values(title));

    dc.set("creator", agent_names(record, AgentRole::Author));
    dc.set("contributor", agent_names(record, AgentRole::Contributor));
    dc.set("publisher", record.contact.iter().map(|contact| contact.name.clone()));

    let mut identifiers: Vec<String> = record.pids.iter().map(|pid| pid.id.clone()).collect();
    identifiers.push(record.id.clone());
    identifiers.push(format!("{}/dataset/{}", site_url.trim_end_matches('/'), record.name));
    dc.set("identifier", identifiers);

    dc.set("type", [DATASET_TYPE]);
    dc.set("language", record.language.split(',').map(str::trim));
    if !record.notes.is_empty() {
        dc.set("description", json_values(&record.notes));
    }
    dc.set("subject", record.tags());
    dc.set("date", [stored.metadata_created.format("%Y-%m-%d").to_string()]);
    dc.set("rights", [record.license_id.as_str()]);

    let mut coverage: Vec<String> = record
        .geographic_coverage
        .split(',')
        .map(str::to_string)
        .collect();
    if !record.temporal_coverage_begin.is_empty() || !record.temporal_coverage_end.is_empty() {
        coverage.push(format!(
            "{}/{}",
            record.temporal_coverage_begin, record.temporal_coverage_end
        ));
    }
    dc.set("coverage", coverage);

    dc
}
