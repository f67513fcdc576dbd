//! OAI-PMH verbs over the local catalog: datasets are records, groups are sets.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use oaiharvest_core::{Catalog, Group, HarvestConfig, RecordQuery, RecordState, SiteConfig, StoredRecord};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{ProviderError, Result};
use crate::mapping::{DcMetadata, dc_metadata};

pub const OAI_DC_PREFIX: &str = "oai_dc";
pub const PROTOCOL_VERSION: &str = "2.0";
pub const GRANULARITY: &str = "YYYY-MM-DDThh:mm:ssZ";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identify {
    pub repository_name: String,
    pub base_url: String,
    pub protocol_version: String,
    pub admin_emails: Vec<String>,
    pub earliest_datestamp: DateTime<Utc>,
    pub deleted_record: String,
    pub granularity: String,
    pub compression: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataFormat {
    pub prefix: String,
    pub schema: String,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    pub identifier: String,
    pub datestamp: DateTime<Utc>,
    pub set_specs: Vec<String>,
    pub deleted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub header: Header,
    pub metadata: DcMetadata,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetInfo {
    pub spec: String,
    pub name: String,
    pub description: String,
}

/// Arguments of ListIdentifiers / ListRecords.
#[derive(Debug, Clone, Default)]
pub struct ListQuery {
    pub set: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
    /// Offset of the first item; `None` lists everything.
    pub cursor: Option<usize>,
}

/// One batch of a list verb.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub complete_list_size: usize,
    /// Cursor of the following batch, if any items remain.
    pub next_cursor: Option<usize>,
}

impl<T> Page<T> {
    fn slice(all: Vec<T>, cursor: Option<usize>, batch_size: usize) -> Self {
        let complete_list_size = all.len();
        let Some(cursor) = cursor else {
            return Self {
                items: all,
                complete_list_size,
                next_cursor: None,
            };
        };
        let end = cursor.saturating_add(batch_size).min(complete_list_size);
        let items = all.into_iter().skip(cursor).take(end.saturating_sub(cursor)).collect();
        Self {
            items,
            complete_list_size,
            next_cursor: (end < complete_list_size).then_some(end),
        }
    }
}

pub struct Provider {
    catalog: Arc<Catalog>,
    site: SiteConfig,
    batch_size: usize,
}

impl Provider {
    pub fn new(catalog: Arc<Catalog>, config: &HarvestConfig) -> Self {
        Self {
            catalog,
            site: config.site.clone(),
            batch_size: config.provider.batch_size.max(1),
        }
    }

    pub fn identify(&self) -> Result<Identify> {
        let earliest = self.catalog.earliest_datestamp()?.unwrap_or_default();
        Ok(Identify {
            repository_name: self.site.site_title.clone(),
            base_url: format!("{}/oai", self.site.site_url.trim_end_matches('/')),
            protocol_version: PROTOCOL_VERSION.to_string(),
            admin_emails: self.site.admin_emails.clone(),
            earliest_datestamp: earliest,
            deleted_record: "no".to_string(),
            granularity: GRANULARITY.to_string(),
            compression: vec!["identity".to_string()],
        })
    }

    /// Only `oai_dc` is disseminated. With an identifier, the record must exist.
    pub fn list_metadata_formats(&self, identifier: Option<&str>) -> Result<Vec<MetadataFormat>> {
        if let Some(id) = identifier {
            self.active_record(id)?;
        }
        Ok(vec![MetadataFormat {
            prefix: OAI_DC_PREFIX.to_string(),
            schema: "http://www.openarchives.org/OAI/2.0/oai_dc.xsd".to_string(),
            namespace: "http://www.openarchives.org/OAI/2.0/oai_dc/".to_string(),
        }])
    }

    pub fn get_record(&self, metadata_prefix: &str, identifier: &str) -> Result<Record> {
        check_prefix(metadata_prefix)?;
        let stored = self.active_record(identifier)?;
        let spec = self.set_spec(&stored)?;
        Ok(self.record(&stored, spec))
    }

    pub fn list_identifiers(&self, metadata_prefix: &str, query: &ListQuery) -> Result<Page<Header>> {
        check_prefix(metadata_prefix)?;
        let page = self.select(query)?;
        Ok(Page {
            items: page.items.into_iter().map(|(stored, spec)| header(&stored, spec)).collect(),
            complete_list_size: page.complete_list_size,
            next_cursor: page.next_cursor,
        })
    }

    pub fn list_records(&self, metadata_prefix: &str, query: &ListQuery) -> Result<Page<Record>> {
        check_prefix(metadata_prefix)?;
        let page = self.select(query)?;
        Ok(Page {
            items: page
                .items
                .into_iter()
                .map(|(stored, spec)| self.record(&stored, spec))
                .collect(),
            complete_list_size: page.complete_list_size,
            next_cursor: page.next_cursor,
        })
    }

    /// Active groups as sets.
    pub fn list_sets(&self, cursor: Option<usize>) -> Result<Page<SetInfo>> {
        let sets = self
            .catalog
            .list_groups()?
            .into_iter()
            .map(|group| SetInfo {
                spec: group.name,
                name: group.title,
                description: group.description,
            })
            .collect();
        Ok(Page::slice(sets, cursor, self.batch_size))
    }

    fn active_record(&self, id: &str) -> Result<StoredRecord> {
        match self.catalog.find_record(id)? {
            Some(stored) if stored.state == RecordState::Active => Ok(stored),
            _ => Err(ProviderError::IdDoesNotExist(id.to_string())),
        }
    }

    /// Name of the owning group, or the record name.
    fn set_spec(&self, stored: &StoredRecord) -> Result<String> {
        let group = match &stored.owner_org {
            Some(owner) => self.catalog.get_group(owner)?,
            None => None,
        };
        Ok(group
            .map(|group| group.name)
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| stored.name().to_string()))
    }

    fn find_set(&self, set: &str) -> Result<Option<Group>> {
        match self.catalog.find_group_by_name(set)? {
            Some(group) => Ok(Some(group)),
            None => Ok(self.catalog.get_group(set)?),
        }
    }

    /// Matching records paired with their set spec.
    fn select(&self, query: &ListQuery) -> Result<Page<(StoredRecord, String)>> {
        if let (Some(from), Some(until)) = (query.from, query.until) {
            if from > until {
                return Err(ProviderError::BadArgument(format!(
                    "from {from} is later than until {until}"
                )));
            }
        }

        let matching = match &query.set {
            Some(set) => {
                let Some(group) = self.find_set(set)? else {
                    debug!(set = %set, "unknown set requested");
                    return Err(ProviderError::NoRecordsMatch);
                };
                self.catalog
                    .list_records(&RecordQuery {
                        owner_org: Some(group.id.clone()),
                        from: query.from,
                        until: query.until,
                    })?
                    .into_iter()
                    .map(|stored| (stored, group.name.clone()))
                    .collect::<Vec<_>>()
            }
            None => self
                .catalog
                .list_records(&RecordQuery {
                    owner_org: None,
                    from: query.from,
                    until: query.until,
                })?
                .into_iter()
                .map(|stored| {
                    let spec = self.set_spec(&stored)?;
                    Ok((stored, spec))
                })
                .collect::<Result<Vec<_>>>()?,
        };

        let page = Page::slice(matching, query.cursor, self.batch_size);
        if page.items.is_empty() {
            return Err(ProviderError::NoRecordsMatch);
        }
        debug!(
            returned = page.items.len(),
            total = page.complete_list_size,
            "records selected"
        );
        Ok(page)
    }

    fn record(&self, stored: &StoredRecord, spec: String) -> Record {
        Record {
            header: header(stored, spec),
            metadata: dc_metadata(stored, &self.site.site_url),
        }
    }
}

fn check_prefix(metadata_prefix: &str) -> Result<()> {
    if metadata_prefix == OAI_DC_PREFIX {
        Ok(())
    } else {
        Err(ProviderError::CannotDisseminateFormat(metadata_prefix.to_string()))
    }
}

fn header(stored: &StoredRecord, spec: String) -> Header {
    Header {
        identifier: stored.id().to_string(),
        datestamp: stored.metadata_created,
        set_specs: vec![spec],
        deleted: false,
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use oaiharvest_core::{Pid, UnifiedRecord};

    use super::*;

    fn at(year: i32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).unwrap()
    }

    fn save(catalog: &Catalog, id: &str, year: i32, owner: Option<&str>) {
        let mut stored = StoredRecord::new(UnifiedRecord {
            id: id.to_string(),
            name: format!("{id}-name"),
            title: format!(r#"{{"eng":"{id}"}}"#),
            pids: vec![Pid::primary(format!("urn:{id}"), "ida")],
            ..Default::default()
        });
        stored.owner_org = owner.map(str::to_string);
        stored.metadata_created = at(year);
        stored.metadata_modified = at(year);
        catalog.save_record(&stored).unwrap();
    }

    fn provider() -> Provider {
        let catalog = Catalog::open_in_memory().unwrap();
        catalog
            .save_group(&Group {
                id: "g1".to_string(),
                name: "physics".to_string(),
                title: "Physics".to_string(),
                description: "Physics data".to_string(),
            })
            .unwrap();
        save(&catalog, "a", 2010, Some("g1"));
        save(&catalog, "b", 2012, None);
        save(&catalog, "c", 2014, Some("g1"));

        let mut config = HarvestConfig::default();
        config.provider.batch_size = 2;
        Provider::new(Arc::new(catalog), &config)
    }

    #[test]
    fn test_identify() {
        let identify = provider().identify().unwrap();
        assert_eq!(identify.base_url, "http://localhost:5000/oai");
        assert_eq!(identify.protocol_version, "2.0");
        assert_eq!(identify.earliest_datestamp, at(2010));
        assert_eq!(identify.deleted_record, "no");
        assert_eq!(identify.granularity, "YYYY-MM-DDThh:mm:ssZ");
        assert_eq!(identify.compression, vec!["identity"]);
        assert_eq!(identify.admin_emails, vec!["etsin@csc.fi"]);
    }

    #[test]
    fn test_metadata_formats() {
        let provider = provider();
        let formats = provider.list_metadata_formats(None).unwrap();
        assert_eq!(formats.len(), 1);
        assert_eq!(formats[0].prefix, "oai_dc");
        assert!(matches!(
            provider.list_metadata_formats(Some("missing")),
            Err(ProviderError::IdDoesNotExist(_))
        ));
    }

    #[test]
    fn test_get_record_set_spec() {
        let provider = provider();
        let grouped = provider.get_record("oai_dc", "a").unwrap();
        assert_eq!(grouped.header.set_specs, vec!["physics"]);
        assert_eq!(grouped.metadata.get("title"), Some(&["a".to_string()][..]));

        let ungrouped = provider.get_record("oai_dc", "b").unwrap();
        assert_eq!(ungrouped.header.set_specs, vec!["b-name"]);
        assert_eq!(ungrouped.header.datestamp, at(2012));
    }

    #[test]
    fn test_get_record_errors() {
        let provider = provider();
        let err = provider.get_record("rdf", "a").unwrap_err();
        assert_eq!(err.code(), Some("cannotDisseminateFormat"));
        let err = provider.get_record("oai_dc", "zzz").unwrap_err();
        assert_eq!(err.code(), Some("idDoesNotExist"));

        provider.catalog.delete_record("a").unwrap();
        assert!(matches!(
            provider.get_record("oai_dc", "a"),
            Err(ProviderError::IdDoesNotExist(_))
        ));
    }

    #[test]
    fn test_list_identifiers_paging() {
        let provider = provider();
        let all = provider.list_identifiers("oai_dc", &ListQuery::default()).unwrap();
        let ids: Vec<_> = all.items.iter().map(|h| h.identifier.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
        assert_eq!(all.next_cursor, None);

        let first = provider
            .list_identifiers("oai_dc", &ListQuery { cursor: Some(0), ..Default::default() })
            .unwrap();
        assert_eq!(first.items.len(), 2);
        assert_eq!(first.complete_list_size, 3);
        assert_eq!(first.next_cursor, Some(2));

        let second = provider
            .list_identifiers("oai_dc", &ListQuery { cursor: Some(2), ..Default::default() })
            .unwrap();
        assert_eq!(second.items.len(), 1);
        assert_eq!(second.next_cursor, None);

        let past_end = provider.list_identifiers("oai_dc", &ListQuery { cursor: Some(5), ..Default::default() });
        assert!(matches!(past_end, Err(ProviderError::NoRecordsMatch)));
    }

    #[test]
    fn test_list_records_by_set_and_dates() {
        let provider = provider();
        let in_set = provider
            .list_records("oai_dc", &ListQuery { set: Some("physics".to_string()), ..Default::default() })
            .unwrap();
        assert_eq!(in_set.items.len(), 2);
        assert!(in_set.items.iter().all(|r| r.header.set_specs == vec!["physics"]));

        let window = provider
            .list_records(
                "oai_dc",
                &ListQuery {
                    from: Some(at(2011)),
                    until: Some(at(2012)),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(window.items.len(), 1);
        assert_eq!(window.items[0].header.identifier, "b");

        let unknown_set = provider.list_records("oai_dc", &ListQuery { set: Some("nope".into()), ..Default::default() });
        assert!(matches!(unknown_set, Err(ProviderError::NoRecordsMatch)));

        let reversed = provider.list_records(
            "oai_dc",
            &ListQuery { from: Some(at(2014)), until: Some(at(2010)), ..Default::default() },
        );
        assert_eq!(reversed.unwrap_err().code(), Some("badArgument"));
    }

    #[test]
    fn test_list_sets() {
        let sets = provider().list_sets(None).unwrap();
        assert_eq!(
            sets.items,
            vec![SetInfo {
                spec: "physics".to_string(),
                name: "Physics".to_string(),
                description: "Physics data".to_string(),
            }]
        );
    }
}
