//! DataCite kernel-3 reader (`oai_datacite`).
//!
//! Unlike the Dublin-Core reader, the mandatory DataCite properties
//! (identifier, title, publisher, publicationYear) are required: a document
//! missing one of them is rejected.

use chrono::Local;
use oaiharvest_core::identifiers::pid_to_name;
use oaiharvest_core::{
    Agent, AgentRole, Contact, DATASET_TYPE, Event, LangMap, Pid, UnifiedRecord,
};
use tracing::debug;

use crate::context::ReaderContext;
use crate::error::{ReaderError, Result};
use crate::namespaces::DATACITE;
use crate::reader::MetadataReader;
use crate::xml::Element;

/// DataCite payloads are harvested as English.
const DATACITE_LANG: &str = "eng";

const PUBLISHED_EVENT: &str = "published";
const PUBLISHED_DESCR: &str = "Dataset was published";
const UNKNOWN_WHO: &str = "unknown";

#[derive(Debug, Clone)]
pub struct DataCiteReader {
    ctx: ReaderContext,
}

/// First element with this name in the DataCite namespace. A blank element
/// counts as missing.
fn mandatory<'a>(document: &'a Element, name: &str) -> Result<&'a Element> {
    document
        .find_ns(name, DATACITE)
        .filter(|element| !element.text_trimmed().is_empty())
        .ok_or_else(|| ReaderError::ElementNotFound(name.to_string()))
}

fn text_of(element: &Element) -> String {
    element.text_trimmed().to_string()
}

/// Name and affiliation of a creator or contributor. The name is required.
fn agent(element: &Element, role: AgentRole, name_element: &str) -> Result<Agent> {
    let name = mandatory(element, name_element)?;
    let affiliation = element
        .find_ns("affiliation", DATACITE)
        .map(text_of)
        .unwrap_or_default();
    Ok(Agent::new(role, text_of(name), affiliation))
}

impl DataCiteReader {
    pub fn new(ctx: ReaderContext) -> Self {
        Self { ctx }
    }

    /// Every `descriptionType: text` pair, each followed by a space.
    fn description(document: &Element) -> String {
        document
            .find_all_ns("description", DATACITE)
            .map(|description| {
                format!(
                    "{}: {} ",
                    description.attr("descriptionType").unwrap_or_default(),
                    description.text_trimmed()
                )
            })
            .collect()
    }

    /// Every rights text and its `rightsURI`, space separated.
    fn license_url(document: &Element) -> String {
        document
            .find_all_ns("rights", DATACITE)
            .map(|rights| {
                format!(
                    "{} {} ",
                    rights.text_trimmed(),
                    rights.attr("rightsURI").unwrap_or_default()
                )
            })
            .collect()
    }
}

impl MetadataReader for DataCiteReader {
    fn read_data(&self, document: &Element) -> Result<UnifiedRecord> {
        let _entered = self.ctx.span.enter();

        let identifier = mandatory(document, "identifier")?;
        let title = text_of(mandatory(document, "title")?);
        let publisher = text_of(mandatory(document, "publisher")?);
        let publication_year = text_of(mandatory(document, "publicationYear")?);

        let primary = text_of(identifier);
        let pids = vec![Pid::primary(
            primary.as_str(),
            identifier.attr("identifierType").unwrap_or_default(),
        )];

        let mut agents = document
            .find_all_ns("creator", DATACITE)
            .map(|creator| agent(creator, AgentRole::Author, "creatorName"))
            .collect::<Result<Vec<_>>>()?;
        for contributor in document.find_all_ns("contributor", DATACITE) {
            agents.push(agent(contributor, AgentRole::Contributor, "contributorName")?);
        }

        let mut events = vec![Event {
            event_type: PUBLISHED_EVENT.to_string(),
            when: publication_year,
            who: publisher.clone(),
            descr: PUBLISHED_DESCR.to_string(),
        }];
        events.extend(document.find_all_ns("date", DATACITE).map(|date| {
            let date_type = date.attr("dateType").unwrap_or_default().to_string();
            Event {
                event_type: date_type.clone(),
                when: text_of(date),
                who: UNKNOWN_WHO.to_string(),
                descr: date_type,
            }
        }));

        let tags: Vec<String> = document
            .find_all_ns("subject", DATACITE)
            .map(text_of)
            .filter(|subject| !subject.is_empty())
            .collect();

        let id = self.ctx.resolve_id(Some(primary.as_str()))?;
        debug!(id = %id, pid = %primary, "datacite record read");

        Ok(UnifiedRecord {
            name: pid_to_name(&id),
            id,
            title: LangMap::single(DATACITE_LANG, title).to_json(),
            pids,
            agent: agents,
            contact: vec![Contact {
                name: publisher,
                ..Default::default()
            }],
            event: events,
            license_url: Self::license_url(document),
            notes: LangMap::single(DATACITE_LANG, Self::description(document)).to_json(),
            tag_string: tags.join(","),
            record_type: DATASET_TYPE.to_string(),
            version: Local::now().format("%Y-%m-%d").to_string(),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use oaiharvest_core::{Catalog, PidType, SiteConfig, StoredRecord, TimestampPidGenerator};

    use super::*;

    fn reader() -> (DataCiteReader, Arc<Catalog>) {
        let catalog = Arc::new(Catalog::open_in_memory().unwrap());
        let ctx = ReaderContext::new(
            SiteConfig::default(),
            catalog.clone(),
            Arc::new(TimestampPidGenerator::new("urn:nbn:fi:csc-kata")),
        );
        (DataCiteReader::new(ctx), catalog)
    }

    fn resource(body: &str) -> String {
        format!(
            r#"<record xmlns="http://www.openarchives.org/OAI/2.0/">
  <header><identifier>oai:datacite:1</identifier><datestamp>2016-01-01T00:00:00Z</datestamp></header>
  <metadata>
    <resource xmlns="http://datacite.org/schema/kernel-3">{body}</resource>
  </metadata>
</record>"#
        )
    }

    const MINIMAL: &str = r#"
      <identifier identifierType="DOI">10.5072/example</identifier>
      <creators><creator><creatorName>Doe, Jane</creatorName><affiliation>CSC</affiliation></creator></creators>
      <titles><title>Example dataset</title></titles>
      <publisher>CSC</publisher>
      <publicationYear>2015</publicationYear>"#;

    #[test]
    fn test_minimal_document() {
        let (reader, _) = reader();
        let harvested = reader.read_str(&resource(MINIMAL)).unwrap();
        let record = harvested.unified;

        assert_eq!(harvested.envelope.identifier, "oai:datacite:1");
        assert_eq!(record.pids.len(), 1);
        assert_eq!(record.pids[0].pid_type, PidType::Primary);
        assert_eq!(record.pids[0].id, "10.5072/example");
        assert_eq!(record.pids[0].provider, "DOI");

        assert_eq!(record.agent[0].role, AgentRole::Author);
        assert_eq!(record.agent[0].name, "Doe, Jane");
        assert_eq!(record.agent[0].organisation, "CSC");

        assert_eq!(record.event[0].event_type, "published");
        assert_eq!(record.event[0].when, "2015");
        assert_eq!(record.event[0].who, "CSC");

        assert_eq!(record.title, r#"{"eng":"Example dataset"}"#);
        assert_eq!(record.contact[0].name, "CSC");
        assert_eq!(record.record_type, "dataset");
        assert!(record.id.starts_with("urn:nbn:fi:csc-kata"));
        assert_eq!(record.version.len(), "2024-01-01".len());
    }

    #[test]
    fn test_collects_repeated_elements() {
        let body = format!(
            r#"{MINIMAL}
      <contributors><contributor contributorType="DataCurator"><contributorName>Curator</contributorName></contributor></contributors>
      <subjects><subject>physics</subject><subject>optics</subject></subjects>
      <dates><date dateType="Created">2014-01-01</date><date dateType="Updated">2015-06-01</date></dates>
      <descriptions>
        <description descriptionType="Abstract">Short abstract</description>
        <description descriptionType="Methods">Measured</description>
      </descriptions>
      <rightsList>
        <rights rightsURI="http://cc/by">CC BY</rights>
        <rights rightsURI="http://cc/by-sa">CC BY-SA</rights>
      </rightsList>"#
        );
        let (reader, _) = reader();
        let record = reader.read_str(&resource(&body)).unwrap().unified;

        assert_eq!(record.agent.len(), 2);
        assert_eq!(record.agent[1].role, AgentRole::Contributor);
        assert_eq!(record.agent[1].organisation, "");

        let events: Vec<_> = record.event.iter().map(|e| (e.event_type.as_str(), e.who.as_str())).collect();
        assert_eq!(
            events,
            vec![("published", "CSC"), ("Created", "unknown"), ("Updated", "unknown")]
        );

        assert_eq!(record.tag_string, "physics,optics");
        assert_eq!(record.license_url, "CC BY http://cc/by CC BY-SA http://cc/by-sa ");
        let notes = LangMap::from_json(&record.notes).unwrap();
        assert_eq!(notes.get("eng"), Some("Abstract: Short abstract Methods: Measured "));
    }

    #[test]
    fn test_missing_mandatory_fields() {
        let (reader, _) = reader();
        for (missing, name) in [
            (r#"<identifier identifierType="DOI">10.5072/example</identifier>"#, "identifier"),
            ("<title>Example dataset</title>", "title"),
            ("<publisher>CSC</publisher>", "publisher"),
            ("<publicationYear>2015</publicationYear>", "publicationYear"),
        ] {
            let body = MINIMAL.replace(missing, "");
            let err = reader.read_str(&resource(&body)).unwrap_err();
            assert!(matches!(err, ReaderError::ElementNotFound(ref found) if found == name), "{missing}");
        }

        let nameless = MINIMAL.replace("<creatorName>Doe, Jane</creatorName>", "");
        let err = reader.read_str(&resource(&nameless)).unwrap_err();
        assert!(matches!(err, ReaderError::ElementNotFound(ref name) if name == "creatorName"));
    }

    #[test]
    fn test_blank_mandatory_fields_are_missing() {
        let (reader, catalog) = reader();
        for (element, blank, name) in [
            (
                r#"<identifier identifierType="DOI">10.5072/example</identifier>"#,
                r#"<identifier identifierType="DOI"/>"#,
                "identifier",
            ),
            (
                r#"<identifier identifierType="DOI">10.5072/example</identifier>"#,
                r#"<identifier identifierType="DOI">   </identifier>"#,
                "identifier",
            ),
            ("<title>Example dataset</title>", "<title></title>", "title"),
            ("<publisher>CSC</publisher>", "<publisher/>", "publisher"),
        ] {
            let body = MINIMAL.replace(element, blank);
            let err = reader.read_str(&resource(&body)).unwrap_err();
            assert!(matches!(err, ReaderError::ElementNotFound(ref found) if found == name), "{blank}");
        }
        assert_eq!(catalog.count_records().unwrap(), 0);
    }

    #[test]
    fn test_elements_outside_namespace_do_not_count() {
        let (reader, _) = reader();
        let xml = resource(MINIMAL).replace(
            r#"<resource xmlns="http://datacite.org/schema/kernel-3">"#,
            r#"<resource xmlns="http://datacite.org/schema/kernel-4">"#,
        );
        let err = reader.read_str(&xml).unwrap_err();
        assert!(matches!(err, ReaderError::ElementNotFound(ref name) if name == "identifier"));
    }

    #[test]
    fn test_known_pid_resolves_to_existing_record() {
        let (reader, catalog) = reader();
        let first = reader.read_str(&resource(MINIMAL)).unwrap().unified;
        catalog.save_record(&StoredRecord::new(first.clone())).unwrap();

        let second = reader.read_str(&resource(MINIMAL)).unwrap().unified;
        assert_eq!(second.id, first.id);
    }
}
