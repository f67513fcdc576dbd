//! Dublin-Core family reader (`oai_dc`), with an IDA-specific variant.

use oaiharvest_core::availability::CONTACT_OWNER;
use oaiharvest_core::identifiers::pid_to_name;
use oaiharvest_core::{
    Agent, AgentRole, Contact, DATASET_TYPE, LangMap, Pid, PidType, UnifiedRecord,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::context::ReaderContext;
use crate::error::Result;
use crate::extract::{self, first_nonempty, key_value};
use crate::language::{UNDETERMINED, convert_language};
use crate::namespaces::{CSCIDA, DC};
use crate::reader::MetadataReader;
use crate::xml::Element;

/// Description marker of IDA download notes.
const DIRECT_DOWNLOAD_MARKER: &str = "direct_download";

const NOTES_SEPARATOR: &str = "\r\n\r\n";

/// Source-specific behaviour of the Dublin-Core reader.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DcVariant {
    #[default]
    Default,
    Ida,
}

impl DcVariant {
    /// `ida` in any case selects [`DcVariant::Ida`]; anything else the default.
    pub fn from_harvest_type(harvest_type: &str) -> Self {
        if harvest_type.trim().eq_ignore_ascii_case("ida") {
            Self::Ida
        } else {
            Self::Default
        }
    }

    fn skip_note(&self, note: &str) -> bool {
        match self {
            Self::Default => false,
            Self::Ida => note.trim().is_empty() || note.contains(DIRECT_DOWNLOAD_MARKER),
        }
    }

    fn maintainers(&self, dc: &Element) -> Vec<Contact> {
        let contacts = extract::maintainers(dc);
        match self {
            Self::Default => contacts,
            // IDA puts placeholders such as "person" in place of the URL.
            Self::Ida => contacts
                .into_iter()
                .map(|contact| Contact { url: String::new(), ..contact })
                .collect(),
        }
    }

    /// Availability candidates used when the rights gave none.
    fn availability(&self, dc: &Element) -> Vec<String> {
        match self {
            Self::Default => vec![CONTACT_OWNER.to_string()],
            Self::Ida => match cscida_text(dc, "availability") {
                Some(value) => vec![value],
                None => description_values(dc, "availability"),
            },
        }
    }

    fn uploader(&self, dc: &Element) -> String {
        match self {
            Self::Default => String::new(),
            Self::Ida => cscida_text(dc, "uploader").unwrap_or_default(),
        }
    }

    fn version_pids(&self, dc: &Element) -> Vec<String> {
        match self {
            Self::Default => Vec::new(),
            Self::Ida => {
                let versions: Vec<String> = dc
                    .children_ns("Identifier.version", CSCIDA)
                    .map(|version| version.text_trimmed().to_string())
                    .collect();
                if versions.is_empty() {
                    description_values(dc, "Identifier.version")
                } else {
                    versions
                }
            }
        }
    }

    fn mime_type(&self, dc: &Element) -> String {
        match self {
            Self::Default => extract::child_texts(dc, "format")
                .find(|format| format.contains('/'))
                .unwrap_or_default()
                .to_string(),
            Self::Ida => cscida_text(dc, "general.mime_type")
                .or_else(|| description_values(dc, "general.mime_type").into_iter().next())
                .unwrap_or_default(),
        }
    }
}

fn cscida_text(dc: &Element, name: &str) -> Option<String> {
    dc.children_ns(name, CSCIDA)
        .next()
        .map(|element| element.text_trimmed().to_string())
}

/// Values of `key: value` formatted `dc:description` entries with this key.
fn description_values(dc: &Element, key: &str) -> Vec<String> {
    dc.children_ns("description", DC)
        .filter_map(Element::text)
        .filter_map(key_value)
        .filter(|(description_key, _)| *description_key == key)
        .map(|(_, value)| value.to_string())
        .collect()
}

/// Reader for `oai_dc` payloads.
#[derive(Debug, Clone)]
pub struct DcReader {
    ctx: ReaderContext,
    variant: DcVariant,
}

impl DcReader {
    pub fn new(ctx: ReaderContext, variant: DcVariant) -> Self {
        Self { ctx, variant }
    }

    pub fn variant(&self) -> DcVariant {
        self.variant
    }

    fn title(dc: &Element) -> String {
        let mut titles = LangMap::new();
        for title in dc.children_named("title") {
            let lang = convert_language(title.attr("lang").unwrap_or_default());
            titles.insert(lang, title.text_trimmed());
        }
        titles.to_json()
    }

    fn notes(&self, dc: &Element) -> String {
        let mut notes: Vec<&str> = dc
            .children_ns("description", DC)
            .filter_map(Element::text)
            .filter(|note| !self.variant.skip_note(note))
            .collect();
        notes.sort_unstable();
        LangMap::single(UNDETERMINED, notes.join(NOTES_SEPARATOR)).to_json()
    }

    /// Terminology codes of every `language`, sorted and comma-joined.
    /// Values without a known code are kept as given.
    fn language(dc: &Element) -> String {
        let mut languages: Vec<String> = extract::child_texts(dc, "language")
            .map(str::trim)
            .filter(|lang| !lang.is_empty())
            .map(|lang| match convert_language(lang) {
                UNDETERMINED => lang.to_lowercase(),
                code => code.to_string(),
            })
            .collect();
        languages.sort();
        languages.join(",")
    }

    fn version(dc: &Element) -> String {
        dc.find("modified")
            .or_else(|| dc.find("date"))
            .map(Element::text_trimmed)
            .unwrap_or_default()
            .to_string()
    }

    fn agents(dc: &Element) -> Vec<Agent> {
        let mut agents: Vec<Agent> = extract::org_authors(dc)
            .into_iter()
            .map(|author| Agent::new(AgentRole::Author, author.name, author.organisation))
            .collect();

        agents.extend(
            extract::contributors(dc)
                .into_iter()
                .map(|c| Agent::new(AgentRole::Contributor, c.name, c.organisation)),
        );

        let project = extract::project(dc).unwrap_or_default();
        agents.push(Agent {
            id: project.name.clone(),
            url: project.homepage,
            fundingid: project.funding,
            ..Agent::new(AgentRole::Funder, project.name, project.funder)
        });

        agents.push(Agent::new(
            AgentRole::Owner,
            extract::rights_holder(dc).unwrap_or_default(),
            "",
        ));
        agents
    }
}

impl MetadataReader for DcReader {
    fn read_data(&self, document: &Element) -> Result<UnifiedRecord> {
        let _entered = self.ctx.span.enter();

        let empty = Element::default();
        let dc = match document.find("metadata").and_then(|metadata| metadata.find("dc")) {
            Some(dc) => dc,
            None => {
                info!("record has no dublin core payload");
                &empty
            }
        };

        let rights = extract::read_rights(dc);
        let availability = if rights.availability.is_empty() {
            first_nonempty(self.variant.availability(dc)).unwrap_or_default()
        } else {
            rights.availability
        };

        let data_pids = extract::data_pids(dc);
        let partition = extract::promote_primary(&data_pids);
        let provider = extract::provider(document);

        let mut pids: Vec<Pid> = partition
            .primary
            .iter()
            .map(|id| Pid::primary(id.as_str(), provider))
            .collect();
        pids.extend(
            partition
                .relations
                .iter()
                .map(|id| Pid::related(id.as_str(), PidType::Relation, provider)),
        );
        pids.extend(
            self.variant
                .version_pids(dc)
                .into_iter()
                .map(|id| Pid::related(id, PidType::Version, provider)),
        );
        pids.extend(
            extract::metadata_pids(dc)
                .into_iter()
                .map(|id| Pid::related(id, PidType::Relation, provider)),
        );

        let tags: Vec<&str> = extract::child_texts(dc, "subject")
            .map(str::trim)
            .filter(|tag| !tag.is_empty())
            .collect();

        let language = Self::language(dc);

        let id = self.ctx.resolve_id(partition.primary.as_deref())?;
        if !pids.iter().any(Pid::is_primary) {
            debug!(id = %id, "no primary pid in record, using catalog id");
            pids.push(Pid::primary(id.as_str(), self.ctx.site.site_url.as_str()));
        }

        Ok(UnifiedRecord {
            name: pid_to_name(&id),
            id,
            title: Self::title(dc),
            pids,
            agent: Self::agents(dc),
            contact: self.variant.maintainers(dc),
            license_id: if rights.license_id.is_empty() {
                "notspecified".to_string()
            } else {
                rights.license_id
            },
            license_url: rights.license_url,
            access_application_url: rights.access_application_url,
            availability,
            tag_string: tags.join(","),
            langdis: language.is_empty(),
            language,
            notes: self.notes(dc),
            version: Self::version(dc),
            record_type: DATASET_TYPE.to_string(),
            algorithm: extract::algorithm(dc).unwrap_or_default(),
            checksum: extract::checksum(dc).unwrap_or_default(),
            direct_download_url: first_nonempty(extract::download_urls(dc, true)).unwrap_or_default(),
            smear_url: first_nonempty(extract::download_urls(dc, false)).unwrap_or_default(),
            mimetype: self.variant.mime_type(dc),
            uploader: self.variant.uploader(dc),
            ..Default::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use oaiharvest_core::{Catalog, CatalogLookup, PidGenerator, SiteConfig, StoredRecord};

    use super::*;

    struct Counter(AtomicUsize);

    impl PidGenerator for Counter {
        fn generate(&self) -> String {
            format!("urn:nbn:fi:csc-kata{}", self.0.fetch_add(1, Ordering::SeqCst))
        }
    }

    fn context(catalog: Arc<Catalog>) -> ReaderContext {
        ReaderContext::new(SiteConfig::default(), catalog, Arc::new(Counter(AtomicUsize::new(1))))
    }

    fn reader(variant: DcVariant) -> (DcReader, Arc<Catalog>) {
        let catalog = Arc::new(Catalog::open_in_memory().unwrap());
        (DcReader::new(context(catalog.clone()), variant), catalog)
    }

    const IDA_RECORD: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<record xmlns="http://www.openarchives.org/OAI/2.0/">
  <header>
    <identifier>oai:ida:1</identifier>
    <datestamp>2014-05-06T07:08:09Z</datestamp>
    <setSpec>ida</setSpec>
  </header>
  <metadata>
    <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
               xmlns:dc="http://purl.org/dc/elements/1.1/"
               xmlns:dct="http://purl.org/dc/terms/"
               xmlns:foaf="http://xmlns.com/foaf/0.1/"
               xmlns:cscida="http://etsin.avointiede.fi/cscida/">
      <dc:title xml:lang="en">Climate data</dc:title>
      <dc:title xml:lang="fi">Ilmastodata</dc:title>
      <dc:identifier>http://example.org/landing</dc:identifier>
      <dc:identifier>urn:nbn:fi:csc-ida2014010812345</dc:identifier>
      <dc:identifier>urn:isbn:978</dc:identifier>
      <dc:language>fi</dc:language>
      <dc:language>en</dc:language>
      <dc:subject>climate</dc:subject>
      <dc:subject>weather</dc:subject>
      <dc:description>Long term measurements</dc:description>
      <dc:description>availability: direct_download</dc:description>
      <dc:description>general.mime_type: text/csv</dc:description>
      <cscida:Identifier.version>urn:nbn:fi:csc-ida-v2</cscida:Identifier.version>
      <cscida:uploader>uploader@csc.fi</cscida:uploader>
      <dct:modified>2014-01-08</dct:modified>
      <dct:contributor><foaf:Person><foaf:name>Jane Doe</foaf:name></foaf:Person>
        <foaf:Organization><foaf:name>CSC</foaf:name></foaf:Organization></dct:contributor>
      <dct:contributor><foaf:Project about="http://project.fi">
        <foaf:name>Climate project</foaf:name>
        <comment>Academy of Finland rahoituspäätös 1234</comment>
      </foaf:Project></dct:contributor>
      <dct:rightsHolder resource="http://csc.fi"/>
      <dct:publisher><foaf:Person about="person">
        <foaf:name>Maintainer</foaf:name>
        <foaf:mbox resource="mailto:m@csc.fi"/>
      </foaf:Person></dct:publisher>
      <dct:rights><RightsDeclaration RIGHTSCATEGORY="LICENSED">http://license</RightsDeclaration></dct:rights>
    </oai_dc:dc>
  </metadata>
</record>"#;

    const PLAIN_RECORD: &str = r#"<record xmlns="http://www.openarchives.org/OAI/2.0/">
  <header><identifier>oai:helda:7</identifier><datestamp>2015-01-01</datestamp></header>
  <metadata>
    <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
               xmlns:dc="http://purl.org/dc/elements/1.1/">
      <dc:title>Untagged title</dc:title>
      <dc:creator>Smith, A.</dc:creator>
      <dc:contributor>Jones, B.</dc:contributor>
      <dc:identifier>https://helda.helsinki.fi/handle/10138/1</dc:identifier>
      <dc:format>application/pdf</dc:format>
      <dc:date>2013-12-31</dc:date>
      <dc:rights>http://creativecommons.org/licenses/by/4.0/</dc:rights>
    </oai_dc:dc>
  </metadata>
</record>"#;

    fn ida_record(payload: &str) -> String {
        format!(
            r#"<record xmlns="http://www.openarchives.org/OAI/2.0/">
  <header><identifier>oai:ida:5</identifier><datestamp>2015-02-03</datestamp></header>
  <metadata>
    <oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
               xmlns:dc="http://purl.org/dc/elements/1.1/"
               xmlns:cscida="http://etsin.avointiede.fi/cscida/">
      <dc:title>Sensor archive</dc:title>
      <dc:identifier>urn:nbn:fi:csc-ida5</dc:identifier>
      {payload}
    </oai_dc:dc>
  </metadata>
</record>"#
        )
    }

    fn version_pids(record: &UnifiedRecord) -> Vec<&str> {
        record
            .pids
            .iter()
            .filter(|pid| pid.pid_type == PidType::Version)
            .map(|pid| pid.id.as_str())
            .collect()
    }

    #[test]
    fn test_variant_from_harvest_type() {
        assert_eq!(DcVariant::from_harvest_type("IDA"), DcVariant::Ida);
        assert_eq!(DcVariant::from_harvest_type("ida"), DcVariant::Ida);
        assert_eq!(DcVariant::from_harvest_type("helda"), DcVariant::Default);
        assert_eq!(DcVariant::from_harvest_type(""), DcVariant::Default);
    }

    #[test]
    fn test_ida_record() {
        let (reader, _) = reader(DcVariant::Ida);
        let harvested = reader.read_str(IDA_RECORD).unwrap();
        let record = harvested.unified;

        assert_eq!(harvested.envelope.identifier, "oai:ida:1");
        assert_eq!(record.id, "urn:nbn:fi:csc-kata1");
        assert_eq!(record.name, "urn-nbn-fi-csc-kata1");
        assert_eq!(record.title, r#"{"eng":"Climate data","fin":"Ilmastodata"}"#);
        assert_eq!(record.language, "eng,fin");
        assert!(!record.langdis);
        assert_eq!(record.tag_string, "climate,weather");
        assert_eq!(record.version, "2014-01-08");
        assert_eq!(record.record_type, "dataset");

        let pids: Vec<_> = record.pids.iter().map(|p| (p.id.as_str(), p.pid_type)).collect();
        assert_eq!(
            pids,
            vec![
                ("urn:nbn:fi:csc-ida2014010812345", PidType::Primary),
                ("urn:isbn:978", PidType::Relation),
                ("http://example.org/landing", PidType::Relation),
                ("urn:nbn:fi:csc-ida-v2", PidType::Version),
            ]
        );
        assert!(record.pids.iter().all(|p| p.provider == "ida"));

        assert_eq!(record.availability, "direct_download");
        assert_eq!(record.license_id, "notspecified");
        assert_eq!(record.license_url, "http://license");
        assert_eq!(record.mimetype, "text/csv");
        assert_eq!(record.uploader, "uploader@csc.fi");
        // First descendant identifier is not an IDA urn, so no avaa link.
        assert_eq!(record.direct_download_url, "http://example.org/landing");
        assert_eq!(record.smear_url, "http://example.org/landing");
    }

    #[test]
    fn test_ida_notes_and_agents() {
        let (reader, _) = reader(DcVariant::Ida);
        let record = reader.read_str(IDA_RECORD).unwrap().unified;

        let notes = LangMap::from_json(&record.notes).unwrap();
        assert_eq!(
            notes.get("und"),
            Some("Long term measurements\r\n\r\ngeneral.mime_type: text/csv")
        );

        let roles: Vec<_> = record.agent.iter().map(|a| a.role).collect();
        assert_eq!(
            roles,
            vec![AgentRole::Author, AgentRole::Funder, AgentRole::Owner]
        );
        assert_eq!(record.agent[0].name, "Jane Doe");
        assert_eq!(record.agent[0].organisation, "CSC");
        let funder = &record.agent[1];
        assert_eq!(funder.name, "Climate project");
        assert_eq!(funder.id, "Climate project");
        assert_eq!(funder.organisation, "Academy of Finland");
        assert_eq!(funder.fundingid, "1234");
        assert_eq!(funder.url, "http://project.fi");
        assert_eq!(record.agent[2].name, "http://csc.fi");

        assert_eq!(record.contact.len(), 1);
        assert_eq!(record.contact[0].name, "Maintainer");
        assert_eq!(record.contact[0].email, "mailto:m@csc.fi");
        assert_eq!(record.contact[0].url, "");
    }

    #[test]
    fn test_ida_values_from_cscida_elements() {
        let (reader, _) = reader(DcVariant::Ida);
        let record = reader
            .read_str(&ida_record(
                r#"<cscida:availability>access_application_other</cscida:availability>
      <cscida:general.mime_type>application/zip</cscida:general.mime_type>
      <cscida:Identifier.version>urn:v1</cscida:Identifier.version>
      <dc:description>availability: direct_download</dc:description>
      <dc:description>general.mime_type: text/plain</dc:description>
      <dc:description>Identifier.version: urn:v2</dc:description>"#,
            ))
            .unwrap()
            .unified;

        assert_eq!(record.availability, "access_application_other");
        assert_eq!(record.mimetype, "application/zip");
        assert_eq!(version_pids(&record), vec!["urn:v1"]);
        assert_eq!(record.license_id, "notspecified");
        assert_eq!(record.license_url, "");
    }

    #[test]
    fn test_ida_values_from_key_value_descriptions() {
        let (reader, _) = reader(DcVariant::Ida);
        let record = reader
            .read_str(&ida_record(
                r#"<dc:description>availability: direct_download</dc:description>
      <dc:description>general.mime_type : text/plain</dc:description>
      <dc:description>Identifier.version: urn:v2</dc:description>
      <dc:description>Measured every minute</dc:description>"#,
            ))
            .unwrap()
            .unified;

        assert_eq!(record.availability, "direct_download");
        assert_eq!(record.mimetype, "text/plain");
        assert_eq!(version_pids(&record), vec!["urn:v2"]);
        let version = record.pids.iter().find(|pid| pid.id == "urn:v2").unwrap();
        assert_eq!(version.relation.as_deref(), Some("generalRelation"));
        assert_eq!(record.primary_pid().unwrap().id, "urn:nbn:fi:csc-ida5");
    }

    #[test]
    fn test_ida_without_availability_source() {
        let (reader, _) = reader(DcVariant::Ida);
        let record = reader.read_str(&ida_record("")).unwrap().unified;

        assert_eq!(record.availability, "");
        assert_eq!(record.mimetype, "");
        assert!(version_pids(&record).is_empty());
    }

    #[test]
    fn test_default_variant_ignores_cscida_elements() {
        let (reader, _) = reader(DcVariant::Default);
        let record = reader
            .read_str(&ida_record(
                r#"<cscida:availability>access_application_other</cscida:availability>
      <cscida:Identifier.version>urn:v1</cscida:Identifier.version>
      <cscida:uploader>someone@csc.fi</cscida:uploader>"#,
            ))
            .unwrap()
            .unified;

        assert_eq!(record.availability, "contact_owner");
        assert!(version_pids(&record).is_empty());
        assert_eq!(record.uploader, "");
    }

    #[test]
    fn test_plain_record_defaults() {
        let (reader, _) = reader(DcVariant::Default);
        let record = reader.read_str(PLAIN_RECORD).unwrap().unified;

        assert_eq!(record.title, r#"{"und":"Untagged title"}"#);
        assert_eq!(record.availability, "contact_owner");
        assert_eq!(record.license_id, "notspecified");
        assert_eq!(record.license_url, "http://creativecommons.org/licenses/by/4.0/");
        assert_eq!(record.mimetype, "application/pdf");
        assert_eq!(record.version, "2013-12-31");
        assert!(record.langdis);
        assert_eq!(record.direct_download_url, "https://helda.helsinki.fi/handle/10138/1");

        let authors: Vec<_> = record.agents_with_role(AgentRole::Author).map(|a| a.name.as_str()).collect();
        assert_eq!(authors, vec!["Smith, A."]);
        assert_eq!(record.agents_with_role(AgentRole::Contributor).count(), 1);
        let funder = record.agents_with_role(AgentRole::Funder).next().unwrap();
        assert_eq!(funder.name, "");
        assert_eq!(record.agents_with_role(AgentRole::Owner).count(), 1);

        // Helda link becomes a relation pid and the catalog id the primary one.
        assert_eq!(record.pids.len(), 2);
        assert_eq!(record.pids[0].pid_type, PidType::Relation);
        assert_eq!(record.pids[0].provider, "http://helda.helsinki.fi/oai/request");
        let primary = record.primary_pid().unwrap();
        assert_eq!(primary.id, record.id);
        assert_eq!(primary.provider, "http://localhost:5000");
    }

    #[test]
    fn test_every_record_has_a_primary_pid() {
        let (reader, _) = reader(DcVariant::Default);
        for xml in [IDA_RECORD, PLAIN_RECORD, "<record><metadata/></record>"] {
            let document = Element::parse(xml).unwrap();
            let record = reader.read_data(&document).unwrap();
            assert!(record.primary_pid().is_some());
        }
    }

    #[test]
    fn test_existing_record_is_reused() {
        let (reader, catalog) = reader(DcVariant::Ida);
        let first = reader.read_str(IDA_RECORD).unwrap().unified;
        catalog.save_record(&StoredRecord::new(first.clone())).unwrap();

        let second = reader.read_str(IDA_RECORD).unwrap().unified;
        assert_eq!(second.id, first.id);
        assert_eq!(second, first);
        assert_eq!(
            catalog
                .find_record_by_pid("urn:nbn:fi:csc-ida2014010812345", PidType::Primary)
                .unwrap(),
            Some(first.id)
        );
    }

    #[test]
    fn test_exhausted_id_generation_fails_the_read() {
        struct Taken;
        impl CatalogLookup for Taken {
            fn find_record_by_pid(&self, _: &str, _: PidType) -> oaiharvest_core::Result<Option<String>> {
                Ok(None)
            }
            fn record_exists(&self, _: &str) -> oaiharvest_core::Result<bool> {
                Ok(true)
            }
        }
        let ctx = ReaderContext::new(
            SiteConfig::default(),
            Arc::new(Taken),
            Arc::new(Counter(AtomicUsize::new(0))),
        );
        let err = DcReader::new(ctx, DcVariant::Default)
            .read_str(PLAIN_RECORD)
            .unwrap_err();
        assert!(matches!(err, crate::error::ReaderError::IdentifierUnavailable(_)));
    }
}
