use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use tracing::info_span;
use tracing_subscriber::EnvFilter;

use oaiharvest_core::{Catalog, Group, HarvestConfig, RecordState, StoredRecord};
use oaiharvest_readers::{
    Element, Envelope, HarvestReader, MetadataReader, ReaderContext, SchemaKind, resolve_deleted,
};
use oaiharvest_server::{ListQuery, OAI_DC_PREFIX, Provider, ProviderError};

// ─── CLI Definition ─────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name = "oaiharvest",
    about = "Normalize harvested OAI-PMH metadata and serve the local catalog",
    version,
    long_about = None
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output in JSON format.
    /// Also enabled by setting OAIHARVEST_JSON=1.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Read one harvested record and print the normalized result.
    Read {
        file: String,
        /// OAI-PMH metadata prefix of the record.
        #[arg(long, default_value = OAI_DC_PREFIX)]
        prefix: String,
        /// Harvest source type, e.g. `ida`.
        #[arg(long, default_value = "")]
        harvest_type: String,
    },

    /// Read records and store them in the catalog.
    Import {
        #[arg(required = true)]
        files: Vec<String>,
        #[arg(long, default_value = OAI_DC_PREFIX)]
        prefix: String,
        #[arg(long, default_value = "")]
        harvest_type: String,
        /// Group (OAI-PMH set) owning the imported records; created if missing.
        #[arg(long)]
        group: Option<String>,
    },

    /// Query the OAI-PMH provider over the catalog.
    Provider {
        #[command(subcommand)]
        action: ProviderAction,
    },

    /// Config management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ProviderAction {
    /// Repository description.
    Identify,
    /// Available metadata formats.
    Formats {
        #[arg(long)]
        id: Option<String>,
    },
    /// Sets (catalog groups).
    Sets {
        #[arg(long)]
        cursor: Option<usize>,
    },
    /// A single record.
    Get {
        id: String,
        #[arg(long, default_value = OAI_DC_PREFIX)]
        prefix: String,
    },
    /// Records, optionally restricted to a set and a date window.
    Records {
        #[arg(long)]
        set: Option<String>,
        /// Inclusive lower bound, `YYYY-MM-DD` or RFC 3339.
        #[arg(long)]
        from: Option<String>,
        /// Inclusive upper bound, `YYYY-MM-DD` or RFC 3339.
        #[arg(long)]
        until: Option<String>,
        #[arg(long)]
        cursor: Option<usize>,
        /// Print headers only.
        #[arg(long)]
        identifiers: bool,
        #[arg(long, default_value = OAI_DC_PREFIX)]
        prefix: String,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Show the effective configuration.
    Show,
    /// Print the config file path.
    Path,
    /// Write a default config file.
    Init {
        #[arg(long)]
        force: bool,
    },
}

// ─── Main ────────────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let start = Instant::now();
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("oaiharvest=info,warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let json_output = cli.json || std::env::var("OAIHARVEST_JSON").as_deref() == Ok("1");
    let config = HarvestConfig::load()?;

    match cli.command {
        Commands::Read { file, prefix, harvest_type } => {
            let catalog = open_catalog(&config)?;
            let reader = build_reader(&config, catalog, &prefix, &harvest_type, &file);
            let document = parse_file(&file)?;
            let harvested = reader.read(&document)?;
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": harvested,
                    "meta": { "duration_ms": dur, "schema": reader.kind().to_string() }
                }))?;
            } else {
                println!("{}", serde_json::to_string_pretty(&harvested)?);
            }
        }

        Commands::Import { files, prefix, harvest_type, group } => {
            let catalog = open_catalog(&config)?;
            let owner = match group {
                Some(name) => Some(ensure_group(&catalog, &name)?),
                None => None,
            };

            let mut results = Vec::new();
            for file in &files {
                let reader = build_reader(&config, catalog.clone(), &prefix, &harvest_type, file);
                let (outcome, id) = import_file(&catalog, &reader, file, owner.as_deref())?;
                if !json_output {
                    println!("{outcome:<8} {id}  {file}");
                }
                results.push(serde_json::json!({ "file": file, "result": outcome, "id": id }));
            }

            if json_output {
                let dur = start.elapsed().as_millis();
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": { "items": results, "total": results.len() },
                    "meta": { "duration_ms": dur }
                }))?;
            }
        }

        Commands::Provider { action } => {
            let catalog = open_catalog(&config)?;
            let provider = Provider::new(catalog, &config);
            let data = match provider_action(&provider, action) {
                Ok(data) => data,
                Err(err) => return report_provider_error(err, json_output),
            };
            let dur = start.elapsed().as_millis();

            if json_output {
                print_json(&serde_json::json!({
                    "status": "ok",
                    "data": data,
                    "meta": { "duration_ms": dur }
                }))?;
            } else {
                println!("{}", serde_json::to_string_pretty(&data)?);
            }
        }

        Commands::Config { action } => {
            let dur = start.elapsed().as_millis();
            match action {
                ConfigAction::Show => {
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":config,"meta":{"duration_ms":dur}}))?;
                    } else {
                        print!("{}", toml::to_string_pretty(&config)?);
                    }
                }
                ConfigAction::Path => {
                    let path = HarvestConfig::config_path();
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("{}", path.display());
                    }
                }
                ConfigAction::Init { force } => {
                    let path = HarvestConfig::config_path();
                    if path.exists() && !force {
                        eprintln!("Config already exists: {} (use --force to overwrite)", path.display());
                        std::process::exit(1);
                    }
                    HarvestConfig::default().save_to(&path)?;
                    if json_output {
                        print_json(&serde_json::json!({"status":"ok","data":{"path":path},"meta":{"duration_ms":dur}}))?;
                    } else {
                        println!("Wrote {}", path.display());
                    }
                }
            }
        }
    }

    Ok(())
}

// ─── Commands ────────────────────────────────────────────────────────────────

fn build_reader(
    config: &HarvestConfig,
    catalog: Arc<Catalog>,
    prefix: &str,
    harvest_type: &str,
    source: &str,
) -> HarvestReader {
    let kind = SchemaKind::from_metadata_prefix(prefix, harvest_type);
    let ctx = ReaderContext::with_prefix(config.site.clone(), catalog, &config.identifiers.pid_prefix)
        .with_span(info_span!("harvest", source = %source, schema = %kind));
    HarvestReader::new(kind, ctx)
}

/// `("created" | "updated" | "deleted" | "skipped", id)`.
fn import_file(
    catalog: &Catalog,
    reader: &HarvestReader,
    file: &str,
    owner: Option<&str>,
) -> Result<(&'static str, String)> {
    let document = parse_file(file)?;
    let envelope = Envelope::read(&document)?;

    if envelope.deleted {
        return match resolve_deleted(&envelope, catalog)? {
            Some(id) => {
                catalog.delete_record(&id)?;
                Ok(("deleted", id))
            }
            None => Ok(("skipped", envelope.identifier)),
        };
    }

    let record = reader.read_data(&document)?;
    let existing = catalog
        .find_record(&record.id)?
        .filter(|stored| stored.state == RecordState::Active);

    let mut stored = StoredRecord::new(record);
    stored.owner_org = owner.map(str::to_string);
    let outcome = match existing {
        Some(previous) => {
            stored.metadata_created = previous.metadata_created;
            if stored.owner_org.is_none() {
                stored.owner_org = previous.owner_org;
            }
            "updated"
        }
        None => "created",
    };
    catalog.save_record(&stored)?;
    Ok((outcome, stored.record.id))
}

fn ensure_group(catalog: &Catalog, name: &str) -> Result<String> {
    if let Some(group) = catalog.find_group_by_name(name)? {
        return Ok(group.id);
    }
    let group = Group {
        id: name.to_string(),
        name: name.to_string(),
        title: name.to_string(),
        description: String::new(),
    };
    catalog.save_group(&group)?;
    Ok(group.id)
}

fn provider_action(
    provider: &Provider,
    action: ProviderAction,
) -> std::result::Result<serde_json::Value, ProviderError> {
    let value = match action {
        ProviderAction::Identify => to_value(provider.identify()?),
        ProviderAction::Formats { id } => to_value(provider.list_metadata_formats(id.as_deref())?),
        ProviderAction::Sets { cursor } => to_value(provider.list_sets(cursor)?),
        ProviderAction::Get { id, prefix } => to_value(provider.get_record(&prefix, &id)?),
        ProviderAction::Records { set, from, until, cursor, identifiers, prefix } => {
            let query = ListQuery {
                set,
                from: from.as_deref().map(|v| parse_datestamp(v, false)).transpose()?,
                until: until.as_deref().map(|v| parse_datestamp(v, true)).transpose()?,
                cursor,
            };
            if identifiers {
                to_value(provider.list_identifiers(&prefix, &query)?)
            } else {
                to_value(provider.list_records(&prefix, &query)?)
            }
        }
    };
    Ok(value)
}

fn report_provider_error(err: ProviderError, json_output: bool) -> Result<()> {
    let Some(code) = err.code() else {
        return Err(err.into());
    };
    if json_output {
        print_json(&serde_json::json!({
            "status": "error",
            "error": { "code": code, "message": err.to_string() }
        }))?;
    } else {
        eprintln!("{code}: {err}");
    }
    std::process::exit(1);
}

// ─── Helpers ─────────────────────────────────────────────────────────────────

/// `YYYY-MM-DD` (start or end of day) or a full RFC 3339 timestamp.
fn parse_datestamp(value: &str, end_of_day: bool) -> std::result::Result<DateTime<Utc>, ProviderError> {
    if let Ok(at) = DateTime::parse_from_rfc3339(value) {
        return Ok(at.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .map_err(|_| ProviderError::BadArgument(format!("invalid datestamp: {value}")))?;
    let time = if end_of_day {
        date.and_hms_micro_opt(23, 59, 59, 999_999)
    } else {
        date.and_hms_opt(0, 0, 0)
    };
    time.map(|t| t.and_utc())
        .ok_or_else(|| ProviderError::BadArgument(format!("invalid datestamp: {value}")))
}

fn to_value<T: serde::Serialize>(value: T) -> serde_json::Value {
    serde_json::to_value(value).unwrap_or(serde_json::Value::Null)
}

fn parse_file(file: &str) -> Result<Element> {
    let xml = std::fs::read_to_string(Path::new(file))
        .with_context(|| format!("failed to read {file}"))?;
    Ok(Element::parse(&xml)?)
}

fn print_json(val: &serde_json::Value) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(val)?);
    Ok(())
}

fn open_catalog(config: &HarvestConfig) -> Result<Arc<Catalog>> {
    let db_path = config.database_path();
    let catalog = Catalog::open(&db_path)
        .with_context(|| format!("failed to open catalog at {}", db_path.display()))?;
    Ok(Arc::new(catalog))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use oaiharvest_core::SiteConfig;

    use super::*;

    const RECORD: &str = r#"<record xmlns="http://www.openarchives.org/OAI/2.0/">
      <header><identifier>urn:nbn:fi:csc-ida42</identifier><datestamp>2020-01-01</datestamp></header>
      <metadata><oai_dc:dc xmlns:oai_dc="http://www.openarchives.org/OAI/2.0/oai_dc/"
          xmlns:dc="http://purl.org/dc/elements/1.1/">
        <dc:title>Measurements</dc:title>
        <dc:identifier>urn:nbn:fi:csc-ida42</dc:identifier>
      </oai_dc:dc></metadata></record>"#;

    const DELETED: &str = r#"<record xmlns="http://www.openarchives.org/OAI/2.0/">
      <header status="deleted"><identifier>urn:nbn:fi:csc-ida42</identifier>
      <datestamp>2020-02-01</datestamp></header></record>"#;

    fn write_xml(dir: &tempfile::TempDir, name: &str, xml: &str) -> String {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(xml.as_bytes()).unwrap();
        path.to_string_lossy().into_owned()
    }

    fn reader(catalog: Arc<Catalog>) -> HarvestReader {
        let ctx = ReaderContext::with_prefix(SiteConfig::default(), catalog, "urn:nbn:fi:csc-kata");
        HarvestReader::new(SchemaKind::from_metadata_prefix("oai_dc", "ida"), ctx)
    }

    #[test]
    fn test_import_create_update_delete() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::open_in_memory().unwrap());
        let reader = reader(catalog.clone());
        let record = write_xml(&dir, "record.xml", RECORD);

        let (outcome, id) = import_file(&catalog, &reader, &record, Some("ida")).unwrap();
        assert_eq!(outcome, "created");
        let created = catalog.get_record(&id).unwrap();
        assert_eq!(created.owner_org.as_deref(), Some("ida"));

        let (outcome, again) = import_file(&catalog, &reader, &record, None).unwrap();
        assert_eq!(outcome, "updated");
        assert_eq!(again, id);
        let updated = catalog.get_record(&id).unwrap();
        assert_eq!(updated.metadata_created, created.metadata_created);
        assert_eq!(updated.owner_org.as_deref(), Some("ida"));

        let deleted = write_xml(&dir, "deleted.xml", DELETED);
        let (outcome, gone) = import_file(&catalog, &reader, &deleted, None).unwrap();
        assert_eq!(outcome, "deleted");
        assert_eq!(gone, id);
        assert_eq!(catalog.get_record(&id).unwrap().state, RecordState::Deleted);
    }

    #[test]
    fn test_deleted_unknown_record_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let catalog = Arc::new(Catalog::open_in_memory().unwrap());
        let deleted = write_xml(&dir, "deleted.xml", DELETED);
        let (outcome, id) = import_file(&catalog, &reader(catalog.clone()), &deleted, None).unwrap();
        assert_eq!(outcome, "skipped");
        assert_eq!(id, "urn:nbn:fi:csc-ida42");
    }

    #[test]
    fn test_ensure_group_is_idempotent() {
        let catalog = Catalog::open_in_memory().unwrap();
        assert_eq!(ensure_group(&catalog, "ida").unwrap(), "ida");
        assert_eq!(ensure_group(&catalog, "ida").unwrap(), "ida");
        assert_eq!(catalog.list_groups().unwrap().len(), 1);
    }

    #[test]
    fn test_parse_datestamp() {
        let from = parse_datestamp("2014-03-04", false).unwrap();
        assert_eq!(from.to_rfc3339(), "2014-03-04T00:00:00+00:00");
        let until = parse_datestamp("2014-03-04", true).unwrap();
        assert!(until > from);
        assert_eq!(until.format("%H:%M:%S").to_string(), "23:59:59");
        let exact = parse_datestamp("2014-03-04T10:00:00Z", false).unwrap();
        assert_eq!(exact.format("%H").to_string(), "10");
        assert!(matches!(
            parse_datestamp("yesterday", false),
            Err(ProviderError::BadArgument(_))
        ));
    }
}
