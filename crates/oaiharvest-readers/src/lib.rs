//! Readers normalizing harvested OAI-PMH metadata into [`UnifiedRecord`]s.
//!
//! [`UnifiedRecord`]: oaiharvest_core::UnifiedRecord

pub mod cmdi;
pub mod context;
pub mod datacite;
pub mod dc;
pub mod envelope;
pub mod error;
pub mod extract;
pub mod language;
pub mod namespaces;
pub mod reader;
pub mod schema;
pub mod xml;

pub use cmdi::{CmdiParser, CmdiReader, UnconfiguredCmdiParser};
pub use context::ReaderContext;
pub use datacite::DataCiteReader;
pub use dc::{DcReader, DcVariant};
pub use envelope::Envelope;
pub use error::{ReaderError, Result};
pub use language::convert_language;
pub use reader::{HarvestedRecord, MetadataReader};
pub use schema::{HarvestReader, SchemaKind, resolve_deleted};
pub use xml::{Element, matches};
