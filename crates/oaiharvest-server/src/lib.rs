//! OAI-PMH provider data layer over the local dataset catalog.
//!
//! Produces headers, Dublin-Core metadata and set listings; rendering the
//! protocol XML and resumption tokens is left to the HTTP layer.

pub mod error;
pub mod mapping;
pub mod provider;

pub use error::{ProviderError, Result};
pub use mapping::{DcMetadata, dc_metadata};
pub use provider::{
    Header, Identify, ListQuery, MetadataFormat, OAI_DC_PREFIX, Page, Provider, Record, SetInfo,
};
