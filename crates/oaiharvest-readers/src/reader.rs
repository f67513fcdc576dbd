use oaiharvest_core::UnifiedRecord;
use serde::{Deserialize, Serialize};

use crate::envelope::Envelope;
use crate::error::Result;
use crate::xml::Element;

/// One harvested record: protocol envelope plus normalized payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestedRecord {
    pub envelope: Envelope,
    pub unified: UnifiedRecord,
}

/// A reader for one metadata schema.
///
/// Readers keep no state between calls; reading the same document twice
/// against an unchanged catalog yields the same record, apart from ids
/// generated for records the catalog does not know.
pub trait MetadataReader: Send + Sync {
    /// Normalize the payload of `document` without touching the envelope.
    fn read_data(&self, document: &Element) -> Result<UnifiedRecord>;

    /// Envelope and normalized payload. Fails on a malformed envelope
    /// before the payload is looked at.
    fn read(&self, document: &Element) -> Result<HarvestedRecord> {
        let envelope = Envelope::read(document)?;
        let unified = self.read_data(document)?;
        Ok(HarvestedRecord { envelope, unified })
    }

    fn read_str(&self, xml: &str) -> Result<HarvestedRecord> {
        self.read(&Element::parse(xml)?)
    }
}
