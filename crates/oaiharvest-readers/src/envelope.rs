//! OAI-PMH record envelope, common to every metadata payload.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{ReaderError, Result};
use crate::namespaces::OAI;
use crate::xml::Element;

/// Header of one harvested `<record>` plus a flat view of its payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope {
    pub identifier: String,
    pub datestamp: String,
    pub set_specs: Vec<String>,
    pub deleted: bool,
    /// Texts of every leaf element of the `<metadata>` payload, keyed by
    /// local name, in document order.
    pub fields: BTreeMap<String, Vec<String>>,
}

impl Envelope {
    /// Extract the envelope from a `<record>` element or any document
    /// containing one.
    pub fn read(root: &Element) -> Result<Self> {
        let record = if root.is("record", OAI) {
            root
        } else {
            root.find_ns("record", OAI)
                .ok_or_else(|| ReaderError::MalformedEnvelope("no <record> element".to_string()))?
        };

        let header = record
            .children_ns("header", OAI)
            .next()
            .ok_or_else(|| ReaderError::MalformedEnvelope("record has no <header>".to_string()))?;

        let identifier = mandatory_text(header, "identifier")?;
        let datestamp = mandatory_text(header, "datestamp")?;

        let set_specs = header
            .children_ns("setSpec", OAI)
            .map(|spec| spec.text_trimmed().to_string())
            .filter(|spec| !spec.is_empty())
            .collect();

        let deleted = header.attr("status") == Some("deleted");

        let mut fields: BTreeMap<String, Vec<String>> = BTreeMap::new();
        if let Some(metadata) = record.children_ns("metadata", OAI).next() {
            for leaf in metadata.descendants() {
                if let Some(text) = leaf.text() {
                    let text = text.trim();
                    if !text.is_empty() {
                        fields.entry(leaf.name.clone()).or_default().push(text.to_string());
                    }
                }
            }
        }

        Ok(Self {
            identifier,
            datestamp,
            set_specs,
            deleted,
            fields,
        })
    }

    pub fn parse(xml: &str) -> Result<Self> {
        Self::read(&Element::parse(xml)?)
    }

    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields.get(name)?.first().map(String::as_str)
    }
}

fn mandatory_text(header: &Element, name: &str) -> Result<String> {
    let text = header
        .children_ns(name, OAI)
        .next()
        .map(Element::text_trimmed)
        .unwrap_or_default();
    if text.is_empty() {
        return Err(ReaderError::MalformedEnvelope(format!("header has no <{name}>")));
    }
    Ok(text.to_string())
}
