//! Namespace-aware element tree built from `quick_xml::NsReader` events.
//!
//! Elements and attributes keep their local name and the namespace URI their
//! prefix resolved to, so lookups never depend on which prefix a provider
//! chose. An element without a namespace has `namespace == None`, which is a
//! namespace of its own and not a wildcard.

use quick_xml::NsReader;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::{Namespace, ResolveResult};

use crate::error::{ReaderError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    pub name: String,
    pub namespace: Option<String>,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Element {
    pub name: String,
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Element>,
    text: String,
}

/// Tag filter: local name and namespace URI must both match.
pub fn matches(element: &Element, local_name: &str, namespace: Option<&str>) -> bool {
    element.name == local_name && element.namespace.as_deref() == namespace
}

impl Element {
    pub fn new(name: impl Into<String>, namespace: Option<&str>) -> Self {
        Self {
            name: name.into(),
            namespace: namespace.map(str::to_string),
            ..Default::default()
        }
    }

    /// Parse a whole document and return its root element.
    pub fn parse(xml: &str) -> Result<Self> {
        parse_document(xml)
    }

    pub fn is(&self, local_name: &str, namespace: &str) -> bool {
        matches(self, local_name, Some(namespace))
    }

    /// Direct text of a leaf element; `None` for empty elements and for
    /// elements that have child elements.
    pub fn text(&self) -> Option<&str> {
        if !self.children.is_empty() || self.text.is_empty() {
            return None;
        }
        Some(&self.text)
    }

    /// Trimmed text, empty if there is none.
    pub fn text_trimmed(&self) -> &str {
        self.text().map(str::trim).unwrap_or_default()
    }

    /// First attribute with this local name, whatever its namespace.
    pub fn attr(&self, local_name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|attr| attr.name == local_name)
            .map(|attr| attr.value.as_str())
    }

    /// Direct children with this local name in any namespace.
    pub fn children_named<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.children.iter().filter(move |child| child.name == local_name)
    }

    /// Direct children matching local name and namespace.
    pub fn children_ns<'a>(
        &'a self,
        local_name: &'a str,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.children
            .iter()
            .filter(move |child| child.is(local_name, namespace))
    }

    /// All elements below this one in document order, excluding `self`.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants {
            stack: self.children.iter().rev().collect(),
        }
    }

    pub fn find_all<'a>(&'a self, local_name: &'a str) -> impl Iterator<Item = &'a Element> {
        self.descendants().filter(move |el| el.name == local_name)
    }

    pub fn find_all_ns<'a>(
        &'a self,
        local_name: &'a str,
        namespace: &'a str,
    ) -> impl Iterator<Item = &'a Element> {
        self.descendants().filter(move |el| el.is(local_name, namespace))
    }

    /// First descendant with this local name in any namespace.
    pub fn find(&self, local_name: &str) -> Option<&Element> {
        self.descendants().find(|el| el.name == local_name)
    }

    pub fn find_ns(&self, local_name: &str, namespace: &str) -> Option<&Element> {
        self.descendants().find(|el| el.is(local_name, namespace))
    }

    /// Best-effort descent: each step is a [`find`](Self::find) from the
    /// previous element. Any missing step yields `None`.
    pub fn navigate(&self, steps: &[&str]) -> Option<&Element> {
        steps
            .iter()
            .try_fold(self, |current, step| current.find(step))
    }
}

/// Pre-order iterator over the descendants of an element.
pub struct Descendants<'a> {
    stack: Vec<&'a Element>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Element;

    fn next(&mut self) -> Option<&'a Element> {
        let element = self.stack.pop()?;
        self.stack.extend(element.children.iter().rev());
        Some(element)
    }
}

fn namespace_of(resolved: ResolveResult) -> Option<String> {
    match resolved {
        ResolveResult::Bound(Namespace(uri)) => Some(String::from_utf8_lossy(uri).into_owned()),
        ResolveResult::Unbound | ResolveResult::Unknown(_) => None,
    }
}

fn open_element(reader: &NsReader<&[u8]>, start: &BytesStart) -> Result<Element> {
    let (resolved, local) = reader.resolve_element(start.name());
    let mut element = Element {
        name: String::from_utf8_lossy(local.as_ref()).into_owned(),
        namespace: namespace_of(resolved),
        ..Default::default()
    };

    for attr in start.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_namespace_binding().is_some() {
            continue;
        }
        let (resolved, local) = reader.resolve_attribute(attr.key);
        element.attributes.push(Attribute {
            name: String::from_utf8_lossy(local.as_ref()).into_owned(),
            namespace: namespace_of(resolved),
            value: attr.unescape_value()?.into_owned(),
        });
    }

    Ok(element)
}

fn close_element(element: Element, stack: &mut Vec<Element>, root: &mut Option<Element>) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(element),
        None => {
            if root.is_none() {
                *root = Some(element);
            }
        }
    }
}

pub fn parse_document(xml: &str) -> Result<Element> {
    let mut reader = NsReader::from_str(xml);
    let mut stack: Vec<Element> = Vec::new();
    let mut root: Option<Element> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => stack.push(open_element(&reader, &start)?),
            Event::Empty(start) => {
                let element = open_element(&reader, &start)?;
                close_element(element, &mut stack, &mut root);
            }
            Event::End(_) => {
                if let Some(element) = stack.pop() {
                    close_element(element, &mut stack, &mut root);
                }
            }
            Event::Text(text) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&text.unescape()?);
                }
            }
            Event::CData(data) => {
                if let Some(current) = stack.last_mut() {
                    current.text.push_str(&String::from_utf8_lossy(&data.into_inner()));
                }
            }
            Event::Eof => break,
            _ => {}
        }
    }

    if let Some(open) = stack.last() {
        return Err(ReaderError::Parse(format!("unclosed element <{}>", open.name)));
    }
    root.ok_or_else(|| ReaderError::Parse("document has no root element".to_string()))
}
