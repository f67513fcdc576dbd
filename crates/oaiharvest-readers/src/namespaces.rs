//! Namespace URIs of the vocabularies understood by the readers.

pub const OAI: &str = "http://www.openarchives.org/OAI/2.0/";
pub const OAI_DC: &str = "http://www.openarchives.org/OAI/2.0/oai_dc/";
pub const DC: &str = "http://purl.org/dc/elements/1.1/";
pub const DCT: &str = "http://purl.org/dc/terms/";
pub const CSCIDA: &str = "http://etsin.avointiede.fi/cscida/";
pub const DATACITE: &str = "http://datacite.org/schema/kernel-3";
