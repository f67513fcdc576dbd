use std::fmt;

use oaiharvest_core::availability::{ACCESS_APPLICATION_OTHER, CONTACT_OWNER, DIRECT_DOWNLOAD};
use tracing::info;

use crate::namespaces::{DC, DCT};
use crate::xml::Element;

/// `(availability, license_id, license_URL, access_application_URL)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Rights {
    pub availability: String,
    pub license_id: String,
    pub license_url: String,
    pub access_application_url: String,
}

/// Closed vocabulary of the IDA `RIGHTSCATEGORY` attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RightsCategory {
    Copyrighted,
    Licensed,
    Contractual,
    PublicDomain,
    Other,
}

impl RightsCategory {
    pub const ALL: [RightsCategory; 5] = [
        Self::Copyrighted,
        Self::Licensed,
        Self::Contractual,
        Self::PublicDomain,
        Self::Other,
    ];

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "COPYRIGHTED" => Some(Self::Copyrighted),
            "LICENSED" => Some(Self::Licensed),
            "CONTRACTUAL" => Some(Self::Contractual),
            "PUBLIC DOMAIN" => Some(Self::PublicDomain),
            "OTHER" => Some(Self::Other),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Copyrighted => "COPYRIGHTED",
            Self::Licensed => "LICENSED",
            Self::Contractual => "CONTRACTUAL",
            Self::PublicDomain => "PUBLIC DOMAIN",
            Self::Other => "OTHER",
        }
    }

    /// Rights implied by this category; `declaration` is the text of the
    /// rights declaration.
    pub fn classify(&self, declaration: &str) -> Rights {
        let (availability, license_id, license_url, access_application_url) = match self {
            Self::Copyrighted => (CONTACT_OWNER, "notspecified", "", ""),
            Self::Licensed => (DIRECT_DOWNLOAD, "notspecified", declaration, ""),
            Self::Contractual => (ACCESS_APPLICATION_OTHER, "notspecified", "", declaration),
            Self::PublicDomain => (DIRECT_DOWNLOAD, "other-pd", "", ""),
            Self::Other => (DIRECT_DOWNLOAD, "other-open", declaration, ""),
        };
        Rights {
            availability: availability.to_string(),
            license_id: license_id.to_string(),
            license_url: license_url.to_string(),
            access_application_url: access_application_url.to_string(),
        }
    }
}

impl fmt::Display for RightsCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// IDA `dct:rights/RightsDeclaration`. `None` when absent or when the
/// category is not one of [`RightsCategory`].
pub fn ida_rights(dc: &Element) -> Option<Rights> {
    let Some(declaration) = dc
        .find_ns("rights", DCT)
        .and_then(|rights| rights.find("RightsDeclaration"))
    else {
        info!("IDA rights not detected, probably not harvesting IDA");
        return None;
    };

    let category = RightsCategory::parse(declaration.attr("RIGHTSCATEGORY")?)?;
    Some(category.classify(declaration.text_trimmed()))
}

/// Plain `dc:rights` text as license URL.
pub fn dc_rights(dc: &Element) -> Option<Rights> {
    let Some(rights) = dc.find_ns("rights", DC) else {
        info!("OAI-DC rights not detected");
        return None;
    };
    Some(Rights {
        license_url: rights.text_trimmed().to_string(),
        ..Default::default()
    })
}

/// IDA rights, then `dc:rights`, then all empty.
pub fn read_rights(dc: &Element) -> Rights {
    ida_rights(dc).or_else(|| dc_rights(dc)).unwrap_or_default()
}
