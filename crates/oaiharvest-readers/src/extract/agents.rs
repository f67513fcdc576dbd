use oaiharvest_core::Contact;

use crate::namespaces::{DC, DCT};
use crate::xml::Element;

/// Separator between funder and funding decision in an IDA project comment.
const FUNDING_SEPARATOR: &str = " rahoituspäätös ";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrgAuthor {
    pub name: String,
    pub organisation: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Project {
    pub funder: String,
    pub funding: String,
    pub name: String,
    pub homepage: String,
}

fn name_of(element: &Element) -> String {
    element
        .find("name")
        .map(Element::text_trimmed)
        .unwrap_or_default()
        .to_string()
}

/// Authors with organisations.
///
/// Structured `dct:contributor` Person/Organization entries are used when
/// the record has any; otherwise every plain `dc:creator` becomes an author.
pub fn org_authors(dc: &Element) -> Vec<OrgAuthor> {
    let structured: Vec<OrgAuthor> = dc
        .children_ns("contributor", DCT)
        .filter_map(|contributor| {
            let person = contributor.find("Person");
            let organisation = contributor.find("Organization");
            if person.is_none() && organisation.is_none() {
                return None;
            }
            Some(OrgAuthor {
                name: person.map(name_of).unwrap_or_default(),
                organisation: organisation.map(name_of).unwrap_or_default(),
            })
        })
        .collect();

    if !structured.is_empty() {
        return structured;
    }

    dc.children_ns("creator", DC)
        .map(|creator| OrgAuthor {
            name: creator.text_trimmed().to_string(),
            organisation: String::new(),
        })
        .collect()
}

pub fn contributors(dc: &Element) -> Vec<OrgAuthor> {
    dc.children_ns("contributor", DC)
        .map(|contributor| OrgAuthor {
            name: contributor.text_trimmed().to_string(),
            organisation: String::new(),
        })
        .collect()
}

/// First IDA project found under a `dct:contributor`.
pub fn project(dc: &Element) -> Option<Project> {
    let project = dc
        .children_ns("contributor", DCT)
        .find_map(|contributor| contributor.find("Project"))?;

    let comment = project
        .find("comment")
        .map(Element::text_trimmed)
        .unwrap_or_default();
    let (funder, funding) = comment.split_once(FUNDING_SEPARATOR).unwrap_or((comment, ""));

    Some(Project {
        funder: funder.to_string(),
        funding: funding.to_string(),
        name: name_of(project),
        homepage: project.attr("about").unwrap_or_default().to_string(),
    })
}

/// First non-empty `rightsHolder@resource`.
pub fn rights_holder(dc: &Element) -> Option<String> {
    dc.children_named("rightsHolder")
        .filter_map(|holder| holder.attr("resource"))
        .find(|resource| !resource.is_empty())
        .map(str::to_string)
}

/// Contacts from every entity under each `dct:publisher`.
pub fn maintainers(dc: &Element) -> Vec<Contact> {
    dc.children_ns("publisher", DCT)
        .flat_map(|publisher| publisher.children.iter())
        .map(|entity| Contact {
            name: name_of(entity),
            email: resource_of(entity, "mbox"),
            url: entity.attr("about").unwrap_or_default().to_string(),
            phone: resource_of(entity, "phone"),
        })
        .collect()
}

fn resource_of(entity: &Element, child: &str) -> String {
    entity
        .find(child)
        .and_then(|element| element.attr("resource"))
        .unwrap_or_default()
        .to_string()
}
