//! Tagged union over every record kind an invoice bundle can hold.

use crate::{
    Binary, Composition, DocumentReference, Encounter, Invoice, Organization, Patient,
    Practitioner,
};
use serde::{Deserialize, Serialize};

/// A record inside a bundle entry, tagged on the wire by `resourceType`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "resourceType")]
pub enum Resource {
    Composition(Composition),
    Patient(Patient),
    Practitioner(Practitioner),
    Organization(Organization),
    Encounter(Encounter),
    Invoice(Invoice),
    DocumentReference(DocumentReference),
    Binary(Binary),
}

impl Resource {
    /// The record's logical identifier.
    pub fn id(&self) -> &str {
        match self {
            Resource::Composition(r) => &r.base.id,
            Resource::Patient(r) => &r.base.id,
            Resource::Practitioner(r) => &r.base.id,
            Resource::Organization(r) => &r.base.id,
            Resource::Encounter(r) => &r.base.id,
            Resource::Invoice(r) => &r.base.id,
            Resource::DocumentReference(r) => &r.base.id,
            Resource::Binary(r) => &r.id,
        }
    }

    /// The FHIR `resourceType` this record serialises with.
    pub fn resource_type(&self) -> &'static str {
        match self {
            Resource::Composition(_) => "Composition",
            Resource::Patient(_) => "Patient",
            Resource::Practitioner(_) => "Practitioner",
            Resource::Organization(_) => "Organization",
            Resource::Encounter(_) => "Encounter",
            Resource::Invoice(_) => "Invoice",
            Resource::DocumentReference(_) => "DocumentReference",
            Resource::Binary(_) => "Binary",
        }
    }
}
