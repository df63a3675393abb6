//! FHIR wire support for invoice document bundles.
//!
//! This crate provides **wire models** for the records that make up an invoice document:
//! - a root `Composition` and the eight record kinds it ties together
//! - the `Bundle` envelope and its `urn:uuid:` entry locators
//! - JSON render/parse helpers with field-path diagnostics
//!
//! This crate deliberately knows nothing about how records are built. Construction rules
//! (which fields are mandatory, which sections are optional, how totals are reconciled) live in
//! `invrec-core`; here we only guarantee that what is built serialises to the expected shape.

pub mod binary;
pub mod bundle;
pub mod composition;
pub mod datatypes;
pub mod document_reference;
pub mod encounter;
pub mod invoice;
pub mod organization;
pub mod patient;
pub mod practitioner;
pub mod resource;

pub use binary::Binary;
pub use bundle::{Bundle, BundleEntry, BundleType};
pub use composition::{AttestationMode, Composition, CompositionAttester, CompositionStatus, Section};
pub use datatypes::{
    Address, Attachment, CodeableConcept, Coding, ContactPoint, ContactPointSystem,
    DomainResource, HumanName, Identifier, Meta, Money, Narrative, Period, Reference,
};
pub use document_reference::{DocumentContent, DocumentReference, DocumentReferenceStatus};
pub use encounter::{Encounter, EncounterStatus};
pub use invoice::{
    Invoice, InvoiceLineItem, InvoiceParticipant, InvoiceStatus, PriceComponent,
    PriceComponentType,
};
pub use organization::Organization;
pub use patient::{AdministrativeGender, Patient};
pub use practitioner::Practitioner;
pub use resource::Resource;

pub use invrec_uuid::{ResourceId, LOCATOR_PREFIX};

/// Errors returned by the `fhir` boundary crate.
#[derive(Debug, thiserror::Error)]
pub enum FhirError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("invalid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),

    #[error("translation error: {0}")]
    Translation(String),
}

/// Type alias for Results that can fail with a [`FhirError`].
pub type FhirResult<T> = Result<T, FhirError>;
