//! # Invoice Record Core
//!
//! Assembly engine for invoice document bundles.
//!
//! This crate turns a selected patient, the configured practitioner, organisation and encounter
//! details, invoice lines and attachments into one internally cross-referenced document
//! bundle:
//! - input validation with every issue reported at once
//! - date, timestamp and health-address normalisation
//! - one stateless builder per record kind
//! - totals computed from lines and reconciled against user overrides
//! - reference graph assembly with content-addressed (`urn:uuid:`) locators
//!
//! **No transport concerns**: HTTP and CLI surfaces live in the binaries. The only network
//! code here is the optional [`HttpSubmissionSink`], which reports outcomes and never retries.

pub mod assembler;
pub mod builders;
pub mod config;
pub mod constants;
pub mod contact;
mod engine;
mod error;
pub mod input;
pub mod submission;
pub mod temporal;
pub mod totals;
pub mod validation;

pub use config::{
    flag_from_env_value, practitioner_from_env_values, EngineConfig, FeatureFlags,
    IdentifierSystems,
};
pub use contact::{normalize_addresses, AddressEntry, NormalizedAddress, RawAddressEntry};
pub use engine::{AssembledBundle, InvoiceBundleEngine};
pub use error::{EngineError, EngineResult};
pub use input::{
    AttesterInput, BuildInput, EncounterInput, HealthAccount, InvoiceInput, InvoiceLine,
    OrganizationInput, PatientRecord, PractitionerRecord, TotalsOverride,
};
pub use submission::{
    HttpSubmissionSink, Submission, SubmissionConfig, SubmissionOutcome, SubmissionSink,
};
pub use temporal::{normalize_date, to_offset_timestamp};
pub use totals::{compute_totals, reconcile, Totals};
pub use validation::{ValidationErrors, ValidationIssue};

pub use fhir;
pub use invrec_files::{Attachment, AttachmentSource};
