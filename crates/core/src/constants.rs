//! Constants used throughout the engine.
//!
//! Code systems, identifier systems and profile URLs for the invoice document. Anything a
//! deployment may need to vary lives on [`crate::EngineConfig`] instead.

/// Default language tag declared on every record and narrative.
pub const DEFAULT_LANGUAGE: &str = "en-IN";

/// Default ISO 4217 currency for money amounts.
pub const DEFAULT_CURRENCY: &str = "INR";

/// Title given to the composition when the form leaves it blank.
pub const DEFAULT_DOCUMENT_TITLE: &str = "Invoice Record";

/// Label used for a line item with no description.
pub const FALLBACK_LINE_LABEL: &str = "Billable item";

/// Base URL of the record profiles claimed in `meta.profile`.
pub const PROFILE_BASE: &str = "https://nrces.in/ndhm/fhir/r4/StructureDefinition/";

/// Bundle identifier system for `urn:uuid:` values.
pub const URN_IDENTIFIER_SYSTEM: &str = "urn:ietf:rfc:3986";

pub const SNOMED_SYSTEM: &str = "http://snomed.info/sct";
pub const ACT_CODE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v3-ActCode";
pub const IDENTIFIER_TYPE_SYSTEM: &str = "http://terminology.hl7.org/CodeSystem/v2-0203";
pub const BILLING_CODE_SYSTEM: &str =
    "https://nrces.in/ndhm/fhir/r4/CodeSystem/ndhm-billing-codes";
pub const PARTICIPANT_ROLE_SYSTEM: &str =
    "http://terminology.hl7.org/CodeSystem/v3-ParticipationType";

/// Default identifier systems (overridable through configuration).
pub const HEALTH_ADDRESS_SYSTEM: &str = "https://healthid.abdm.gov.in";
pub const MEDICAL_RECORD_SYSTEM: &str = "https://hospital.example.org/mrn";
pub const PRACTITIONER_LICENSE_SYSTEM: &str = "https://doctor.ndhm.gov.in";
pub const FACILITY_SYSTEM: &str = "https://facility.ndhm.gov.in";
pub const INVOICE_NUMBER_SYSTEM: &str = "https://hospital.example.org/invoice";

/// Default `v3-ActCode` encounter class.
pub const DEFAULT_ENCOUNTER_CLASS: &str = "AMB";

/// SNOMED CT "Record artifact", used as the attachment reference type.
pub const RECORD_ARTIFACT_CODE: &str = "419891008";
