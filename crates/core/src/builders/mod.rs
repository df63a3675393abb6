//! Record builders.
//!
//! One stateless constructor per record kind. Each takes already-validated input plus the
//! references it needs to other records, and returns a [`Built`] record carrying its
//! identifier. Builders never look each other up; the assembler wires them together.

mod attachment;
mod author;
mod encounter;
mod invoice;
mod organization;
mod subject;

pub use attachment::{build_document_reference, build_payload};
pub use author::build_author;
pub use encounter::build_encounter;
pub use invoice::build_invoice;
pub use organization::build_organization;
pub use subject::build_subject;

use crate::config::EngineConfig;
use crate::constants::PROFILE_BASE;
use fhir::{DomainResource, Reference, ResourceId};

/// A built record and the identifier it was built with.
#[derive(Clone, Debug, PartialEq)]
pub struct Built<T> {
    pub id: ResourceId,
    pub record: T,
}

impl<T> Built<T> {
    pub fn new(id: ResourceId, record: T) -> Self {
        Self { id, record }
    }

    /// Content-addressed reference to this record.
    pub fn reference(&self) -> Reference {
        Reference::to(&self.id)
    }
}

/// Record kinds that can claim a profile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    Bundle,
    Composition,
    Patient,
    Practitioner,
    Organization,
    Encounter,
    Invoice,
    DocumentReference,
    Binary,
}

impl RecordKind {
    fn profile_name(self) -> &'static str {
        match self {
            RecordKind::Bundle => "DocumentBundle",
            RecordKind::Composition => "InvoiceRecord",
            RecordKind::Patient => "Patient",
            RecordKind::Practitioner => "Practitioner",
            RecordKind::Organization => "Organization",
            RecordKind::Encounter => "Encounter",
            RecordKind::Invoice => "Invoice",
            RecordKind::DocumentReference => "DocumentReference",
            RecordKind::Binary => "Binary",
        }
    }
}

/// Per-build state shared by every builder.
#[derive(Clone, Debug)]
pub struct BuildContext<'a> {
    pub config: &'a EngineConfig,
    /// Build time, offset-qualified. Used wherever a record needs "now".
    pub timestamp: String,
}

impl<'a> BuildContext<'a> {
    pub fn new(config: &'a EngineConfig, timestamp: String) -> Self {
        Self { config, timestamp }
    }

    /// Profile URL for `kind`, or `None` when profiles are disabled.
    pub fn profile(&self, kind: RecordKind) -> Option<String> {
        self.config
            .attach_profiles()
            .then(|| format!("{PROFILE_BASE}{}", kind.profile_name()))
    }

    /// Shared fields of a record declared in the configured language.
    pub fn base(&self, id: &ResourceId, kind: RecordKind, summary: &str) -> DomainResource {
        let profile = self.profile(kind);
        DomainResource::new(id, self.config.language(), profile.as_deref(), summary)
    }
}

/// Trims `value` and drops it when blank.
pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
pub(crate) mod test_support {
    use crate::config::EngineConfig;
    use crate::input::PractitionerRecord;

    pub fn config() -> EngineConfig {
        EngineConfig::new(PractitionerRecord {
            id: None,
            display_name: "Dr. Meera Iyer".into(),
            license_value: "KMC-20931".into(),
        })
        .expect("valid config")
    }

    pub const TIMESTAMP: &str = "2024-03-01T10:30:00+05:30";
}
