//! Reference graph assembly.
//!
//! Wires the built records into the root composition and wraps everything into the document
//! bundle. The finished bundle is checked before it is handed out: every entry is located at
//! its own identifier, identifiers are unique, and every `urn:uuid:` reference resolves to an
//! entry.

use crate::builders::{BuildContext, Built, RecordKind};
use crate::constants::{BILLING_CODE_SYSTEM, URN_IDENTIFIER_SYSTEM};
use crate::{EngineError, EngineResult};
use fhir::{
    AttestationMode, Binary, Bundle, BundleEntry, BundleType, CodeableConcept, Coding,
    Composition, CompositionAttester, CompositionStatus, DocumentReference, Encounter,
    Identifier, Invoice, Meta, Narrative, Organization, Patient, Practitioner, Reference,
    Resource, ResourceId, Section, LOCATOR_PREFIX,
};
use serde_json::Value;
use std::collections::HashSet;

/// Every record of one build, before the composition exists.
#[derive(Clone, Debug)]
pub struct RecordSet {
    pub subject: Built<Patient>,
    pub author: Built<Practitioner>,
    pub issuer: Built<Organization>,
    pub invoice: Built<Invoice>,
    pub encounter: Option<Built<Encounter>>,
    pub custodian: Option<OrganizationPanel>,
    pub attester_organization: Option<OrganizationPanel>,
    /// Attachment references paired with the payloads they describe. Never empty.
    pub documents: Vec<(Built<DocumentReference>, Built<Binary>)>,
}

/// An optional organisation panel (custodian or attester).
#[derive(Clone, Debug)]
pub enum OrganizationPanel {
    /// A record of its own, emitted as a bundle entry.
    Own(Built<Organization>),
    /// The same organisation as a record already in the set; only referenced.
    Shared(Reference),
}

impl OrganizationPanel {
    pub fn reference(&self) -> Reference {
        match self {
            OrganizationPanel::Own(built) => built.reference(),
            OrganizationPanel::Shared(reference) => reference.clone(),
        }
    }

    fn into_record(self) -> Option<Organization> {
        match self {
            OrganizationPanel::Own(built) => Some(built.record),
            OrganizationPanel::Shared(_) => None,
        }
    }
}

/// Document-level details of the composition.
#[derive(Clone, Debug)]
pub struct DocumentInfo {
    pub title: String,
    pub notes: Option<String>,
    pub attester_mode: AttestationMode,
}

/// Parses the attester mode chosen on the form.
///
/// Blank input means `official`. Unknown modes also fall back to `official`, with a warning.
pub fn attestation_mode(input: Option<&str>) -> AttestationMode {
    match input.map(str::trim).filter(|m| !m.is_empty()) {
        None => AttestationMode::Official,
        Some(mode) => AttestationMode::parse(mode).unwrap_or_else(|| {
            tracing::warn!(mode, "unknown attester mode, using official");
            AttestationMode::Official
        }),
    }
}

fn document_type() -> CodeableConcept {
    CodeableConcept::coded(Coding::new(BILLING_CODE_SYSTEM, "INVOICE", "Invoice"))
}

/// Builds the root composition over `records`.
///
/// The attester is the attesting organisation when one was built, otherwise the author.
pub fn build_composition(
    ctx: &BuildContext<'_>,
    records: &RecordSet,
    info: &DocumentInfo,
) -> Built<Composition> {
    let id = ResourceId::new();
    let language = ctx.config.language();

    let party = records
        .attester_organization
        .as_ref()
        .map_or_else(|| records.author.reference(), OrganizationPanel::reference);

    let mut entry = vec![records.invoice.reference()];
    entry.extend(records.documents.iter().map(|(doc, _)| doc.reference()));
    let mut section = vec![Section {
        title: "Invoice".into(),
        code: Some(document_type()),
        text: None,
        entry,
    }];
    if let Some(notes) = info.notes.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
        section.push(Section {
            title: "Notes".into(),
            code: None,
            text: Some(Narrative::generated(language, notes)),
            entry: Vec::new(),
        });
    }

    let subject_name = records
        .subject
        .record
        .name
        .first()
        .map(|n| n.text.clone())
        .unwrap_or_default();

    let record = Composition {
        base: ctx.base(&id, RecordKind::Composition, &info.title),
        identifier: Some(Identifier::new(URN_IDENTIFIER_SYSTEM, id.locator())),
        status: CompositionStatus::Final,
        type_: document_type(),
        subject: records.subject.reference().with_display(subject_name),
        encounter: records.encounter.as_ref().map(Built::reference),
        date: ctx.timestamp.clone(),
        author: vec![records.author.reference()],
        title: info.title.clone(),
        attester: vec![CompositionAttester {
            mode: info.attester_mode,
            time: Some(ctx.timestamp.clone()),
            party,
        }],
        custodian: records.custodian.as_ref().map(OrganizationPanel::reference),
        section,
    };
    tracing::debug!(%id, "built composition");

    Built::new(id, record)
}

/// Wraps the composition and records into the document bundle.
///
/// Entry order: composition, subject, author, issuer, invoice, the optional encounter,
/// custodian and attester records, then every attachment reference followed by every payload.
/// A shared panel adds no entry of its own.
///
/// # Errors
///
/// Returns a structural [`EngineError`] if the assembled bundle fails [`check_references`].
pub fn assemble_bundle(
    ctx: &BuildContext<'_>,
    composition: Built<Composition>,
    records: RecordSet,
) -> EngineResult<Bundle> {
    let RecordSet {
        subject,
        author,
        issuer,
        invoice,
        encounter,
        custodian,
        attester_organization,
        documents,
    } = records;

    let mut resources = vec![
        Resource::Composition(composition.record),
        Resource::Patient(subject.record),
        Resource::Practitioner(author.record),
        Resource::Organization(issuer.record),
        Resource::Invoice(invoice.record),
    ];
    resources.extend(encounter.map(|e| Resource::Encounter(e.record)));
    resources.extend(
        [custodian, attester_organization]
            .into_iter()
            .flatten()
            .filter_map(OrganizationPanel::into_record)
            .map(Resource::Organization),
    );

    let (references, payloads): (Vec<_>, Vec<_>) = documents.into_iter().unzip();
    resources.extend(references.into_iter().map(|d| Resource::DocumentReference(d.record)));
    resources.extend(payloads.into_iter().map(|b| Resource::Binary(b.record)));

    let id = ResourceId::new();
    let profile = ctx.profile(RecordKind::Bundle);
    let bundle = Bundle {
        resource_type: "Bundle".into(),
        id: id.to_string(),
        meta: Some(Meta {
            profile: profile.into_iter().collect(),
            last_updated: Some(ctx.timestamp.clone()),
        }),
        identifier: Identifier::new(URN_IDENTIFIER_SYSTEM, id.locator()),
        type_: BundleType::Document,
        timestamp: ctx.timestamp.clone(),
        entry: resources.into_iter().map(BundleEntry::locate).collect(),
    };

    check_references(&bundle)?;
    Ok(bundle)
}

/// Checks the structural invariants of a bundle.
///
/// # Errors
///
/// - [`EngineError::DuplicateIdentifier`] if two entries share an identifier
/// - [`EngineError::MislocatedEntry`] if an entry's locator is not derived from its identifier
/// - [`EngineError::DanglingReference`] if a `reference` or attachment `url` carrying the
///   locator prefix resolves to no entry
pub fn check_references(bundle: &Bundle) -> EngineResult<()> {
    let mut seen = HashSet::new();
    for entry in &bundle.entry {
        if !seen.insert(entry.resource.id()) {
            return Err(EngineError::DuplicateIdentifier(entry.resource.id().to_owned()));
        }
    }

    if let Some(entry) = bundle.mislocated_entries().first() {
        return Err(EngineError::MislocatedEntry {
            locator: entry.full_url.clone(),
            id: entry.resource.id().to_owned(),
        });
    }

    let locators = bundle.locators();
    for entry in &bundle.entry {
        let value = serde_json::to_value(&entry.resource).map_err(EngineError::Serialization)?;
        let mut found = Vec::new();
        collect_locator_refs(&value, &mut found);

        if let Some(reference) = found.into_iter().find(|r| !locators.contains(r.as_str())) {
            return Err(EngineError::DanglingReference {
                resource_type: entry.resource.resource_type(),
                id: entry.resource.id().to_owned(),
                reference,
            });
        }
    }

    Ok(())
}

/// Walks a serialised record collecting `reference` and `url` strings that carry the locator
/// prefix.
fn collect_locator_refs(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Array(items) => {
            for item in items {
                collect_locator_refs(item, out);
            }
        }
        Value::Object(obj) => {
            for key in ["reference", "url"] {
                if let Some(target) = obj.get(key).and_then(Value::as_str) {
                    if target.starts_with(LOCATOR_PREFIX) {
                        out.push(target.to_owned());
                    }
                }
            }
            for child in obj.values() {
                collect_locator_refs(child, out);
            }
        }
        _ => {}
    }
}
