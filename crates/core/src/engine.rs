//! The invoice bundle engine.
//!
//! One build is: validate, acquire attachment bytes, normalise, build every record, reconcile
//! totals, assemble. Apart from attachment acquisition every step is synchronous and pure
//! given the configuration, the input and freshly generated identifiers. Builds share no
//! state, so one engine can serve any number of concurrent builds.

use crate::assembler::{
    assemble_bundle, attestation_mode, build_composition, DocumentInfo, OrganizationPanel,
    RecordSet,
};
use crate::builders::{
    build_author, build_document_reference, build_encounter, build_invoice, build_organization,
    build_payload, build_subject, non_blank, BuildContext,
};
use crate::config::EngineConfig;
use crate::constants::DEFAULT_DOCUMENT_TITLE;
use crate::input::{BuildInput, EncounterInput, OrganizationInput};
use crate::submission::Submission;
use crate::temporal::to_offset_timestamp;
use crate::totals::{compute_totals, reconcile, Totals};
use crate::validation::{validate_build_input, ValidationErrors, ValidationIssue};
use crate::{EngineError, EngineResult};
use fhir::{Bundle, ResourceId};
use invrec_files::{acquire_all, Attachment, AttachmentSource};
use std::collections::HashSet;
use std::sync::Arc;

/// A finished document bundle and the figures it was built with.
#[derive(Clone, Debug)]
pub struct AssembledBundle {
    pub bundle: Bundle,
    pub totals: Totals,
    /// The patient directory's reference for the subject, passed on to the submission sink.
    pub original_patient_ref: Option<String>,
}

impl AssembledBundle {
    pub fn into_submission(self) -> Submission {
        Submission {
            bundle: self.bundle,
            original_patient_ref: self.original_patient_ref,
        }
    }

    /// Pretty-printed bundle JSON.
    pub fn render(&self) -> EngineResult<String> {
        Ok(self.bundle.render()?)
    }
}

/// Builds invoice document bundles for one configured practitioner.
#[derive(Clone, Debug)]
pub struct InvoiceBundleEngine {
    config: Arc<EngineConfig>,
}

impl InvoiceBundleEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config: Arc::new(config),
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Checks `input` without building anything.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Validation`] listing every issue found.
    pub fn validate(&self, input: &BuildInput, attachment_count: usize) -> EngineResult<()> {
        validate_build_input(input, attachment_count, &self.config)
    }

    /// Builds a bundle, reading attachment bytes first.
    ///
    /// Input is validated before any file is touched. All reads run concurrently and every one
    /// must succeed before assembly starts.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] if the input is refused
    /// - [`EngineError::AttachmentRead`] if any attachment cannot be read
    /// - a structural error if the assembled bundle is inconsistent
    pub async fn build(
        &self,
        input: &BuildInput,
        sources: Vec<AttachmentSource>,
    ) -> EngineResult<AssembledBundle> {
        self.validate(input, sources.len())?;
        let attachments = acquire_all(sources).await?;
        self.assemble(input, attachments)
    }

    /// Builds a bundle from attachments already in memory.
    ///
    /// With no attachments a single placeholder attachment is synthesised.
    ///
    /// # Errors
    ///
    /// - [`EngineError::Validation`] if the input is refused
    /// - a structural error if the assembled bundle is inconsistent
    pub fn assemble(
        &self,
        input: &BuildInput,
        attachments: Vec<Attachment>,
    ) -> EngineResult<AssembledBundle> {
        self.validate(input, attachments.len())?;
        let Some(patient) = input.patient.as_ref() else {
            return Err(refused(ValidationIssue::MissingSubject));
        };

        let config = self.config.as_ref();
        let features = config.features();
        let ctx = BuildContext::new(config, to_offset_timestamp(None));

        let subject = build_subject(&ctx, patient, input.selected_health_address.as_deref());
        let author = build_author(&ctx);
        let mut claimed = ClaimedIds::default();
        claimed.records.extend([subject.id, author.id]);

        let Some(OrganizationPanel::Own(issuer)) =
            organization_panel(&ctx, &input.organization, &mut claimed)
        else {
            return Err(refused(ValidationIssue::MissingIssuer));
        };

        let custodian = input
            .custodian
            .as_ref()
            .filter(|_| features.include_organization_panel)
            .and_then(|org| organization_panel(&ctx, org, &mut claimed));
        let encounter = input
            .encounter
            .as_ref()
            .filter(|_| features.include_encounter)
            .and_then(|enc| {
                let service_provider = Some(issuer.reference());
                let built =
                    build_encounter(&ctx, enc, subject.reference(), service_provider.clone())?;
                if !claimed.contains(&built.id) {
                    return Some(built);
                }
                tracing::warn!(id = %built.id, "encounter id already in use, issuing a fresh one");
                let fresh = EncounterInput {
                    id: None,
                    ..enc.clone()
                };
                build_encounter(&ctx, &fresh, subject.reference(), service_provider)
            });
        claimed.records.extend(encounter.as_ref().map(|e| e.id));
        let attester_organization = input
            .attester
            .as_ref()
            .and_then(|attester| attester.organization.as_ref())
            .filter(|_| features.include_attester)
            .and_then(|org| organization_panel(&ctx, org, &mut claimed));

        let computed = compute_totals(&input.invoice.lines)
            .ok_or_else(|| refused(ValidationIssue::TotalsOutOfRange))?;
        let totals = reconcile(computed, &input.invoice.overrides);
        let invoice = build_invoice(
            &ctx,
            &input.invoice,
            totals,
            subject.reference(),
            author.reference(),
            issuer.reference(),
        );

        let attachments = if attachments.is_empty() {
            tracing::debug!("no attachments supplied, using placeholder");
            vec![Attachment::placeholder()]
        } else {
            attachments
        };
        let documents = attachments
            .iter()
            .map(|attachment| {
                let payload = build_payload(&ctx, attachment);
                let reference = build_document_reference(
                    &ctx,
                    attachment,
                    &payload,
                    subject.reference(),
                    author.reference(),
                );
                (reference, payload)
            })
            .collect();

        let info = DocumentInfo {
            title: non_blank(input.document_title.as_deref())
                .unwrap_or(DEFAULT_DOCUMENT_TITLE)
                .to_owned(),
            notes: input.notes.clone(),
            attester_mode: attestation_mode(
                input.attester.as_ref().and_then(|a| a.mode.as_deref()),
            ),
        };

        let records = RecordSet {
            subject,
            author,
            issuer,
            invoice,
            encounter,
            custodian,
            attester_organization,
            documents,
        };
        let composition = build_composition(&ctx, &records, &info);
        let bundle = assemble_bundle(&ctx, composition, records)?;

        tracing::info!(
            bundle = %bundle.id,
            entries = bundle.entry.len(),
            net = %totals.net,
            gross = %totals.gross,
            "assembled invoice bundle"
        );

        Ok(AssembledBundle {
            bundle,
            totals,
            original_patient_ref: non_blank(patient.external_ref_id.as_deref()).map(str::to_owned),
        })
    }
}

/// Identifiers taken so far in one build. Caller-supplied ids are reused, so two panels can
/// name the same record.
#[derive(Default)]
struct ClaimedIds {
    records: HashSet<ResourceId>,
    organizations: HashSet<ResourceId>,
}

impl ClaimedIds {
    fn contains(&self, id: &ResourceId) -> bool {
        self.records.contains(id) || self.organizations.contains(id)
    }
}

/// Builds an organisation panel.
///
/// A panel naming an organisation already built is shared rather than emitted twice. An id
/// already taken by a record of another kind is replaced with a fresh one.
fn organization_panel(
    ctx: &BuildContext<'_>,
    input: &OrganizationInput,
    claimed: &mut ClaimedIds,
) -> Option<OrganizationPanel> {
    let built = build_organization(ctx, input)?;
    if claimed.organizations.contains(&built.id) {
        tracing::debug!(id = %built.id, "organisation already built, sharing its record");
        return Some(OrganizationPanel::Shared(built.reference()));
    }

    let built = if claimed.records.contains(&built.id) {
        tracing::warn!(id = %built.id, "organisation id already in use, issuing a fresh one");
        let fresh = OrganizationInput {
            id: None,
            ..input.clone()
        };
        build_organization(ctx, &fresh)?
    } else {
        built
    };
    claimed.organizations.insert(built.id);
    Some(OrganizationPanel::Own(built))
}

fn refused(issue: ValidationIssue) -> EngineError {
    EngineError::Validation(ValidationErrors::single(issue))
}
