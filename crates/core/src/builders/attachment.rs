use super::{BuildContext, Built, RecordKind};
use crate::constants::{RECORD_ARTIFACT_CODE, SNOMED_SYSTEM};
use base64::{engine::general_purpose, Engine as _};
use fhir::{
    Attachment as AttachmentField, Binary, CodeableConcept, Coding, DocumentContent,
    DocumentReference, DocumentReferenceStatus, Meta, Reference, ResourceId,
};
use invrec_files::Attachment;

/// Builds the payload record for one attachment.
///
/// `data` is plain standard base64 with padding and no `data:` prefix.
pub fn build_payload(ctx: &BuildContext<'_>, attachment: &Attachment) -> Built<Binary> {
    let id = ResourceId::new();
    let profile = ctx.profile(RecordKind::Binary);

    let record = Binary {
        id: id.to_string(),
        meta: Meta::with_profile(profile.as_deref()),
        content_type: attachment.mime_type().to_owned(),
        data: general_purpose::STANDARD.encode(attachment.bytes()),
    };
    tracing::debug!(
        %id,
        size = attachment.size(),
        placeholder = attachment.is_placeholder(),
        "built attachment payload"
    );

    Built::new(id, record)
}

/// Builds the reference record describing `payload`.
///
/// Carries the same title and MIME type as the attachment and points at the payload's
/// locator.
pub fn build_document_reference(
    ctx: &BuildContext<'_>,
    attachment: &Attachment,
    payload: &Built<Binary>,
    subject: Reference,
    author: Reference,
) -> Built<DocumentReference> {
    let id = ResourceId::new();
    let title = attachment.filename();

    let record = DocumentReference {
        base: ctx.base(
            &id,
            RecordKind::DocumentReference,
            &format!("Attachment: {title}"),
        ),
        status: DocumentReferenceStatus::Current,
        type_: CodeableConcept::coded(Coding::new(
            SNOMED_SYSTEM,
            RECORD_ARTIFACT_CODE,
            "Record artifact",
        )),
        subject,
        date: ctx.timestamp.clone(),
        author: vec![author],
        content: vec![DocumentContent {
            attachment: AttachmentField {
                content_type: payload.record.content_type.clone(),
                language: Some(ctx.config.language().to_owned()),
                title: title.to_owned(),
                url: payload.id.locator(),
                size: Some(attachment.size()),
                creation: Some(ctx.timestamp.clone()),
            },
        }],
    };
    tracing::debug!(%id, payload = %payload.id, "built attachment reference");

    Built::new(id, record)
}
