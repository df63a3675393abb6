use super::{non_blank, BuildContext, Built, RecordKind};
use crate::constants::IDENTIFIER_TYPE_SYSTEM;
use fhir::{CodeableConcept, Coding, HumanName, Identifier, Practitioner, ResourceId};

/// Builds the author record from the configured practitioner.
pub fn build_author(ctx: &BuildContext<'_>) -> Built<Practitioner> {
    let practitioner = ctx.config.practitioner();
    let id = ResourceId::coerce(non_blank(practitioner.id.as_deref()));
    let name = practitioner.display_name.trim();

    let license = Identifier::new(
        &ctx.config.systems().practitioner_license,
        practitioner.license_value.trim(),
    )
    .typed(CodeableConcept::coded(Coding::new(
        IDENTIFIER_TYPE_SYSTEM,
        "MD",
        "Medical License number",
    )));

    let record = Practitioner {
        base: ctx.base(&id, RecordKind::Practitioner, &format!("Practitioner: {name}")),
        identifier: vec![license],
        name: vec![HumanName {
            text: name.to_owned(),
        }],
    };
    tracing::debug!(%id, "built author record");

    Built::new(id, record)
}
