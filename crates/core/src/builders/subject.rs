use super::{non_blank, BuildContext, Built, RecordKind};
use crate::constants::{IDENTIFIER_TYPE_SYSTEM, URN_IDENTIFIER_SYSTEM};
use crate::input::PatientRecord;
use crate::temporal::normalize_date;
use fhir::{
    Address, AdministrativeGender, CodeableConcept, Coding, ContactPoint, ContactPointSystem,
    HumanName, Identifier, Patient, ResourceId,
};

/// Builds the subject record.
///
/// The directory's `externalRefId` is reused as the record identifier when it is a canonical
/// UUID and is always carried as the medical-record identifier. With neither that nor a health
/// address the record is identified by its own locator. Unparseable birth dates and blank
/// contact details are omitted.
pub fn build_subject(
    ctx: &BuildContext<'_>,
    patient: &PatientRecord,
    selected_health_address: Option<&str>,
) -> Built<Patient> {
    let external_ref = non_blank(patient.external_ref_id.as_deref());
    let id = ResourceId::coerce(external_ref);
    let name = patient.name.trim();
    let systems = ctx.config.systems();

    let mut identifier = Vec::new();
    if let Some(mrn) = external_ref {
        identifier.push(
            Identifier::new(&systems.medical_record, mrn).typed(CodeableConcept::coded(
                Coding::new(IDENTIFIER_TYPE_SYSTEM, "MR", "Medical record number"),
            )),
        );
    }
    if let Some(address) = non_blank(selected_health_address) {
        identifier.push(Identifier::new(&systems.health_address, address));
    }
    if identifier.is_empty() {
        identifier.push(Identifier::new(URN_IDENTIFIER_SYSTEM, id.locator()));
    }

    let birth_date = non_blank(patient.dob.as_deref()).and_then(|dob| {
        let normalized = normalize_date(dob);
        if normalized.is_none() {
            tracing::warn!(dob, "omitting unparseable birth date");
        }
        normalized
    });

    let mut telecom = Vec::new();
    if let Some(mobile) = non_blank(patient.mobile.as_deref()) {
        telecom.push(ContactPoint {
            system: ContactPointSystem::Phone,
            value: mobile.to_owned(),
            use_: Some("mobile".into()),
        });
    }
    if let Some(email) = non_blank(patient.email.as_deref()) {
        telecom.push(ContactPoint {
            system: ContactPointSystem::Email,
            value: email.to_owned(),
            use_: None,
        });
    }

    let address = non_blank(patient.address.as_deref())
        .map(|text| Address {
            text: text.to_owned(),
        })
        .into_iter()
        .collect();

    let record = Patient {
        base: ctx.base(&id, RecordKind::Patient, &format!("Patient: {name}")),
        identifier,
        name: vec![HumanName {
            text: name.to_owned(),
        }],
        gender: patient
            .gender
            .as_deref()
            .and_then(AdministrativeGender::from_free_text),
        birth_date,
        telecom,
        address,
    };
    tracing::debug!(%id, "built subject record");

    Built::new(id, record)
}
