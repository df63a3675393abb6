use super::{non_blank, BuildContext, Built, RecordKind};
use crate::constants::IDENTIFIER_TYPE_SYSTEM;
use crate::input::OrganizationInput;
use fhir::{
    Address, CodeableConcept, Coding, ContactPoint, ContactPointSystem, Identifier, Organization,
    ResourceId,
};

/// Builds an organisation record (issuer, custodian or attester).
///
/// Returns `None` when the panel has no name; an unnamed organisation is never emitted.
pub fn build_organization(
    ctx: &BuildContext<'_>,
    input: &OrganizationInput,
) -> Option<Built<Organization>> {
    let name = non_blank(input.name.as_deref())?;
    let id = ResourceId::coerce(non_blank(input.id.as_deref()));

    let identifier = non_blank(input.facility_id.as_deref())
        .map(|facility| {
            Identifier::new(&ctx.config.systems().facility, facility).typed(
                CodeableConcept::coded(Coding::new(
                    IDENTIFIER_TYPE_SYSTEM,
                    "PRN",
                    "Provider number",
                )),
            )
        })
        .into_iter()
        .collect();

    let mut telecom = Vec::new();
    if let Some(phone) = non_blank(input.phone.as_deref()) {
        telecom.push(ContactPoint {
            system: ContactPointSystem::Phone,
            value: phone.to_owned(),
            use_: Some("work".into()),
        });
    }
    if let Some(email) = non_blank(input.email.as_deref()) {
        telecom.push(ContactPoint {
            system: ContactPointSystem::Email,
            value: email.to_owned(),
            use_: Some("work".into()),
        });
    }

    let address = non_blank(input.address.as_deref())
        .map(|text| Address {
            text: text.to_owned(),
        })
        .into_iter()
        .collect();

    let record = Organization {
        base: ctx.base(&id, RecordKind::Organization, &format!("Organization: {name}")),
        identifier,
        name: name.to_owned(),
        telecom,
        address,
    };
    tracing::debug!(%id, "built organization record");

    Some(Built::new(id, record))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{config, TIMESTAMP};

    #[test]
    fn unnamed_panel_builds_nothing() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = OrganizationInput {
            name: Some("  ".into()),
            facility_id: Some("IN2710".into()),
            ..Default::default()
        };

        assert!(build_organization(&ctx, &input).is_none());
    }

    #[test]
    fn carries_facility_and_contacts() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = OrganizationInput {
            name: Some("Sunrise Clinic".into()),
            facility_id: Some("IN2710".into()),
            phone: Some("080-4000-1234".into()),
            address: Some("12 MG Road, Bengaluru".into()),
            ..Default::default()
        };

        let built = build_organization(&ctx, &input).expect("named");
        let json = serde_json::to_value(&built.record).expect("serialise");

        assert_eq!(json["name"], "Sunrise Clinic");
        assert_eq!(json["identifier"][0]["value"], "IN2710");
        assert_eq!(json["telecom"].as_array().map(Vec::len), Some(1));
        assert_eq!(json["address"][0]["text"], "12 MG Road, Bengaluru");
    }
}
