use super::{non_blank, BuildContext, Built, RecordKind};
use crate::constants::{ACT_CODE_SYSTEM, DEFAULT_ENCOUNTER_CLASS};
use crate::input::EncounterInput;
use crate::temporal::{parse_local_datetime, to_offset_timestamp};
use fhir::{Coding, Encounter, EncounterStatus, Period, Reference, ResourceId};

/// Builds the encounter context.
///
/// Returns `None` unless at least one of id, class or start time is filled in. The period
/// starts at the given start time, or at build time when it is missing or unparseable.
pub fn build_encounter(
    ctx: &BuildContext<'_>,
    input: &EncounterInput,
    subject: Reference,
    service_provider: Option<Reference>,
) -> Option<Built<Encounter>> {
    let id_text = non_blank(input.id.as_deref());
    let class_code = non_blank(input.class_code.as_deref());
    let start_text = non_blank(input.start.as_deref());
    if id_text.is_none() && class_code.is_none() && start_text.is_none() {
        return None;
    }

    let id = ResourceId::coerce(id_text);
    let code = class_code
        .unwrap_or(DEFAULT_ENCOUNTER_CLASS)
        .to_ascii_uppercase();

    let start = start_text
        .and_then(|start| {
            let parsed = parse_local_datetime(start);
            if parsed.is_none() {
                tracing::warn!(start, "encounter start unparseable, using build time");
            }
            parsed
        })
        .map(|wall| to_offset_timestamp(Some(wall)))
        .unwrap_or_else(|| ctx.timestamp.clone());
    let end = non_blank(input.end.as_deref())
        .and_then(parse_local_datetime)
        .map(|wall| to_offset_timestamp(Some(wall)));

    let record = Encounter {
        base: ctx.base(
            &id,
            RecordKind::Encounter,
            &format!("Encounter ({}) starting {start}", class_display(&code)),
        ),
        identifier: Vec::new(),
        status: EncounterStatus::Finished,
        class: Coding::new(ACT_CODE_SYSTEM, &code, class_display(&code)),
        subject,
        period: Period {
            start: Some(start),
            end,
        },
        service_provider,
    };
    tracing::debug!(%id, "built encounter record");

    Some(Built::new(id, record))
}

fn class_display(code: &str) -> &str {
    match code {
        "AMB" => "ambulatory",
        "EMER" => "emergency",
        "FLD" => "field",
        "HH" => "home health",
        "IMP" => "inpatient encounter",
        "ACUTE" => "inpatient acute",
        "NONAC" => "inpatient non-acute",
        "OBSENC" => "observation encounter",
        "PRENC" => "pre-admission",
        "SS" => "short stay",
        "VR" => "virtual",
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{config, TIMESTAMP};

    fn subject() -> Reference {
        Reference::to(&ResourceId::new())
    }

    #[test]
    fn empty_input_builds_nothing() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = EncounterInput {
            end: Some("2024-03-01T11:00".into()),
            ..Default::default()
        };

        assert!(build_encounter(&ctx, &input, subject(), None).is_none());
    }

    #[test]
    fn class_defaults_to_ambulatory_and_start_to_build_time() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = EncounterInput {
            id: Some("ENC-9".into()),
            ..Default::default()
        };

        let built = build_encounter(&ctx, &input, subject(), None).expect("built");

        assert_eq!(built.record.class.code.as_deref(), Some("AMB"));
        assert_eq!(built.record.status, EncounterStatus::Finished);
        assert_eq!(built.record.period.start.as_deref(), Some(TIMESTAMP));
        assert!(built.record.period.end.is_none());
    }

    #[test]
    fn start_time_is_offset_qualified() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = EncounterInput {
            class_code: Some("imp".into()),
            start: Some("2024-02-28 09:15".into()),
            ..Default::default()
        };

        let built = build_encounter(&ctx, &input, subject(), None).expect("built");
        let start = built.record.period.start.expect("start");

        assert!(start.starts_with("2024-02-28T09:15:00"));
        assert!(!start.ends_with('Z'));
        assert_eq!(built.record.class.display.as_deref(), Some("inpatient encounter"));
    }
}
