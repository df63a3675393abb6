//! Pre-build validation.
//!
//! Every check runs before a build is attempted and all issues are collected, so the caller
//! sees the complete list at once. A build with any issue is refused outright.

use crate::config::EngineConfig;
use crate::contact::normalize_addresses;
use crate::input::BuildInput;
use crate::totals::{compute_totals, line_tax};
use crate::{EngineError, EngineResult};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt;

/// One reason a build input was refused.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "issue", rename_all = "camelCase")]
pub enum ValidationIssue {
    /// No patient was selected, or the selected patient has no name.
    MissingSubject,
    MissingPractitioner,
    /// The issuing organisation has no name.
    MissingIssuer,
    /// Neither a line item nor an attachment was supplied.
    NoBillableContent,
    InvalidLine { index: usize, reason: String },
    /// Every line is in range on its own but the invoice sums are not.
    TotalsOutOfRange,
    /// The selected health address is not one of the patient's addresses.
    UnknownHealthAddress { value: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationIssue::MissingSubject => write!(f, "no patient selected"),
            ValidationIssue::MissingPractitioner => {
                write!(f, "practitioner name and license are required")
            }
            ValidationIssue::MissingIssuer => write!(f, "issuing organisation name is required"),
            ValidationIssue::NoBillableContent => {
                write!(f, "at least one line item or attachment is required")
            }
            ValidationIssue::InvalidLine { index, reason } => {
                write!(f, "line {}: {reason}", index + 1)
            }
            ValidationIssue::TotalsOutOfRange => write!(f, "invoice totals are out of range"),
            ValidationIssue::UnknownHealthAddress { value } => {
                write!(f, "health address '{value}' is not registered for the patient")
            }
        }
    }
}

/// The aggregated list of issues behind a refused build. Never empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(Vec<ValidationIssue>);

impl ValidationErrors {
    pub(crate) fn single(issue: ValidationIssue) -> Self {
        Self(vec![issue])
    }

    pub fn issues(&self) -> &[ValidationIssue] {
        &self.0
    }

    pub fn contains(&self, issue: &ValidationIssue) -> bool {
        self.0.contains(issue)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let joined = self
            .0
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        f.write_str(&joined)
    }
}

/// Validates a build input against the configured engine.
///
/// `attachment_count` is the number of caller-supplied files, before any placeholder is
/// synthesised.
///
/// # Errors
///
/// Returns [`EngineError::Validation`] carrying every issue found.
pub fn validate_build_input(
    input: &BuildInput,
    attachment_count: usize,
    config: &EngineConfig,
) -> EngineResult<()> {
    let mut issues = Vec::new();

    let patient = input
        .patient
        .as_ref()
        .filter(|patient| !patient.name.trim().is_empty());
    if patient.is_none() {
        issues.push(ValidationIssue::MissingSubject);
    }

    let practitioner = config.practitioner();
    if practitioner.display_name.trim().is_empty() || practitioner.license_value.trim().is_empty()
    {
        issues.push(ValidationIssue::MissingPractitioner);
    }

    if is_blank(input.organization.name.as_deref()) {
        issues.push(ValidationIssue::MissingIssuer);
    }

    if input.invoice.lines.is_empty() && attachment_count == 0 {
        issues.push(ValidationIssue::NoBillableContent);
    }

    let mut lines_valid = true;
    for (index, line) in input.invoice.lines.iter().enumerate() {
        let reason = if line.quantity < Decimal::ZERO {
            Some("quantity cannot be negative")
        } else if line.unit_price < Decimal::ZERO {
            Some("unit price cannot be negative")
        } else if line.tax_rate.is_some_and(|rate| rate < Decimal::ZERO) {
            Some("tax rate cannot be negative")
        } else if line_tax(line).is_none() {
            Some("amount out of range")
        } else {
            None
        };
        if let Some(reason) = reason {
            issues.push(ValidationIssue::InvalidLine {
                index,
                reason: reason.into(),
            });
            lines_valid = false;
        }
    }
    if lines_valid && compute_totals(&input.invoice.lines).is_none() {
        issues.push(ValidationIssue::TotalsOutOfRange);
    }

    if let (Some(patient), Some(selected)) = (
        patient,
        input
            .selected_health_address
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty()),
    ) {
        let known = normalize_addresses(patient)
            .iter()
            .any(|address| address.value == selected);
        if !known {
            issues.push(ValidationIssue::UnknownHealthAddress {
                value: selected.to_owned(),
            });
        }
    }

    if issues.is_empty() {
        Ok(())
    } else {
        tracing::debug!(count = issues.len(), "build input refused");
        Err(EngineError::Validation(ValidationErrors(issues)))
    }
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |v| v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contact::RawAddressEntry;
    use crate::input::{InvoiceLine, OrganizationInput, PatientRecord, PractitionerRecord};
    use rust_decimal_macros::dec;

    fn config() -> EngineConfig {
        EngineConfig::new(PractitionerRecord {
            id: None,
            display_name: "Dr. Meera Iyer".into(),
            license_value: "KMC-20931".into(),
        })
        .expect("valid config")
    }

    fn valid_input() -> BuildInput {
        BuildInput {
            patient: Some(PatientRecord {
                name: "Asha Rao".into(),
                alternate_health_addresses: Some(vec![RawAddressEntry::Bare("asha@sbx".into())]),
                ..Default::default()
            }),
            organization: OrganizationInput {
                name: Some("Sunrise Clinic".into()),
                ..Default::default()
            },
            ..Default::default()
        }
    }

    fn issues_of(result: EngineResult<()>) -> Vec<ValidationIssue> {
        match result {
            Err(EngineError::Validation(errors)) => errors.issues().to_vec(),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn attachment_alone_is_billable_content() {
        assert!(validate_build_input(&valid_input(), 1, &config()).is_ok());
    }

    #[test]
    fn missing_subject_and_content_are_both_reported() {
        let mut input = valid_input();
        input.patient = None;

        let issues = issues_of(validate_build_input(&input, 0, &config()));

        assert_eq!(
            issues,
            vec![
                ValidationIssue::MissingSubject,
                ValidationIssue::NoBillableContent
            ]
        );
    }

    #[test]
    fn blank_patient_name_is_missing_subject() {
        let mut input = valid_input();
        if let Some(patient) = input.patient.as_mut() {
            patient.name = "   ".into();
        }

        let issues = issues_of(validate_build_input(&input, 1, &config()));
        assert_eq!(issues, vec![ValidationIssue::MissingSubject]);
    }

    #[test]
    fn negative_line_values_are_reported_per_line() {
        let mut input = valid_input();
        input.invoice.lines = vec![
            InvoiceLine::new("Consultation", dec!(1), dec!(500)),
            InvoiceLine::new("Dressing", dec!(-1), dec!(50)),
            InvoiceLine::new("Tablets", dec!(2), dec!(10)).with_tax_rate(dec!(-0.05)),
        ];

        let issues = issues_of(validate_build_input(&input, 0, &config()));

        assert_eq!(issues.len(), 2);
        assert!(matches!(issues[0], ValidationIssue::InvalidLine { index: 1, .. }));
        assert!(matches!(issues[1], ValidationIssue::InvalidLine { index: 2, .. }));
    }

    #[test]
    fn overflowing_line_amount_is_refused() {
        let mut input = valid_input();
        input.invoice.lines = vec![
            InvoiceLine::new("Consultation", dec!(1), dec!(500)),
            InvoiceLine::new("Implant", dec!(10000000000000000), dec!(10000000000000000)),
        ];

        let issues = issues_of(validate_build_input(&input, 0, &config()));

        assert_eq!(
            issues,
            vec![ValidationIssue::InvalidLine {
                index: 1,
                reason: "amount out of range".into()
            }]
        );
    }

    #[test]
    fn overflowing_invoice_sum_is_refused() {
        let mut input = valid_input();
        let line = InvoiceLine::new("Implant", dec!(1), Decimal::MAX);
        input.invoice.lines = vec![line.clone(), line];

        let issues = issues_of(validate_build_input(&input, 0, &config()));

        assert_eq!(issues, vec![ValidationIssue::TotalsOutOfRange]);
    }

    #[test]
    fn selected_health_address_must_be_known() {
        let mut input = valid_input();
        input.selected_health_address = Some("someone@sbx".into());

        let issues = issues_of(validate_build_input(&input, 1, &config()));
        assert_eq!(
            issues,
            vec![ValidationIssue::UnknownHealthAddress {
                value: "someone@sbx".into()
            }]
        );

        input.selected_health_address = Some("asha@sbx".into());
        assert!(validate_build_input(&input, 1, &config()).is_ok());
    }

    #[test]
    fn missing_issuer_is_reported() {
        let mut input = valid_input();
        input.organization.name = Some(" ".into());

        let issues = issues_of(validate_build_input(&input, 1, &config()));
        assert_eq!(issues, vec![ValidationIssue::MissingIssuer]);
    }

    #[test]
    fn display_joins_issues() {
        let errors = ValidationErrors(vec![
            ValidationIssue::MissingSubject,
            ValidationIssue::NoBillableContent,
        ]);

        assert_eq!(
            errors.to_string(),
            "no patient selected; at least one line item or attachment is required"
        );
    }
}
