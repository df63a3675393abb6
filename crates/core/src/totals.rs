//! Invoice totals.
//!
//! Amounts are exact decimals throughout and only rounded (half away from zero, two places)
//! when a figure is reported. Arithmetic is checked: an amount that does not fit a `Decimal`
//! yields `None` instead of a panic, and validation refuses such input before a build starts.

use crate::input::{InvoiceLine, TotalsOverride};
use rust_decimal::{Decimal, RoundingStrategy};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

/// Net, tax and gross figures of one invoice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    #[serde(with = "rust_decimal::serde::float")]
    pub net: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub tax: Decimal,
    #[serde(with = "rust_decimal::serde::float")]
    pub gross: Decimal,
}

/// Rounds a money amount to two decimal places, half away from zero.
pub fn round_money(amount: Decimal) -> Decimal {
    amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Unrounded `quantity × unitPrice` of one line, or `None` when it is out of range.
pub fn line_base(line: &InvoiceLine) -> Option<Decimal> {
    line.quantity.checked_mul(line.unit_price)
}

/// Unrounded tax of one line; zero when no rate is given, `None` when out of range.
pub fn line_tax(line: &InvoiceLine) -> Option<Decimal> {
    match line.tax_rate {
        Some(rate) => line_base(line)?.checked_mul(rate),
        None => Some(Decimal::ZERO),
    }
}

/// Computes totals from line items.
///
/// `net` and `tax` are each summed exactly and rounded once; `gross` is their sum. Returns
/// `None` when any line amount or sum is out of range.
pub fn compute_totals(lines: &[InvoiceLine]) -> Option<Totals> {
    let net = checked_sum(lines, line_base)?;
    let tax = checked_sum(lines, line_tax)?;
    let (net, tax) = (round_money(net), round_money(tax));
    Some(Totals {
        net,
        tax,
        gross: net.checked_add(tax)?,
    })
}

fn checked_sum(
    lines: &[InvoiceLine],
    amount: fn(&InvoiceLine) -> Option<Decimal>,
) -> Option<Decimal> {
    lines
        .iter()
        .try_fold(Decimal::ZERO, |sum, line| sum.checked_add(amount(line)?))
}

/// Applies user overrides to computed totals.
///
/// Each figure is replaced independently, and only by an override that parses as a finite
/// number. A single override is never used to correct the other two figures.
pub fn reconcile(computed: Totals, overrides: &TotalsOverride) -> Totals {
    let pick = |computed: Decimal, value: Option<&str>, figure: &str| {
        match value.map(|v| (v, parse_override(v))) {
            Some((_, Ok(parsed))) => parsed,
            Some((raw, Err(reason))) if reason != OverrideError::Blank => {
                tracing::warn!(figure, value = raw, %reason, "ignoring total override");
                computed
            }
            _ => computed,
        }
    };

    Totals {
        net: pick(computed.net, overrides.net.as_deref(), "net"),
        tax: pick(computed.tax, overrides.tax.as_deref(), "tax"),
        gross: pick(computed.gross, overrides.gross.as_deref(), "gross"),
    }
}

/// Why an override figure was not used.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OverrideError {
    Blank,
    NotANumber,
    NotFinite,
    /// Finite, but beyond what a `Decimal` holds (roughly ±7.9e28).
    OutOfRange,
}

impl fmt::Display for OverrideError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            OverrideError::Blank => "blank",
            OverrideError::NotANumber => "not a number",
            OverrideError::NotFinite => "not finite",
            OverrideError::OutOfRange => "out of range",
        })
    }
}

/// Parses an override figure, rounded to money precision.
///
/// # Errors
///
/// Returns the reason the text cannot be used: blank, non-numeric, non-finite such as `inf`
/// or `NaN`, or out of `Decimal` range.
pub fn parse_override(value: &str) -> Result<Decimal, OverrideError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(OverrideError::Blank);
    }
    let float = value
        .parse::<f64>()
        .map_err(|_| OverrideError::NotANumber)?;
    if !float.is_finite() {
        return Err(OverrideError::NotFinite);
    }
    Decimal::from_str(value)
        .or_else(|_| Decimal::from_scientific(value))
        .map(round_money)
        .map_err(|_| OverrideError::OutOfRange)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn lines() -> Vec<InvoiceLine> {
        vec![
            InvoiceLine::new("Consultation", dec!(1), dec!(500.00)).with_tax_rate(dec!(0.18)),
            InvoiceLine::new("Dressing", dec!(3), dec!(33.335)),
            InvoiceLine::new("Tablets", dec!(0), dec!(12.00)),
        ]
    }

    #[test]
    fn net_is_rounded_sum_of_line_amounts() {
        let totals = compute_totals(&lines()).expect("in range");

        // 500 + 100.005 + 0
        assert_eq!(totals.net, dec!(600.01));
        assert_eq!(totals.tax, dec!(90.00));
        assert_eq!(totals.gross, dec!(690.01));
    }

    #[test]
    fn empty_lines_total_zero() {
        assert_eq!(compute_totals(&[]), Some(Totals::default()));
    }

    #[test]
    fn non_numeric_override_keeps_computed_value() {
        let computed = compute_totals(&lines()).expect("in range");
        let overrides = TotalsOverride {
            net: Some("six hundred".into()),
            tax: Some("".into()),
            gross: Some("NaN".into()),
        };

        assert_eq!(reconcile(computed, &overrides), computed);
    }

    #[test]
    fn overrides_apply_independently() {
        let computed = compute_totals(&lines()).expect("in range");
        let overrides = TotalsOverride {
            net: None,
            tax: None,
            gross: Some(" 700.005 ".into()),
        };

        let reconciled = reconcile(computed, &overrides);

        assert_eq!(reconciled.net, computed.net);
        assert_eq!(reconciled.tax, computed.tax);
        assert_eq!(reconciled.gross, dec!(700.01));
    }

    #[test]
    fn reconcile_is_idempotent() {
        let computed = compute_totals(&lines()).expect("in range");
        let overrides = TotalsOverride {
            net: Some("1e3".into()),
            ..Default::default()
        };

        let first = reconcile(computed, &overrides);
        let second = reconcile(computed, &overrides);

        assert_eq!(first, second);
        assert_eq!(first.net, dec!(1000));
    }

    #[test]
    fn parse_override_rejects_non_finite() {
        assert_eq!(parse_override("inf"), Err(OverrideError::NotFinite));
        assert_eq!(parse_override("-infinity"), Err(OverrideError::NotFinite));
        assert_eq!(parse_override("12,50"), Err(OverrideError::NotANumber));
        assert_eq!(parse_override("  "), Err(OverrideError::Blank));
        assert_eq!(parse_override("-4.5"), Ok(dec!(-4.50)));
    }

    #[test]
    fn parse_override_reports_out_of_range() {
        assert_eq!(parse_override("1e30"), Err(OverrideError::OutOfRange));
        assert_eq!(parse_override("1e20"), Ok(dec!(100000000000000000000)));
    }

    #[test]
    fn out_of_range_override_keeps_computed_value() {
        let computed = compute_totals(&lines()).expect("in range");
        let overrides = TotalsOverride {
            gross: Some("1e30".into()),
            ..Default::default()
        };

        assert_eq!(reconcile(computed, &overrides), computed);
    }

    #[test]
    fn overflowing_line_amount_is_none() {
        let huge = InvoiceLine::new("Implant", dec!(10000000000000000), dec!(10000000000000000));

        assert_eq!(line_base(&huge), None);
        assert_eq!(line_tax(&huge.clone().with_tax_rate(dec!(0.18))), None);
        assert_eq!(compute_totals(&[huge]), None);
    }

    #[test]
    fn overflowing_sum_is_none() {
        let line = InvoiceLine::new("Implant", dec!(1), Decimal::MAX);

        assert_eq!(line_base(&line), Some(Decimal::MAX));
        assert_eq!(compute_totals(&[line.clone(), line]), None);
    }

    #[test]
    fn totals_serialise_as_numbers() {
        let json = serde_json::to_value(Totals {
            net: dec!(10.50),
            tax: dec!(0),
            gross: dec!(10.50),
        })
        .expect("serialise");

        assert_eq!(json["net"], serde_json::json!(10.5));
    }
}
