use super::{non_blank, BuildContext, Built, RecordKind};
use crate::constants::{BILLING_CODE_SYSTEM, FALLBACK_LINE_LABEL, PARTICIPANT_ROLE_SYSTEM};
use crate::input::{InvoiceInput, InvoiceLine};
use crate::temporal::{parse_local_datetime, to_offset_timestamp};
use crate::totals::{line_base, line_tax, round_money, Totals};
use fhir::{
    CodeableConcept, Coding, Identifier, Invoice, InvoiceLineItem, InvoiceParticipant,
    InvoiceStatus, Money, PriceComponent, PriceComponentType, Reference, ResourceId,
};
use rust_decimal::Decimal;

/// Builds the invoice record.
///
/// Every line uses the same convention: quantity is folded into a `base` component worth
/// `quantity × unitPrice`, followed by a `tax` component (`factor` = rate) when the line has a
/// rate. Components worth zero or out of range are left out; validation refuses out-of-range
/// lines before a build gets here. `totals` must already be reconciled.
pub fn build_invoice(
    ctx: &BuildContext<'_>,
    input: &InvoiceInput,
    totals: Totals,
    subject: Reference,
    author: Reference,
    issuer: Reference,
) -> Built<Invoice> {
    let id = ResourceId::new();
    let currency = ctx.config.currency();

    let date = non_blank(input.date.as_deref())
        .and_then(|date| {
            let parsed = parse_local_datetime(date);
            if parsed.is_none() {
                tracing::warn!(date, "invoice date unparseable, using build time");
            }
            parsed
        })
        .map(|wall| to_offset_timestamp(Some(wall)))
        .unwrap_or_else(|| ctx.timestamp.clone());

    let line_item = input
        .lines
        .iter()
        .zip(1u32..)
        .map(|(line, sequence)| line_item(line, sequence, currency))
        .collect();

    let total_price_component = if totals.tax > Decimal::ZERO {
        vec![PriceComponent {
            type_: PriceComponentType::Tax,
            code: Some(CodeableConcept::text("Tax")),
            factor: None,
            amount: Some(Money::new(totals.tax, currency)),
        }]
    } else {
        Vec::new()
    };

    let identifier = non_blank(input.number.as_deref())
        .map(|number| Identifier::new(&ctx.config.systems().invoice_number, number))
        .into_iter()
        .collect();

    let summary = match non_blank(input.number.as_deref()) {
        Some(number) => format!("Invoice {number}: {} {currency}", totals.gross),
        None => format!("Invoice: {} {currency}", totals.gross),
    };

    let record = Invoice {
        base: ctx.base(&id, RecordKind::Invoice, &summary),
        identifier,
        status: InvoiceStatus::Issued,
        type_: CodeableConcept::coded(Coding::new(BILLING_CODE_SYSTEM, "00", "Consultation")),
        subject,
        date,
        participant: vec![InvoiceParticipant {
            role: Some(CodeableConcept::coded(Coding::new(
                PARTICIPANT_ROLE_SYSTEM,
                "PPRF",
                "primary performer",
            ))),
            actor: author,
        }],
        issuer: Some(issuer),
        line_item,
        total_price_component,
        total_net: Money::new(totals.net, currency),
        total_gross: Money::new(totals.gross, currency),
    };
    tracing::debug!(%id, lines = input.lines.len(), "built invoice record");

    Built::new(id, record)
}

fn line_item(line: &InvoiceLine, sequence: u32, currency: &str) -> InvoiceLineItem {
    let label = non_blank(line.description.as_deref()).unwrap_or(FALLBACK_LINE_LABEL);

    let mut price_component = Vec::new();
    if let Some(base) = line_base(line).map(round_money).filter(|b| *b > Decimal::ZERO) {
        price_component.push(PriceComponent {
            type_: PriceComponentType::Base,
            code: None,
            factor: None,
            amount: Some(Money::new(base, currency)),
        });
    }
    let tax = line_tax(line).map(round_money).filter(|t| *t > Decimal::ZERO);
    if let (Some(rate), Some(tax)) = (line.tax_rate, tax) {
        price_component.push(PriceComponent {
            type_: PriceComponentType::Tax,
            code: Some(CodeableConcept::text("Tax")),
            factor: Some(rate),
            amount: Some(Money::new(tax, currency)),
        });
    }

    InvoiceLineItem {
        sequence,
        charge_item_codeable_concept: CodeableConcept::text(label),
        price_component,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builders::test_support::{config, TIMESTAMP};
    use crate::totals::compute_totals;
    use rust_decimal_macros::dec;

    fn refs() -> (Reference, Reference, Reference) {
        (
            Reference::to(&ResourceId::new()),
            Reference::to(&ResourceId::new()),
            Reference::to(&ResourceId::new()),
        )
    }

    fn input() -> InvoiceInput {
        InvoiceInput {
            number: Some("INV-0042".into()),
            lines: vec![
                InvoiceLine::new("Consultation", dec!(1), dec!(500)).with_tax_rate(dec!(0.18)),
                InvoiceLine {
                    description: Some(" ".into()),
                    quantity: dec!(2),
                    unit_price: dec!(0),
                    tax_rate: None,
                },
            ],
            ..Default::default()
        }
    }

    #[test]
    fn lines_follow_one_convention() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = input();
        let (subject, author, issuer) = refs();

        let built = build_invoice(
            &ctx,
            &input,
            compute_totals(&input.lines).expect("in range"),
            subject,
            author,
            issuer,
        );
        let lines = &built.record.line_item;

        assert_eq!(lines[0].sequence, 1);
        assert_eq!(lines[0].price_component.len(), 2);
        assert_eq!(lines[0].price_component[0].type_, PriceComponentType::Base);
        assert_eq!(
            lines[0].price_component[1].amount.as_ref().map(|m| m.value),
            Some(dec!(90.00))
        );
        assert_eq!(lines[0].price_component[1].factor, Some(dec!(0.18)));

        assert_eq!(
            lines[1].charge_item_codeable_concept.text.as_deref(),
            Some(FALLBACK_LINE_LABEL)
        );
        assert!(lines[1].price_component.is_empty());
    }

    #[test]
    fn totals_and_date_are_carried() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = input();
        let (subject, author, issuer) = refs();

        let built = build_invoice(
            &ctx,
            &input,
            compute_totals(&input.lines).expect("in range"),
            subject,
            author.clone(),
            issuer,
        );
        let record = &built.record;

        assert_eq!(record.date, TIMESTAMP);
        assert_eq!(record.total_net.value, dec!(500));
        assert_eq!(record.total_gross.value, dec!(590));
        assert_eq!(record.total_gross.currency, "INR");
        assert_eq!(record.total_price_component.len(), 1);
        assert_eq!(record.participant[0].actor, author);
        assert_eq!(record.identifier[0].value, "INV-0042");
    }

    #[test]
    fn untaxed_invoice_has_no_total_price_component() {
        let config = config();
        let ctx = BuildContext::new(&config, TIMESTAMP.into());
        let input = InvoiceInput {
            lines: vec![InvoiceLine::new("Dressing", dec!(3), dec!(40))],
            ..Default::default()
        };
        let (subject, author, issuer) = refs();

        let built = build_invoice(
            &ctx,
            &input,
            compute_totals(&input.lines).expect("in range"),
            subject,
            author,
            issuer,
        );
        let json = serde_json::to_value(&built.record).expect("serialise");

        assert!(json.get("totalPriceComponent").is_none());
        assert!(json.get("identifier").is_none());
        assert_eq!(json["totalNet"]["value"], serde_json::json!(120.0));
    }
}
