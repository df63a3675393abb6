//! Invoice record and its itemised price components.

use crate::datatypes::{CodeableConcept, DomainResource, Identifier, Money, Reference};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    Balanced,
    Cancelled,
    EnteredInError,
}

/// Kind of contribution a [`PriceComponent`] makes to a charge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriceComponentType {
    Base,
    Surcharge,
    Deduction,
    Discount,
    Tax,
    Informational,
}

/// One itemised contribution to a line item's (or the invoice's) charge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceComponent {
    #[serde(rename = "type")]
    pub type_: PriceComponentType,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(
        default,
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub factor: Option<Decimal>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Money>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLineItem {
    pub sequence: u32,

    pub charge_item_codeable_concept: CodeableConcept,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub price_component: Vec<PriceComponent>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceParticipant {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<CodeableConcept>,

    pub actor: Reference,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    #[serde(flatten)]
    pub base: DomainResource,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    pub status: InvoiceStatus,

    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    pub subject: Reference,

    pub date: String,

    pub participant: Vec<InvoiceParticipant>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issuer: Option<Reference>,

    pub line_item: Vec<InvoiceLineItem>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub total_price_component: Vec<PriceComponent>,

    pub total_net: Money,

    pub total_gross: Money,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn price_component_omits_absent_factor() {
        let component = PriceComponent {
            type_: PriceComponentType::Base,
            code: None,
            factor: None,
            amount: Some(Money::new(Decimal::new(300, 0), "INR")),
        };
        let value = serde_json::to_value(&component).expect("serialise");

        assert_eq!(
            value,
            json!({ "type": "base", "amount": { "value": 300.0, "currency": "INR" } })
        );
    }

    #[test]
    fn tax_component_carries_factor() {
        let component = PriceComponent {
            type_: PriceComponentType::Tax,
            code: None,
            factor: Some(Decimal::new(18, 2)),
            amount: None,
        };
        let value = serde_json::to_value(&component).expect("serialise");

        assert_eq!(value["type"], "tax");
        assert_eq!(value["factor"], json!(0.18));
    }
}
