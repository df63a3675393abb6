//! Input records handed to the engine by its collaborators.
//!
//! These are the shapes the form layer, the patient directory and ambient configuration supply.
//! They are deliberately permissive: blank strings, missing sections and mixed address shapes
//! are all accepted here and resolved by the validator and normalizers.

use crate::contact::RawAddressEntry;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

/// Subject of the invoice as returned by the patient directory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub gender: Option<String>,

    /// Free-form date of birth (`dd-mm-yyyy`, `dd/mm/yy`, ISO, ...).
    #[serde(default, alias = "birthDate")]
    pub dob: Option<String>,

    #[serde(default)]
    pub mobile: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub address: Option<String>,

    /// Directory identifier; reused as the record id when it is a valid UUID.
    #[serde(default)]
    pub external_ref_id: Option<String>,

    #[serde(default)]
    pub primary_health_address: Option<String>,

    /// Top-level location of the alternate health-address list.
    #[serde(default)]
    pub alternate_health_addresses: Option<Vec<RawAddressEntry>>,

    /// Nested location of the alternate health-address list.
    #[serde(default)]
    pub health_account: Option<HealthAccount>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthAccount {
    #[serde(default)]
    pub alternate_health_addresses: Option<Vec<RawAddressEntry>>,
}

/// Identity of the practitioner authoring the invoice, taken from configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PractitionerRecord {
    #[serde(default)]
    pub id: Option<String>,
    pub display_name: String,
    pub license_value: String,
}

/// An organisation panel on the form (issuer, custodian or attester).
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationInput {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub facility_id: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EncounterInput {
    #[serde(default)]
    pub id: Option<String>,
    /// `v3-ActCode` class, for example `AMB` or `IMP`.
    #[serde(default)]
    pub class_code: Option<String>,
    #[serde(default)]
    pub start: Option<String>,
    #[serde(default)]
    pub end: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttesterInput {
    /// `personal`, `professional`, `legal` or `official`.
    #[serde(default)]
    pub mode: Option<String>,
    /// Attesting organisation; the author attests when absent.
    #[serde(default)]
    pub organization: Option<OrganizationInput>,
}

/// One billable item.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceLine {
    #[serde(default)]
    pub description: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    /// Fractional tax rate (`0.18` for 18%).
    #[serde(default)]
    pub tax_rate: Option<Decimal>,
}

impl InvoiceLine {
    pub fn new(description: &str, quantity: Decimal, unit_price: Decimal) -> Self {
        Self {
            description: Some(description.to_owned()),
            quantity,
            unit_price,
            tax_rate: None,
        }
    }

    pub fn with_tax_rate(mut self, rate: Decimal) -> Self {
        self.tax_rate = Some(rate);
        self
    }
}

/// User-entered totals that take precedence over the computed ones when numeric.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TotalsOverride {
    #[serde(default, deserialize_with = "string_or_number")]
    pub net: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub tax: Option<String>,
    #[serde(default, deserialize_with = "string_or_number")]
    pub gross: Option<String>,
}

/// Accepts `"12.50"`, `12.5` or `null` for an override field.
fn string_or_number<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceInput {
    /// Business invoice number.
    #[serde(default)]
    pub number: Option<String>,
    /// Free-form invoice date/time; the build time is used when absent or unparseable.
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub lines: Vec<InvoiceLine>,
    #[serde(default)]
    pub overrides: TotalsOverride,
}

/// Everything the form layer hands over for one build.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildInput {
    #[serde(default)]
    pub patient: Option<PatientRecord>,

    /// Must be one of the normalised health addresses, or empty.
    #[serde(default)]
    pub selected_health_address: Option<String>,

    /// Issuing organisation.
    #[serde(default)]
    pub organization: OrganizationInput,

    #[serde(default)]
    pub custodian: Option<OrganizationInput>,

    #[serde(default)]
    pub encounter: Option<EncounterInput>,

    #[serde(default)]
    pub attester: Option<AttesterInput>,

    #[serde(default)]
    pub invoice: InvoiceInput,

    #[serde(default)]
    pub document_title: Option<String>,

    /// Free text rendered as an inline narrative section.
    #[serde(default)]
    pub notes: Option<String>,
}
