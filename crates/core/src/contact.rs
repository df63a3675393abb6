//! Health-address normalisation.
//!
//! Patient directories return the alternate health-address list in several shapes: a list of
//! bare strings, a list of `{ value, isPrimary }` objects, or something else entirely. The raw
//! list is resolved exactly once here into [`AddressEntry`] and then into an ordered list of
//! [`NormalizedAddress`]; nothing downstream inspects the raw shape again.

use crate::input::PatientRecord;
use serde::{Deserialize, Serialize};

/// An address-list entry exactly as it appears on the wire.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawAddressEntry {
    Bare(String),
    Keyed {
        #[serde(alias = "address")]
        value: String,
        #[serde(default, rename = "isPrimary", alias = "primary")]
        is_primary: Option<bool>,
    },
    Other(serde_json::Value),
}

/// A raw entry resolved to one of the three shapes the engine understands.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AddressEntry {
    Bare(String),
    Keyed { value: String, primary: bool },
    /// An unrecognised entry kept in its serialised JSON form.
    Opaque(String),
}

impl AddressEntry {
    /// Resolves a raw entry. `null` entries resolve to `None`.
    pub fn resolve(raw: &RawAddressEntry) -> Option<Self> {
        match raw {
            RawAddressEntry::Bare(value) => Some(Self::Bare(value.clone())),
            RawAddressEntry::Keyed { value, is_primary } => Some(Self::Keyed {
                value: value.clone(),
                primary: is_primary.unwrap_or(false),
            }),
            RawAddressEntry::Other(serde_json::Value::Null) => None,
            RawAddressEntry::Other(other) => Some(Self::Opaque(other.to_string())),
        }
    }

    fn into_normalized(self) -> Option<NormalizedAddress> {
        let (value, primary) = match self {
            AddressEntry::Bare(value) | AddressEntry::Opaque(value) => (value, false),
            AddressEntry::Keyed { value, primary } => (value, primary),
        };
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(NormalizedAddress::new(value, primary))
    }
}

/// One alternate health address, ready for display and selection.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedAddress {
    pub value: String,
    pub display: String,
    pub primary: bool,
}

impl NormalizedAddress {
    fn new(value: &str, primary: bool) -> Self {
        let display = if primary {
            format!("{value} (primary)")
        } else {
            value.to_owned()
        };
        Self {
            value: value.to_owned(),
            display,
            primary,
        }
    }
}

/// Returns the patient's alternate health addresses, primary entries first.
///
/// The nested `healthAccount.alternateHealthAddresses` list is preferred when it is non-empty,
/// otherwise the top-level list is read. Entries that resolve to nothing or to blank text are
/// dropped. Duplicates in the source list are kept.
///
/// When `primaryHealthAddress` is set, entries with that value are marked primary; if no entry
/// has that value it is added as a primary entry.
///
/// Ordering: primary before non-primary, then by value. The sort is stable.
pub fn normalize_addresses(patient: &PatientRecord) -> Vec<NormalizedAddress> {
    let nested = patient
        .health_account
        .as_ref()
        .and_then(|account| account.alternate_health_addresses.as_deref())
        .filter(|list| !list.is_empty());
    let raw = nested
        .or(patient.alternate_health_addresses.as_deref())
        .unwrap_or_default();

    let mut addresses: Vec<NormalizedAddress> = raw
        .iter()
        .filter_map(AddressEntry::resolve)
        .filter_map(AddressEntry::into_normalized)
        .collect();

    if let Some(primary) = patient
        .primary_health_address
        .as_deref()
        .map(str::trim)
        .filter(|p| !p.is_empty())
    {
        let mut matched = false;
        for address in addresses.iter_mut().filter(|a| a.value == primary) {
            *address = NormalizedAddress::new(primary, true);
            matched = true;
        }
        if !matched {
            addresses.push(NormalizedAddress::new(primary, true));
        }
    }

    addresses.sort_by(|a, b| b.primary.cmp(&a.primary).then_with(|| a.value.cmp(&b.value)));
    addresses
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::HealthAccount;
    use serde_json::json;

    fn patient_with(list: serde_json::Value) -> PatientRecord {
        serde_json::from_value(json!({ "name": "Asha", "alternateHealthAddresses": list }))
            .expect("valid patient")
    }

    fn values(addresses: &[NormalizedAddress]) -> Vec<&str> {
        addresses.iter().map(|a| a.value.as_str()).collect()
    }

    #[test]
    fn primary_entries_come_first() {
        let patient = patient_with(json!([
            { "value": "a", "primary": false },
            { "value": "b", "primary": true }
        ]));

        assert_eq!(values(&normalize_addresses(&patient)), vec!["b", "a"]);
    }

    #[test]
    fn ties_are_broken_lexically() {
        let patient = patient_with(json!(["zeta@sbx", "alpha@sbx", { "value": "mid@sbx" }]));

        assert_eq!(
            values(&normalize_addresses(&patient)),
            vec!["alpha@sbx", "mid@sbx", "zeta@sbx"]
        );
    }

    #[test]
    fn null_and_blank_entries_are_dropped() {
        let patient = patient_with(json!([null, "", "   ", { "value": " " }, "kept@sbx"]));

        assert_eq!(values(&normalize_addresses(&patient)), vec!["kept@sbx"]);
    }

    #[test]
    fn unrecognised_objects_fall_back_to_json() {
        let patient = patient_with(json!([{ "handle": "x" }, 42]));
        let addresses = normalize_addresses(&patient);

        assert_eq!(values(&addresses), vec!["42", "{\"handle\":\"x\"}"]);
        assert!(addresses.iter().all(|a| !a.primary));
    }

    #[test]
    fn duplicates_are_preserved() {
        let patient = patient_with(json!(["dup@sbx", "dup@sbx"]));

        assert_eq!(normalize_addresses(&patient).len(), 2);
    }

    #[test]
    fn nested_list_wins_over_top_level() {
        let mut patient = patient_with(json!(["top@sbx"]));
        patient.health_account = Some(HealthAccount {
            alternate_health_addresses: Some(vec![RawAddressEntry::Bare("nested@sbx".into())]),
        });

        assert_eq!(values(&normalize_addresses(&patient)), vec!["nested@sbx"]);
    }

    #[test]
    fn empty_nested_list_falls_back_to_top_level() {
        let mut patient = patient_with(json!(["top@sbx"]));
        patient.health_account = Some(HealthAccount {
            alternate_health_addresses: Some(Vec::new()),
        });

        assert_eq!(values(&normalize_addresses(&patient)), vec!["top@sbx"]);
    }

    #[test]
    fn primary_health_address_marks_matching_entry() {
        let mut patient = patient_with(json!(["a@sbx", "b@sbx"]));
        patient.primary_health_address = Some("b@sbx".into());
        let addresses = normalize_addresses(&patient);

        assert_eq!(values(&addresses), vec!["b@sbx", "a@sbx"]);
        assert_eq!(addresses[0].display, "b@sbx (primary)");
    }

    #[test]
    fn primary_health_address_is_added_when_missing() {
        let mut patient = patient_with(json!(["a@sbx"]));
        patient.primary_health_address = Some("p@sbx".into());

        assert_eq!(values(&normalize_addresses(&patient)), vec!["p@sbx", "a@sbx"]);
    }

    #[test]
    fn no_list_yields_empty() {
        let patient = PatientRecord {
            name: "Asha".into(),
            ..Default::default()
        };

        assert!(normalize_addresses(&patient).is_empty());
    }
}
