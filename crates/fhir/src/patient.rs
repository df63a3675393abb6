//! Subject of the invoice.

use crate::datatypes::{Address, ContactPoint, DomainResource, HumanName, Identifier};
use serde::{Deserialize, Serialize};

/// Administrative gender of a patient.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdministrativeGender {
    Male,
    Female,
    Other,
    Unknown,
}

impl AdministrativeGender {
    /// Maps free-form directory values (`"M"`, `"Female"`, `"T"`...) onto the FHIR code set.
    ///
    /// Blank input yields `None` so the field is omitted entirely. Anything non-blank that is
    /// not recognised becomes [`AdministrativeGender::Unknown`].
    pub fn from_free_text(input: &str) -> Option<Self> {
        let normalised = input.trim().to_ascii_lowercase();
        let gender = match normalised.as_str() {
            "" => return None,
            "m" | "male" | "man" => Self::Male,
            "f" | "female" | "woman" => Self::Female,
            "o" | "other" | "t" | "transgender" => Self::Other,
            _ => Self::Unknown,
        };
        Some(gender)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Patient {
    #[serde(flatten)]
    pub base: DomainResource,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub identifier: Vec<Identifier>,

    pub name: Vec<HumanName>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<AdministrativeGender>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub telecom: Vec<ContactPoint>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub address: Vec<Address>,
}
