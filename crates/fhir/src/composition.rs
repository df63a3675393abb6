//! Root record of an invoice document.

use crate::datatypes::{CodeableConcept, DomainResource, Identifier, Narrative, Reference};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CompositionStatus {
    Preliminary,
    Final,
    Amended,
    EnteredInError,
}

/// The way a party attests to a document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttestationMode {
    Personal,
    Professional,
    Legal,
    Official,
}

impl AttestationMode {
    /// Parses a mode code case-insensitively.
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "personal" => Some(Self::Personal),
            "professional" => Some(Self::Professional),
            "legal" => Some(Self::Legal),
            "official" => Some(Self::Official),
            _ => None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompositionAttester {
    pub mode: AttestationMode,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub time: Option<String>,

    pub party: Reference,
}

/// A section of the document: either a list of entries or inline text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    pub title: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,

    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub entry: Vec<Reference>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Composition {
    #[serde(flatten)]
    pub base: DomainResource,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<Identifier>,

    pub status: CompositionStatus,

    #[serde(rename = "type")]
    pub type_: CodeableConcept,

    pub subject: Reference,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub encounter: Option<Reference>,

    pub date: String,

    pub author: Vec<Reference>,

    pub title: String,

    pub attester: Vec<CompositionAttester>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custodian: Option<Reference>,

    pub section: Vec<Section>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attestation_mode_parses_case_insensitively() {
        assert_eq!(
            AttestationMode::parse(" Legal "),
            Some(AttestationMode::Legal)
        );
        assert_eq!(
            AttestationMode::parse("PROFESSIONAL"),
            Some(AttestationMode::Professional)
        );
        assert_eq!(AttestationMode::parse("notarised"), None);
    }
}
