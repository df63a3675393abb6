//! Shared FHIR data types used across record kinds.
//!
//! Only the subset of each data type that the invoice document actually emits is modelled.
//! Optional fields are skipped on serialisation so that an absent value never appears as
//! `null` or an empty array in the output.

use invrec_uuid::ResourceId;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Resource metadata.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub profile: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
}

impl Meta {
    /// Metadata carrying a single profile claim, or `None` when no profile is given.
    pub fn with_profile(profile: Option<&str>) -> Option<Self> {
        profile.map(|p| Self {
            profile: vec![p.to_owned()],
            last_updated: None,
        })
    }
}

/// Human-readable summary of a resource.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Narrative {
    pub status: String,
    pub div: String,
}

impl Narrative {
    /// Builds a generated narrative whose XHTML root declares `language`.
    ///
    /// `text` is escaped; line breaks become `<br/>`.
    pub fn generated(language: &str, text: &str) -> Self {
        let lang = html_escape::encode_double_quoted_attribute(language);
        let body = text
            .lines()
            .map(|line| html_escape::encode_text(line).into_owned())
            .collect::<Vec<_>>()
            .join("<br/>");
        Self {
            status: "generated".into(),
            div: format!(
                "<div xmlns=\"http://www.w3.org/1999/xhtml\" lang=\"{lang}\" xml:lang=\"{lang}\">{body}</div>"
            ),
        }
    }

    /// Returns the language declared on the narrative root, if any.
    pub fn declared_language(&self) -> Option<&str> {
        let start = self.div.find(" lang=\"")? + " lang=\"".len();
        let rest = &self.div[start..];
        rest.find('"').map(|end| &rest[..end])
    }
}

/// Fields shared by every record kind that carries a narrative.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DomainResource {
    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<Narrative>,
}

impl DomainResource {
    /// Base fields for a record with identifier `id` declared in `language`.
    pub fn new(id: &ResourceId, language: &str, profile: Option<&str>, summary: &str) -> Self {
        Self {
            id: id.to_string(),
            meta: Meta::with_profile(profile),
            language: Some(language.to_owned()),
            text: Some(Narrative::generated(language, summary)),
        }
    }
}

/// A code defined by a terminology system.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coding {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Coding {
    pub fn new(system: &str, code: &str, display: &str) -> Self {
        Self {
            system: Some(system.to_owned()),
            code: Some(code.to_owned()),
            display: Some(display.to_owned()),
        }
    }
}

/// A concept that may be defined by one or more codings and/or free text.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodeableConcept {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coding: Vec<Coding>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl CodeableConcept {
    pub fn coded(coding: Coding) -> Self {
        let text = coding.display.clone();
        Self {
            coding: vec![coding],
            text,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            coding: Vec::new(),
            text: Some(text.into()),
        }
    }
}

/// A business identifier.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identifier {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub type_: Option<CodeableConcept>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    pub value: String,
}

impl Identifier {
    pub fn new(system: &str, value: impl Into<String>) -> Self {
        Self {
            type_: None,
            system: Some(system.to_owned()),
            value: value.into(),
        }
    }

    pub fn typed(mut self, type_: CodeableConcept) -> Self {
        self.type_ = Some(type_);
        self
    }
}

/// A content-addressed reference to another record in the same bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reference {
    pub reference: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display: Option<String>,
}

impl Reference {
    /// Reference to the record with identifier `id` (`urn:uuid:<id>`).
    pub fn to(id: &ResourceId) -> Self {
        Self {
            reference: id.locator(),
            display: None,
        }
    }

    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

/// A name of a human or organisation, carried as free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HumanName {
    pub text: String,
}

/// Telecom system of a [`ContactPoint`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContactPointSystem {
    Phone,
    Email,
    Url,
}

/// Details of a technology-mediated contact point.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContactPoint {
    pub system: ContactPointSystem,
    pub value: String,

    #[serde(rename = "use", default, skip_serializing_if = "Option::is_none")]
    pub use_: Option<String>,
}

/// A postal address, carried as free text.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    pub text: String,
}

/// An amount of money in a given currency.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Money {
    #[serde(with = "rust_decimal::serde::float")]
    pub value: Decimal,
    pub currency: String,
}

impl Money {
    pub fn new(value: Decimal, currency: &str) -> Self {
        Self {
            value,
            currency: currency.to_owned(),
        }
    }
}

/// A time period defined by a start and optional end.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end: Option<String>,
}

/// Content in a format defined elsewhere, referenced by URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attachment {
    pub content_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,

    pub title: String,
    pub url: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub creation: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn narrative_declares_language_and_escapes_text() {
        let narrative = Narrative::generated("en-IN", "Invoice <draft> & notes\nline two");

        assert_eq!(narrative.status, "generated");
        assert_eq!(narrative.declared_language(), Some("en-IN"));
        assert!(narrative.div.contains("xml:lang=\"en-IN\""));
        assert!(narrative.div.contains("Invoice &lt;draft&gt; &amp; notes<br/>line two"));
    }

    #[test]
    fn reference_points_at_locator() {
        let id = ResourceId::new();
        let reference = Reference::to(&id);

        assert_eq!(reference.reference, format!("urn:uuid:{id}"));
    }

    #[test]
    fn optional_fields_are_omitted() {
        let coding = Coding {
            system: None,
            code: Some("AMB".into()),
            display: None,
        };
        let value = serde_json::to_value(&coding).expect("serialise");

        assert_eq!(value, json!({ "code": "AMB" }));
    }

    #[test]
    fn meta_without_profile_is_none() {
        assert_eq!(Meta::with_profile(None), None);
    }

    #[test]
    fn money_serialises_as_number() {
        let money = Money::new(Decimal::new(125050, 2), "INR");
        let value = serde_json::to_value(&money).expect("serialise");

        assert_eq!(value["value"], json!(1250.5));
        assert_eq!(value["currency"], "INR");
    }
}
