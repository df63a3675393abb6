//! The document envelope.
//!
//! A bundle exclusively owns its entries. Each entry's `fullUrl` is the content-addressed
//! locator of the record it carries (`urn:uuid:<record id>`), which is what lets every other
//! record refer to it without positional lookup.

use crate::datatypes::{Identifier, Meta};
use crate::{FhirError, FhirResult, Resource};
use invrec_uuid::LOCATOR_PREFIX;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// Purpose of a bundle.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BundleType {
    Document,
    Collection,
}

/// One located record inside a bundle.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BundleEntry {
    pub full_url: String,
    pub resource: Resource,
}

impl BundleEntry {
    /// Wraps a record, deriving its locator from the record's own identifier.
    pub fn locate(resource: Resource) -> Self {
        Self {
            full_url: format!("{LOCATOR_PREFIX}{}", resource.id()),
            resource,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bundle {
    #[serde(default = "default_resource_type")]
    pub resource_type: String,

    pub id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<Meta>,

    pub identifier: Identifier,

    #[serde(rename = "type")]
    pub type_: BundleType,

    pub timestamp: String,

    pub entry: Vec<BundleEntry>,
}

fn default_resource_type() -> String {
    "Bundle".to_string()
}

impl Bundle {
    /// Parse a bundle from JSON text.
    ///
    /// Schema mismatches are reported with the path of the failing field (for example
    /// `entry[3].resource.lineItem[0].sequence`).
    ///
    /// # Errors
    ///
    /// Returns [`FhirError`] if:
    /// - the JSON does not match the bundle schema,
    /// - `resourceType` is not `"Bundle"`,
    /// - any entry's `fullUrl` differs from its record's locator.
    pub fn parse(json_text: &str) -> FhirResult<Bundle> {
        let mut deserializer = serde_json::Deserializer::from_str(json_text);

        let bundle: Bundle = match serde_path_to_error::deserialize(&mut deserializer) {
            Ok(parsed) => parsed,
            Err(err) => {
                let path = err.path().to_string();
                let source = err.into_inner();
                let path = if path.is_empty() || path == "." {
                    "<root>"
                } else {
                    path.as_str()
                };
                return Err(FhirError::Translation(format!(
                    "Bundle schema mismatch at {path}: {source}"
                )));
            }
        };

        if bundle.resource_type != "Bundle" {
            return Err(FhirError::InvalidInput(format!(
                "Expected resourceType 'Bundle', got '{}'",
                bundle.resource_type
            )));
        }

        if let Some(entry) = bundle.mislocated_entries().first() {
            return Err(FhirError::InvalidInput(format!(
                "entry fullUrl '{}' does not match {} id '{}'",
                entry.full_url,
                entry.resource.resource_type(),
                entry.resource.id()
            )));
        }

        Ok(bundle)
    }

    /// Render the bundle as pretty-printed JSON.
    pub fn render(&self) -> FhirResult<String> {
        serde_json::to_string_pretty(self)
            .map_err(|e| FhirError::Translation(format!("Failed to serialise bundle: {e}")))
    }

    /// Entries whose `fullUrl` is not `urn:uuid:<record id>`.
    pub fn mislocated_entries(&self) -> Vec<&BundleEntry> {
        self.entry
            .iter()
            .filter(|e| {
                e.full_url
                    .strip_prefix(LOCATOR_PREFIX)
                    .map_or(true, |id| id != e.resource.id())
            })
            .collect()
    }

    /// Locators of every entry, for reference resolution.
    pub fn locators(&self) -> HashSet<&str> {
        self.entry.iter().map(|e| e.full_url.as_str()).collect()
    }

    /// Records of one kind, in entry order.
    pub fn resources_of_type<'a>(
        &'a self,
        resource_type: &'a str,
    ) -> impl Iterator<Item = &'a Resource> + 'a {
        self.entry
            .iter()
            .map(|e| &e.resource)
            .filter(move |r| r.resource_type() == resource_type)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Binary, ResourceId};

    fn binary(id: &ResourceId) -> Resource {
        Resource::Binary(Binary {
            id: id.to_string(),
            meta: None,
            content_type: "text/plain".into(),
            data: "aGVsbG8=".into(),
        })
    }

    fn bundle_with(entry: Vec<BundleEntry>) -> Bundle {
        Bundle {
            resource_type: "Bundle".into(),
            id: ResourceId::new().to_string(),
            meta: None,
            identifier: Identifier::new("urn:ietf:rfc:3986", ResourceId::new().locator()),
            type_: BundleType::Document,
            timestamp: "2024-01-01T10:00:00+05:30".into(),
            entry,
        }
    }

    #[test]
    fn locate_derives_full_url_from_id() {
        let id = ResourceId::new();
        let entry = BundleEntry::locate(binary(&id));

        assert_eq!(entry.full_url, id.locator());
    }

    #[test]
    fn render_then_parse_preserves_bundle() {
        let bundle = bundle_with(vec![BundleEntry::locate(binary(&ResourceId::new()))]);
        let text = bundle.render().expect("render");

        assert!(text.contains("\"resourceType\": \"Binary\""));
        let parsed = Bundle::parse(&text).expect("parse");
        assert_eq!(parsed, bundle);
    }

    #[test]
    fn parse_rejects_mislocated_entry() {
        let mut entry = BundleEntry::locate(binary(&ResourceId::new()));
        entry.full_url = ResourceId::new().locator();
        let text = bundle_with(vec![entry]).render().expect("render");

        let err = Bundle::parse(&text).expect_err("should reject");
        match err {
            FhirError::InvalidInput(msg) => assert!(msg.contains("does not match Binary")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn parse_reports_field_path() {
        let text = r#"{
            "resourceType": "Bundle",
            "id": "x",
            "identifier": { "value": "urn:uuid:x" },
            "type": "document",
            "timestamp": 42,
            "entry": []
        }"#;

        let err = Bundle::parse(text).expect_err("should reject");
        match err {
            FhirError::Translation(msg) => assert!(msg.contains("timestamp")),
            other => panic!("expected Translation error, got {other:?}"),
        }
    }

    #[test]
    fn parse_rejects_other_resource_types() {
        let text = r#"{
            "resourceType": "Patient",
            "id": "x",
            "identifier": { "value": "urn:uuid:x" },
            "type": "document",
            "timestamp": "2024-01-01T00:00:00+00:00",
            "entry": []
        }"#;

        assert!(matches!(
            Bundle::parse(text),
            Err(FhirError::InvalidInput(_))
        ));
    }
}
