//! Implementation of the content-addressing identifier.

use crate::{IdError, IdResult};
use std::{fmt, str::FromStr};

use ::uuid::Uuid;

/// Prefix shared by every bundle entry locator and every embedded reference.
pub const LOCATOR_PREFIX: &str = "urn:uuid:";

/// Canonical random identifier for a record in an invoice bundle.
///
/// Once constructed the identifier is guaranteed to be a version-4 UUID and always displays in
/// lowercase hyphenated form.
///
/// # Construction
/// - [`ResourceId::new`] generates a fresh identifier from the OS random source.
/// - [`ResourceId::parse`] validates an externally supplied identifier strictly.
/// - [`ResourceId::coerce`] accepts an optional candidate and never fails.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId(Uuid);

impl Default for ResourceId {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceId {
    /// Generates a new random identifier.
    ///
    /// `Uuid::new_v4` draws from the operating system's cryptographically secure generator.
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Validates and parses an identifier in the canonical pattern.
    ///
    /// Upper-case hex digits are accepted and canonicalised. Braced, URN-prefixed or
    /// hyphen-less forms are rejected, as are UUIDs of any version other than 4.
    ///
    /// # Errors
    ///
    /// Returns [`IdError::InvalidInput`] if `input` does not match the pattern.
    pub fn parse(input: &str) -> IdResult<Self> {
        if !Self::is_canonical(input) {
            return Err(IdError::InvalidInput(format!(
                "expected 8-4-4-4-12 hex identifier with version 4, got: '{input}'"
            )));
        }
        Uuid::parse_str(input)
            .map(Self)
            .map_err(|e| IdError::InvalidInput(format!("'{input}': {e}")))
    }

    /// Returns the candidate as an identifier when it is valid, otherwise a fresh one.
    ///
    /// Surrounding whitespace is ignored. This is the total form used by the record builders:
    /// a malformed or missing external identifier silently becomes a generated one.
    pub fn coerce(candidate: Option<&str>) -> Self {
        candidate
            .map(str::trim)
            .and_then(|c| Self::parse(c).ok())
            .unwrap_or_default()
    }

    /// Returns true if `input` matches the canonical pattern (case-insensitive).
    ///
    /// This is a purely syntactic check:
    /// - exactly 36 bytes, hyphens at offsets 8, 13, 18 and 23
    /// - hex digits everywhere else
    /// - `4` at offset 14 and one of `89ab` at offset 19
    pub fn is_canonical(input: &str) -> bool {
        let bytes = input.as_bytes();
        if bytes.len() != 36 {
            return false;
        }

        bytes.iter().enumerate().all(|(i, b)| match i {
            8 | 13 | 18 | 23 => *b == b'-',
            14 => *b == b'4',
            19 => matches!(b.to_ascii_lowercase(), b'8' | b'9' | b'a' | b'b'),
            _ => b.is_ascii_hexdigit(),
        })
    }

    /// Returns the content-addressed locator for this identifier (`urn:uuid:<id>`).
    pub fn locator(&self) -> String {
        format!("{LOCATOR_PREFIX}{self}")
    }

    /// Extracts the identifier from a locator produced by [`ResourceId::locator`].
    ///
    /// Returns `None` when the prefix is missing or the remainder is not canonical.
    pub fn from_locator(locator: &str) -> Option<Self> {
        locator
            .strip_prefix(LOCATOR_PREFIX)
            .and_then(|rest| Self::parse(rest).ok())
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

impl FromStr for ResourceId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ResourceId::parse(s)
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for ResourceId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for ResourceId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        ResourceId::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_generates_canonical_identifier() {
        let id = ResourceId::new();
        let rendered = id.to_string();

        assert_eq!(rendered.len(), 36);
        assert!(ResourceId::is_canonical(&rendered));
        assert_eq!(rendered, rendered.to_lowercase());
    }

    #[test]
    fn test_new_identifiers_differ() {
        assert_ne!(ResourceId::new(), ResourceId::new());
    }

    #[test]
    fn test_parse_valid_identifier() {
        let input = "550e8400-e29b-41d4-a716-446655440000";
        let id = ResourceId::parse(input).expect("should parse");

        assert_eq!(id.to_string(), input);
    }

    #[test]
    fn test_parse_lowercases_uppercase_input() {
        let id = ResourceId::parse("550E8400-E29B-41D4-A716-446655440000").expect("should parse");

        assert_eq!(id.to_string(), "550e8400-e29b-41d4-a716-446655440000");
    }

    #[test]
    fn test_parse_rejects_simple_form() {
        let result = ResourceId::parse("550e8400e29b41d4a716446655440000");

        match result {
            Err(IdError::InvalidInput(msg)) => assert!(msg.contains("8-4-4-4-12")),
            other => panic!("expected InvalidInput error, got {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_wrong_version_nibble() {
        assert!(ResourceId::parse("550e8400-e29b-11d4-a716-446655440000").is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_variant_nibble() {
        assert!(ResourceId::parse("550e8400-e29b-41d4-c716-446655440000").is_err());
    }

    #[test]
    fn test_is_canonical_rejects_non_hex() {
        assert!(!ResourceId::is_canonical("550e8400-e29b-41d4-a716-44665544000g"));
        assert!(!ResourceId::is_canonical(""));
        assert!(!ResourceId::is_canonical("{550e8400-e29b-41d4-a716-446655440000}"));
    }

    #[test]
    fn test_coerce_keeps_valid_candidate_lowercased() {
        let id = ResourceId::coerce(Some(" 7F4C2E9D-4B0A-4F3A-9A2C-0E9A6B5D1C88 "));

        assert_eq!(id.to_string(), "7f4c2e9d-4b0a-4f3a-9a2c-0e9a6b5d1c88");
    }

    #[test]
    fn test_coerce_replaces_malformed_candidate() {
        let id = ResourceId::coerce(Some("PAT-00042"));

        assert!(ResourceId::is_canonical(&id.to_string()));
        assert_ne!(id.to_string(), "PAT-00042");
    }

    #[test]
    fn test_coerce_generates_when_absent() {
        let id = ResourceId::coerce(None);

        assert!(ResourceId::is_canonical(&id.to_string()));
    }

    #[test]
    fn test_locator_round_trip() {
        let id = ResourceId::new();
        let locator = id.locator();

        assert!(locator.starts_with(LOCATOR_PREFIX));
        assert_eq!(ResourceId::from_locator(&locator), Some(id));
        assert_eq!(ResourceId::from_locator("Patient/123"), None);
    }

    #[test]
    fn test_serde_uses_hyphenated_string() {
        let id = ResourceId::parse("a4f91c6d-3b2e-4c5f-9d7a-1e8b6c0a9f12").expect("valid");
        let json = serde_json::to_string(&id).expect("serialise");

        assert_eq!(json, "\"a4f91c6d-3b2e-4c5f-9d7a-1e8b6c0a9f12\"");
        let back: ResourceId = serde_json::from_str(&json).expect("deserialise");
        assert_eq!(back, id);
    }
}
