//! Validated primitive text types shared across the invoice-record crates.

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("Text cannot be empty")]
    Empty,

    /// The input was not a `type/subtype` media type
    #[error("Invalid media type: {0}")]
    InvalidMimeType(String),
}

/// A string type that guarantees non-empty content.
///
/// The input is trimmed of leading and trailing whitespace during construction. Record builders
/// use this to decide whether an optional section is present at all: a blank form field never
/// becomes a `NonEmptyText`, so it never reaches the output.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText` from the given input.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::Empty`] if the trimmed input is empty.
    pub fn new(input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty);
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Lifts an optional, possibly blank form value.
    ///
    /// `None`, `""` and whitespace-only input all map to `None`.
    pub fn from_optional(input: Option<&str>) -> Option<Self> {
        input.and_then(|s| Self::new(s).ok())
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes the wrapper, returning the owned string.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new(&s).map_err(serde::de::Error::custom)
    }
}

/// A lower-cased `type/subtype` media type, parameters stripped.
///
/// `"Application/PDF; charset=binary"` becomes `"application/pdf"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MimeType(String);

impl MimeType {
    /// Media type used when nothing better is known about a payload.
    pub const OCTET_STREAM: &'static str = "application/octet-stream";

    pub const PDF: &'static str = "application/pdf";

    /// Parses and canonicalises a media type.
    ///
    /// # Errors
    ///
    /// Returns [`TextError::InvalidMimeType`] unless the input has exactly one `/` with a
    /// non-empty token on each side.
    pub fn parse(input: &str) -> Result<Self, TextError> {
        let essence = input.split(';').next().unwrap_or_default().trim();
        let valid = match essence.split_once('/') {
            Some((ty, sub)) => is_token(ty) && is_token(sub),
            None => false,
        };
        if !valid {
            return Err(TextError::InvalidMimeType(input.to_owned()));
        }
        Ok(Self(essence.to_ascii_lowercase()))
    }

    /// The generic binary media type.
    pub fn octet_stream() -> Self {
        Self(Self::OCTET_STREAM.to_owned())
    }

    pub fn pdf() -> Self {
        Self(Self::PDF.to_owned())
    }

    /// Returns the media type as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s
            .bytes()
            .all(|b| b.is_ascii_alphanumeric() || b"!#$&-^_.+".contains(&b))
}

impl std::fmt::Display for MimeType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for MimeType {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for MimeType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for MimeType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        MimeType::parse(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_empty_text_trims_input() {
        let text = NonEmptyText::new("  Apollo Clinic \n").expect("non-empty");
        assert_eq!(text.as_str(), "Apollo Clinic");
    }

    #[test]
    fn non_empty_text_rejects_whitespace() {
        assert!(matches!(NonEmptyText::new(" \t "), Err(TextError::Empty)));
    }

    #[test]
    fn from_optional_drops_blank_values() {
        assert_eq!(NonEmptyText::from_optional(None), None);
        assert_eq!(NonEmptyText::from_optional(Some("   ")), None);
        assert_eq!(
            NonEmptyText::from_optional(Some(" x ")).map(NonEmptyText::into_inner),
            Some("x".to_owned())
        );
    }

    #[test]
    fn deserialize_rejects_empty_string() {
        let err = serde_json::from_str::<NonEmptyText>("\"  \"").expect_err("should reject");
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn mime_type_strips_parameters_and_lowercases() {
        let mime = MimeType::parse("Application/PDF; charset=binary").expect("valid");
        assert_eq!(mime.as_str(), "application/pdf");
    }

    #[test]
    fn named_constructors_are_canonical() {
        assert_eq!(MimeType::pdf(), MimeType::parse(MimeType::PDF).expect("valid"));
        assert_eq!(
            MimeType::octet_stream(),
            MimeType::parse(MimeType::OCTET_STREAM).expect("valid")
        );
    }

    #[test]
    fn mime_type_accepts_vendor_subtypes() {
        let mime = MimeType::parse(
            "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
        )
        .expect("valid");
        assert!(mime.as_str().starts_with("application/vnd."));
    }

    #[test]
    fn mime_type_rejects_malformed() {
        for bad in ["", "pdf", "application/", "/pdf", "a/b/c", "text/ plain"] {
            assert!(MimeType::parse(bad).is_err(), "expected rejection of {bad:?}");
        }
    }
}
