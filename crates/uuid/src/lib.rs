//! Resource identifier utilities.
//!
//! Every record placed in an invoice document bundle is addressed by a random UUID. Entries in
//! the bundle are located by `urn:uuid:<id>` and every cross-record reference uses the same
//! form, so the identifier *is* the address.
//!
//! This crate provides:
//! - [`ResourceId`], a wrapper that guarantees the canonical identifier form once constructed.
//! - [`LOCATOR_PREFIX`], the fixed prefix used for bundle locators and references.
//!
//! ## Canonical form
//! - Length: 36, grouped 8-4-4-4-12 with hyphens
//! - Characters: `0-9` and `a-f` (lowercase once canonicalised)
//! - Version nibble (position 14): `4`
//! - Variant nibble (position 19): one of `8`, `9`, `a`, `b`
//! - Example: `550e8400-e29b-41d4-a716-446655440000`
//!
//! Externally supplied identifiers (a patient directory's reference id, a practitioner id from
//! configuration) are accepted case-insensitively and lower-cased. Anything that does not match
//! the pattern is replaced by a fresh identifier via [`ResourceId::coerce`].

mod resource_id;

pub use resource_id::{ResourceId, LOCATOR_PREFIX};

/// Error type for identifier operations.
#[derive(Debug, thiserror::Error)]
pub enum IdError {
    /// Input does not match the canonical identifier pattern
    #[error("Invalid identifier: {0}")]
    InvalidInput(String),
}

/// Result type for identifier operations.
pub type IdResult<T> = Result<T, IdError>;
