//! Engine configuration.
//!
//! Everything the engine would otherwise read from ambient process state (practitioner
//! identity, feature toggles, identifier systems) is resolved once at startup into an
//! [`EngineConfig`] and passed into [`crate::InvoiceBundleEngine`]. No environment variable is
//! read during a build.

use crate::constants::{
    DEFAULT_CURRENCY, DEFAULT_LANGUAGE, FACILITY_SYSTEM, HEALTH_ADDRESS_SYSTEM,
    INVOICE_NUMBER_SYSTEM, MEDICAL_RECORD_SYSTEM, PRACTITIONER_LICENSE_SYSTEM,
};
use crate::input::PractitionerRecord;
use crate::{EngineError, EngineResult};

/// Which optional record panels the engine emits.
///
/// A disabled panel is never emitted, even when the form supplies data for it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FeatureFlags {
    pub include_organization_panel: bool,
    pub include_encounter: bool,
    pub include_attester: bool,
}

impl Default for FeatureFlags {
    fn default() -> Self {
        Self {
            include_organization_panel: true,
            include_encounter: true,
            include_attester: true,
        }
    }
}

/// Identifier systems stamped on business identifiers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentifierSystems {
    pub health_address: String,
    pub medical_record: String,
    pub practitioner_license: String,
    pub facility: String,
    pub invoice_number: String,
}

impl Default for IdentifierSystems {
    fn default() -> Self {
        Self {
            health_address: HEALTH_ADDRESS_SYSTEM.into(),
            medical_record: MEDICAL_RECORD_SYSTEM.into(),
            practitioner_license: PRACTITIONER_LICENSE_SYSTEM.into(),
            facility: FACILITY_SYSTEM.into(),
            invoice_number: INVOICE_NUMBER_SYSTEM.into(),
        }
    }
}

/// Engine configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct EngineConfig {
    practitioner: PractitionerRecord,
    features: FeatureFlags,
    language: String,
    currency: String,
    systems: IdentifierSystems,
    attach_profiles: bool,
}

impl EngineConfig {
    /// Create a new `EngineConfig` with default features, language and currency.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConfig`] if the practitioner has no display name or no
    /// license value.
    pub fn new(practitioner: PractitionerRecord) -> EngineResult<Self> {
        if practitioner.display_name.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "practitioner display name cannot be empty".into(),
            ));
        }
        if practitioner.license_value.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "practitioner license value cannot be empty".into(),
            ));
        }

        Ok(Self {
            practitioner,
            features: FeatureFlags::default(),
            language: DEFAULT_LANGUAGE.into(),
            currency: DEFAULT_CURRENCY.into(),
            systems: IdentifierSystems::default(),
            attach_profiles: true,
        })
    }

    pub fn with_features(mut self, features: FeatureFlags) -> Self {
        self.features = features;
        self
    }

    /// Sets the BCP 47 language tag declared on every record.
    pub fn with_language(mut self, language: &str) -> EngineResult<Self> {
        let language = language.trim();
        let valid = !language.is_empty()
            && language
                .split('-')
                .all(|part| !part.is_empty() && part.bytes().all(|b| b.is_ascii_alphanumeric()));
        if !valid {
            return Err(EngineError::InvalidConfig(format!(
                "invalid language tag '{language}'"
            )));
        }
        self.language = language.to_owned();
        Ok(self)
    }

    /// Sets the ISO 4217 currency code used for money amounts.
    pub fn with_currency(mut self, currency: &str) -> EngineResult<Self> {
        let currency = currency.trim();
        if currency.len() != 3 || !currency.bytes().all(|b| b.is_ascii_alphabetic()) {
            return Err(EngineError::InvalidConfig(format!(
                "currency must be a 3-letter ISO 4217 code, got '{currency}'"
            )));
        }
        self.currency = currency.to_ascii_uppercase();
        Ok(self)
    }

    pub fn with_identifier_systems(mut self, systems: IdentifierSystems) -> Self {
        self.systems = systems;
        self
    }

    /// Whether records claim their profile URL in `meta.profile`.
    pub fn with_profiles(mut self, attach_profiles: bool) -> Self {
        self.attach_profiles = attach_profiles;
        self
    }

    pub fn practitioner(&self) -> &PractitionerRecord {
        &self.practitioner
    }

    pub fn features(&self) -> FeatureFlags {
        self.features
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn systems(&self) -> &IdentifierSystems {
        &self.systems
    }

    pub fn attach_profiles(&self) -> bool {
        self.attach_profiles
    }
}

/// Parse a boolean toggle from an optional environment value.
///
/// `None` or blank yields `default`.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] for anything other than
/// `1/0`, `true/false`, `yes/no`, `on/off` (case-insensitive).
pub fn flag_from_env_value(value: Option<String>, default: bool) -> EngineResult<bool> {
    let Some(value) = value.map(|v| v.trim().to_ascii_lowercase()).filter(|v| !v.is_empty())
    else {
        return Ok(default);
    };

    match value.as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(EngineError::InvalidConfig(format!(
            "expected a boolean toggle, got '{other}'"
        ))),
    }
}

/// Build the practitioner identity from optional environment values.
///
/// # Errors
///
/// Returns [`EngineError::InvalidConfig`] if the name or license is missing.
pub fn practitioner_from_env_values(
    id: Option<String>,
    display_name: Option<String>,
    license_value: Option<String>,
) -> EngineResult<PractitionerRecord> {
    let display_name = display_name
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EngineError::InvalidConfig("practitioner name is not set".into()))?;
    let license_value = license_value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .ok_or_else(|| EngineError::InvalidConfig("practitioner license is not set".into()))?;

    Ok(PractitionerRecord {
        id: id.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()),
        display_name,
        license_value,
    })
}
