//! Feature flags for optional engine behavior.

use serde::Deserialize;

/// Feature flags controlling optional engine behavior.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FeatureFlags {
    /// Anonymize detected PII in stored memory text before persistence.
    pub pii_anonymization: bool,
}

impl FeatureFlags {
    /// Creates feature flags with all features disabled.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            pii_anonymization: false,
        }
    }

    /// Creates the default flag set: PII anonymization on (§6 default).
    #[must_use]
    pub const fn defaults() -> Self {
        Self {
            pii_anonymization: true,
        }
    }
}
