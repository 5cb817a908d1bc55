//! Ambient security concerns carried regardless of feature scope (§9A):
//! PII anonymization applied to stored memory text when
//! [`crate::config::FeatureFlags::pii_anonymization`] is enabled.

mod pii;

pub use pii::{anonymize, PiiMatch, PiiKind};
