//! Regex-based PII detection and anonymization.
//!
//! Applied to a memory's `text` before persistence when
//! `FeatureFlags::pii_anonymization` is on (§6 default: on). Extracted
//! `slot`/`value` pairs are left untouched — a redacted employer or name
//! would defeat the point of storing the fact — only the verbatim
//! utterance text is anonymized.

use regex::Regex;
use std::sync::LazyLock;

/// The kind of PII a pattern matched.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PiiKind {
    /// An email address.
    Email,
    /// A phone number (loose, international-ish format).
    Phone,
    /// A US Social Security Number-shaped sequence.
    Ssn,
    /// A sequence that looks like a payment card number.
    CreditCard,
}

impl PiiKind {
    const fn placeholder(self) -> &'static str {
        match self {
            Self::Email => "[REDACTED_EMAIL]",
            Self::Phone => "[REDACTED_PHONE]",
            Self::Ssn => "[REDACTED_SSN]",
            Self::CreditCard => "[REDACTED_CARD]",
        }
    }
}

/// One detected PII span.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PiiMatch {
    /// The kind of PII detected.
    pub kind: PiiKind,
    /// Byte offset range in the original text.
    pub start: usize,
    /// Byte offset range in the original text.
    pub end: usize,
}

#[allow(clippy::expect_used)]
static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("static regex: email"));

#[allow(clippy::expect_used)]
static PHONE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\+?\d{1,3}?[-. ]?\(?\d{3}\)?[-. ]\d{3}[-. ]\d{4}\b").expect("static regex: phone"));

#[allow(clippy::expect_used)]
static SSN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").expect("static regex: ssn"));

#[allow(clippy::expect_used)]
static CREDIT_CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").expect("static regex: credit card"));

/// Finds every PII span in `text`, in document order.
#[must_use]
pub fn detect(text: &str) -> Vec<PiiMatch> {
    let mut matches: Vec<PiiMatch> = Vec::new();

    for (kind, regex) in [
        (PiiKind::Email, &*EMAIL),
        (PiiKind::Ssn, &*SSN),
        (PiiKind::Phone, &*PHONE),
        (PiiKind::CreditCard, &*CREDIT_CARD),
    ] {
        for m in regex.find_iter(text) {
            matches.push(PiiMatch {
                kind,
                start: m.start(),
                end: m.end(),
            });
        }
    }

    matches.sort_by_key(|m| m.start);
    matches
}

/// Replaces every detected PII span with a kind-specific placeholder.
///
/// Overlapping matches (e.g. a phone-shaped substring inside a longer
/// credit-card match) keep only the first span encountered in document
/// order; later overlapping spans are skipped.
#[must_use]
pub fn anonymize(text: &str) -> String {
    let matches = detect(text);
    let mut out = String::with_capacity(text.len());
    let mut cursor = 0usize;

    for m in matches {
        if m.start < cursor {
            continue;
        }
        out.push_str(&text[cursor..m.start]);
        out.push_str(m.kind.placeholder());
        cursor = m.end;
    }
    out.push_str(&text[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redacts_email() {
        let out = anonymize("reach me at sarah@example.com please");
        assert_eq!(out, "reach me at [REDACTED_EMAIL] please");
    }

    #[test]
    fn redacts_ssn() {
        let out = anonymize("my ssn is 123-45-6789 ok");
        assert_eq!(out, "my ssn is [REDACTED_SSN] ok");
    }

    #[test]
    fn redacts_phone() {
        let out = anonymize("call 555-123-4567 tomorrow");
        assert_eq!(out, "call [REDACTED_PHONE] tomorrow");
    }

    #[test]
    fn leaves_plain_text_untouched() {
        assert_eq!(anonymize("I work at Amazon"), "I work at Amazon");
    }

    #[test]
    fn non_overlapping_matches_both_redacted() {
        let out = anonymize("email a@b.com or call 555-123-4567");
        assert!(out.contains("[REDACTED_EMAIL]"));
        assert!(out.contains("[REDACTED_PHONE]"));
    }
}
