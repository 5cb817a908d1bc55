//! A deterministic, dependency-free embedder stand-in.
//!
//! Not a real semantic model: it hashes whitespace tokens into a
//! fixed-width bag-of-hashes vector so the rest of the engine (scoring,
//! classification, gates) has something deterministic to exercise in tests
//! and in keyword-only deployments, without pulling in an ML runtime for a
//! collaborator the engine treats as out-of-scope.
#![allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]

use super::Embedder;
use crate::Result;
use sha2::{Digest, Sha256};

/// Default vector width.
const DEFAULT_DIMENSIONS: usize = 64;

/// A deterministic hash-based embedder.
#[derive(Clone, Copy)]
pub struct DeterministicEmbedder {
    dimensions: usize,
}

impl DeterministicEmbedder {
    /// Creates an embedder with the default dimensionality.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            dimensions: DEFAULT_DIMENSIONS,
        }
    }

    /// Creates an embedder with a custom dimensionality.
    #[must_use]
    pub const fn with_dimensions(dimensions: usize) -> Self {
        Self { dimensions }
    }
}

impl Default for DeterministicEmbedder {
    fn default() -> Self {
        Self::new()
    }
}

impl Embedder for DeterministicEmbedder {
    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        "deterministic-hash-v1"
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let mut vector = vec![0.0_f32; self.dimensions];

        for token in text.to_lowercase().split_whitespace() {
            let mut hasher = Sha256::new();
            hasher.update(token.as_bytes());
            let digest = hasher.finalize();

            let bucket = (u32::from_le_bytes([digest[0], digest[1], digest[2], digest[3]]) as usize)
                % self.dimensions;
            let sign = if digest[4] % 2 == 0 { 1.0 } else { -1.0 };
            vector[bucket] += sign;
        }

        let norm: f32 = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }

        Ok(vector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embed_is_deterministic() {
        let embedder = DeterministicEmbedder::new();
        assert_eq!(embedder.embed("I work at Acme").unwrap(), embedder.embed("I work at Acme").unwrap());
    }

    #[test]
    fn embed_has_configured_dimensions() {
        let embedder = DeterministicEmbedder::with_dimensions(16);
        assert_eq!(embedder.embed("hello world").unwrap().len(), 16);
    }

    #[test]
    fn different_text_yields_different_vectors() {
        let embedder = DeterministicEmbedder::new();
        assert_ne!(embedder.embed("I work at Acme").unwrap(), embedder.embed("I live in Denver").unwrap());
    }
}
