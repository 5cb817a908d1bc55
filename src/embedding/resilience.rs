//! Timeout and single-retry wrapper for the embedder collaborator.
//!
//! Lighter than the full circuit breaker a high-throughput product would
//! carry: the engine calls the embedder once per turn at most, so there is
//! no call volume to trip a breaker on. A bare timeout plus one retry
//! covers the transient-failure error kind (§7) without that machinery.

use super::Embedder;
use crate::{Error, Result};
use std::sync::mpsc;
use std::time::Duration;

/// Wraps an [`Embedder`] with a per-call timeout and one local retry.
pub struct ResilientEmbedder<E> {
    inner: E,
    timeout: Duration,
}

impl<E: Embedder + 'static> ResilientEmbedder<E> {
    /// Wraps `inner` with the given per-call timeout.
    #[must_use]
    pub const fn new(inner: E, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<E> Embedder for ResilientEmbedder<E>
where
    E: Embedder + Clone + Send + Sync + 'static,
{
    fn dimensions(&self) -> usize {
        self.inner.dimensions()
    }

    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>> {
        match call_with_timeout(&self.inner, text, self.timeout) {
            Ok(vector) => Ok(vector),
            Err(_) => call_with_timeout(&self.inner, text, self.timeout).map_err(|cause| Error::Transient {
                collaborator: "embedder".to_string(),
                cause,
            }),
        }
    }
}

fn call_with_timeout<E>(embedder: &E, text: &str, timeout: Duration) -> std::result::Result<Vec<f32>, String>
where
    E: Embedder + Clone + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    let embedder = embedder.clone();
    let text = text.to_string();
    std::thread::spawn(move || {
        let _ = tx.send(embedder.embed(&text));
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(vector)) => Ok(vector),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("embedder call exceeded {timeout:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::DeterministicEmbedder;

    #[derive(Clone)]
    struct CountedEmbedder {
        inner: DeterministicEmbedder,
    }

    impl Embedder for CountedEmbedder {
        fn dimensions(&self) -> usize {
            self.inner.dimensions()
        }
        fn model_id(&self) -> &str {
            self.inner.model_id()
        }
        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            self.inner.embed(text)
        }
    }

    #[test]
    fn succeeds_within_timeout() {
        let wrapped = ResilientEmbedder::new(
            CountedEmbedder {
                inner: DeterministicEmbedder::new(),
            },
            Duration::from_secs(5),
        );
        assert!(!wrapped.embed("hello").unwrap().is_empty());
    }
}
