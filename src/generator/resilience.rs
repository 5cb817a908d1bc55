//! Timeout and single-retry wrapper for the generator collaborator (§5, §7).
//!
//! Mirrors [`crate::embedding::ResilientEmbedder`]'s shape: one retry, then
//! a surfaced transient error. The orchestrator is responsible for turning
//! that error into a marked SPEECH-mode response and skipping caveat
//! enforcement (§4.H failure semantics) — this wrapper only owns the
//! timeout/retry mechanics.

use super::Generator;
use crate::{Error, Result};
use std::sync::mpsc;
use std::time::Duration;

/// Wraps a [`Generator`] with a per-call timeout and one local retry.
pub struct ResilientGenerator<G> {
    inner: G,
    timeout: Duration,
}

impl<G: Generator + 'static> ResilientGenerator<G> {
    /// Wraps `inner` with the given per-call timeout.
    #[must_use]
    pub const fn new(inner: G, timeout: Duration) -> Self {
        Self { inner, timeout }
    }
}

impl<G> Generator for ResilientGenerator<G>
where
    G: Generator + Clone + Send + Sync + 'static,
{
    fn model_id(&self) -> &str {
        self.inner.model_id()
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        match call_with_timeout(&self.inner, prompt, self.timeout) {
            Ok(text) => Ok(text),
            Err(_) => call_with_timeout(&self.inner, prompt, self.timeout).map_err(|cause| Error::Transient {
                collaborator: "generator".to_string(),
                cause,
            }),
        }
    }
}

fn call_with_timeout<G>(generator: &G, prompt: &str, timeout: Duration) -> std::result::Result<String, String>
where
    G: Generator + Clone + Send + Sync + 'static,
{
    let (tx, rx) = mpsc::channel();
    let generator = generator.clone();
    let prompt = prompt.to_string();
    std::thread::spawn(move || {
        let _ = tx.send(generator.generate(&prompt));
    });

    match rx.recv_timeout(timeout) {
        Ok(Ok(text)) => Ok(text),
        Ok(Err(e)) => Err(e.to_string()),
        Err(_) => Err(format!("generator call exceeded {timeout:?}")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::ComposingGenerator;

    #[test]
    fn succeeds_within_timeout() {
        let wrapped = ResilientGenerator::new(ComposingGenerator::new(), Duration::from_secs(5));
        let answer = wrapped.generate("Memories:\n- employer: Amazon (trust 0.60)\n\nQuestion: Where?\nAnswer:").unwrap();
        assert_eq!(answer, "Amazon");
    }

    #[derive(Clone)]
    struct AlwaysFailsGenerator;

    impl Generator for AlwaysFailsGenerator {
        fn model_id(&self) -> &str {
            "always-fails"
        }
        fn generate(&self, _prompt: &str) -> Result<String> {
            Err(Error::Transient {
                collaborator: "generator".to_string(),
                cause: "simulated outage".to_string(),
            })
        }
    }

    #[test]
    fn surfaces_transient_error_after_retry() {
        let wrapped = ResilientGenerator::new(AlwaysFailsGenerator, Duration::from_millis(200));
        let result = wrapped.generate("prompt");
        assert!(matches!(result, Err(Error::Transient { .. })));
    }
}
