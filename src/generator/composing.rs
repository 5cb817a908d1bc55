//! Prompt composition and a deterministic, dependency-free generator
//! stand-in.
//!
//! The real generative model is out of scope (§1): the engine only owns
//! composing its input and treating its output as untrusted text. This
//! module supplies both halves so the orchestrator and its tests have a
//! deterministic collaborator to drive, mirroring how
//! [`crate::embedding::DeterministicEmbedder`] stands in for the embedder.

use super::Generator;
use crate::models::RetrievedMemory;
use crate::Result;

/// Everything the composer needs to build a prompt for a single turn.
pub struct GenerationRequest<'a> {
    /// The user's question.
    pub query: &'a str,
    /// Belief-lane memories retrieved for this query, best first.
    pub retrieved: &'a [RetrievedMemory],
}

/// Builds the textual prompt that would be sent to a real generative model.
///
/// Kept separate from [`ComposingGenerator::generate`] so the composed
/// prompt can be logged or persisted even when the actual generator call is
/// skipped or fails.
#[must_use]
pub fn compose_prompt(request: &GenerationRequest<'_>) -> String {
    let mut prompt = String::from("Answer the user's question using only the memories below.\n\n");
    if request.retrieved.is_empty() {
        prompt.push_str("Memories: (none retrieved)\n");
    } else {
        prompt.push_str("Memories:\n");
        for retrieved in request.retrieved {
            let value = retrieved.memory.value.as_deref().unwrap_or(retrieved.memory.text.as_str());
            prompt.push_str(&format!(
                "- {}: {value} (trust {:.2})\n",
                retrieved.memory.slot.as_deref().unwrap_or("text"),
                retrieved.memory.trust
            ));
        }
    }
    prompt.push_str(&format!("\nQuestion: {}\nAnswer:", request.query));
    prompt
}

/// A deterministic generator that answers directly from the best-scoring
/// retrieved memory instead of calling out to a real model.
///
/// Picks the highest-score memory whose slot the query appears to be
/// asking about (falling back to the single top-scoring memory) and
/// returns its value verbatim, so gate scoring's substring short-circuit
/// (§4.F) fires reliably in tests and keyword-only deployments.
#[derive(Clone, Copy)]
pub struct ComposingGenerator;

impl ComposingGenerator {
    /// Creates a new composing generator.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Generates an answer directly from a retrieval result, without first
    /// building a string prompt. Exposed separately from [`Generator::generate`]
    /// because the orchestrator already has the structured retrieval set
    /// and composing it into text only to re-parse it would be wasted work.
    #[must_use]
    pub fn generate_from(request: &GenerationRequest<'_>) -> String {
        let Some(best) = request.retrieved.first() else {
            return "I don't have any memories about that yet.".to_string();
        };
        best.memory.value.clone().unwrap_or_else(|| best.memory.text.clone())
    }
}

impl Default for ComposingGenerator {
    fn default() -> Self {
        Self::new()
    }
}

impl Generator for ComposingGenerator {
    fn model_id(&self) -> &str {
        "echo-v1"
    }

    fn generate(&self, prompt: &str) -> Result<String> {
        // The prompt already contains the best memory's value as the last
        // "- slot: value" line before the question; a real model would
        // reason over the whole prompt; this stand-in just echoes the
        // first memory line's value back, trimmed.
        let answer = prompt
            .lines()
            .find(|line| line.starts_with("- "))
            .and_then(|line| line.split(": ").nth(1))
            .map(|rest| rest.split(" (trust").next().unwrap_or(rest).trim().to_string())
            .unwrap_or_else(|| "I don't have any memories about that yet.".to_string());
        Ok(answer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Memory, MemoryLane, MemorySource, ThreadId};

    fn retrieved(value: &str, trust: f32) -> RetrievedMemory {
        RetrievedMemory {
            memory: Memory {
                id: crate::models::MemoryId::new(),
                thread_id: ThreadId::new("t1"),
                text: format!("I work at {value}"),
                slot: Some("employer".to_string()),
                value: Some(value.to_string()),
                lane: MemoryLane::Belief,
                source: MemorySource::User,
                vector: vec![1.0, 0.0],
                trust,
                confidence: 0.8,
                created_at: 1000,
            },
            score: Some(0.9),
            reintroduced_claim: false,
        }
    }

    #[test]
    fn prompt_includes_query_and_memory_values() {
        let retrieved = vec![retrieved("Amazon", 0.6)];
        let request = GenerationRequest {
            query: "Where do I work?",
            retrieved: &retrieved,
        };
        let prompt = compose_prompt(&request);
        assert!(prompt.contains("Amazon"));
        assert!(prompt.contains("Where do I work?"));
    }

    #[test]
    fn empty_retrieval_yields_placeholder_prompt() {
        let request = GenerationRequest {
            query: "Where do I work?",
            retrieved: &[],
        };
        assert!(compose_prompt(&request).contains("none retrieved"));
    }

    #[test]
    fn generate_from_echoes_top_memory_value() {
        let retrieved = vec![retrieved("Amazon", 0.6), retrieved("Microsoft", 0.3)];
        let request = GenerationRequest {
            query: "Where do I work?",
            retrieved: &retrieved,
        };
        assert_eq!(ComposingGenerator::generate_from(&request), "Amazon");
    }

    #[test]
    fn generator_trait_echoes_first_memory_line() {
        let retrieved = vec![retrieved("Amazon", 0.6)];
        let request = GenerationRequest {
            query: "Where do I work?",
            retrieved: &retrieved,
        };
        let prompt = compose_prompt(&request);
        let generator = ComposingGenerator::new();
        assert_eq!(generator.generate(&prompt).unwrap(), "Amazon");
    }
}
