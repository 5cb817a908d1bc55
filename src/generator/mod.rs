//! Generator collaborator (§6): treated as a pure function `prompt -> text`,
//! external to the engine's invariants. Its output is untrusted and must
//! pass the reconstruction gates and disclosure engine before it reaches a
//! caller.

mod composing;
mod resilience;

pub use composing::{compose_prompt, ComposingGenerator, GenerationRequest};
pub use resilience::ResilientGenerator;

use crate::Result;

/// A text generator.
pub trait Generator: Send + Sync {
    /// A stable identifier for the generative model, recorded alongside
    /// config for reproducibility.
    fn model_id(&self) -> &str;

    /// Generates a candidate answer from a composed prompt.
    ///
    /// # Errors
    ///
    /// Returns an error if the collaborator call fails.
    fn generate(&self, prompt: &str) -> Result<String>;
}
