//! Runtime configuration: defaults, layered with a TOML file and
//! `${VAR}`-expanded environment overrides.

mod features;
mod vocabulary;

pub use features::FeatureFlags;
pub use vocabulary::{SeniorityChain, Vocabulary};

use serde::Deserialize;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

/// Expands `${VAR_NAME}` references against the process environment.
///
/// Unset variables are left untouched. Uses `Cow` so a string with no
/// `${` marker never allocates.
fn expand_env_vars(input: &str) -> Cow<'_, str> {
    if !input.contains("${") {
        return Cow::Borrowed(input);
    }

    let mut result = input.to_string();
    let mut start = 0;

    while let Some(var_start) = result[start..].find("${") {
        let var_start = start + var_start;
        if let Some(var_end) = result[var_start..].find('}') {
            let var_end = var_start + var_end;
            let var_name = &result[var_start + 2..var_end];
            if let Ok(value) = std::env::var(var_name) {
                result.replace_range(var_start..=var_end, &value);
                start = var_start + value.len();
            } else {
                start = var_end + 1;
            }
        } else {
            break;
        }
    }

    Cow::Owned(result)
}

/// Per-response-type reconstruction gate thresholds (§4.F).
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GateThresholds {
    /// Minimum `intent_alignment` to pass.
    pub intent: f32,
    /// Minimum `memory_alignment` to pass.
    pub memory: f32,
    /// Minimum `grounding` to pass, or `None` when the type does not gate on it.
    pub grounding: Option<f32>,
}

/// All three response-type threshold rows.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Thresholds for `factual` answers.
    pub factual: GateThresholds,
    /// Thresholds for `explanatory` answers.
    pub explanatory: GateThresholds,
    /// Thresholds for `conversational` answers.
    pub conversational: GateThresholds,
}

impl Default for GateConfig {
    fn default() -> Self {
        Self {
            factual: GateThresholds {
                intent: 0.35,
                memory: 0.35,
                grounding: Some(0.40),
            },
            explanatory: GateThresholds {
                intent: 0.40,
                memory: 0.25,
                grounding: Some(0.30),
            },
            conversational: GateThresholds {
                intent: 0.30,
                memory: 0.20,
                grounding: None,
            },
        }
    }
}

/// Weights for the retrieval scoring formula `α·cos + β·trust + γ·recency`.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct LaneWeights {
    /// Cosine-similarity weight.
    pub alpha: f32,
    /// Trust weight.
    pub beta: f32,
    /// Recency-decay weight.
    pub gamma: f32,
    /// Multiplicative penalty applied to SPEECH-lane scores during
    /// belief-preferring retrieval.
    pub speech_penalty: f32,
}

impl Default for LaneWeights {
    fn default() -> Self {
        Self {
            alpha: 0.6,
            beta: 0.3,
            gamma: 0.1,
            speech_penalty: 0.4,
        }
    }
}

/// Per-call collaborator timeouts.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Embedder call timeout, milliseconds.
    pub embedder_ms: u64,
    /// Generator call timeout, milliseconds.
    pub generator_ms: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            embedder_ms: 5_000,
            generator_ms: 30_000,
        }
    }
}

/// Identifiers for the external embedder and generator collaborators,
/// recorded alongside memories/config for reproducibility (§6).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CollaboratorIds {
    /// Embedder model identifier.
    pub embedder: String,
    /// Generator model identifier.
    pub generator: String,
}

impl Default for CollaboratorIds {
    fn default() -> Self {
        Self {
            embedder: "deterministic-hash-v1".to_string(),
            generator: "echo-v1".to_string(),
        }
    }
}

/// Flat, runtime-reloadable configuration (§6).
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Drift threshold above which a CONFLICT is `blocking` severity and
    /// forces a gate fail regardless of scores.
    pub theta_contra: f32,
    /// Minimum trust floor applied by default to retrieval calls.
    pub theta_mem: f32,
    /// Default number of memories retrieved per question turn.
    pub retrieve_k: usize,
    /// Retention window in days, used to derive the recency half-life.
    pub retention_days: f32,
    /// Retrieval scoring weights.
    pub lane_weights: LaneWeights,
    /// Reconstruction gate thresholds.
    pub gates: GateConfig,
    /// Collaborator call timeouts.
    pub timeouts: TimeoutConfig,
    /// Feature toggles.
    pub features: FeatureFlags,
    /// Externalized classifier/disclosure vocabulary.
    pub vocabulary: Vocabulary,
    /// Collaborator model identifiers.
    pub collaborators: CollaboratorIds,
    /// Config files that contributed to this value, most specific last.
    pub config_sources: Vec<PathBuf>,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            theta_contra: 0.42,
            theta_mem: 0.37,
            retrieve_k: 6,
            retention_days: 90.0,
            lane_weights: LaneWeights::default(),
            gates: GateConfig::default(),
            timeouts: TimeoutConfig::default(),
            features: FeatureFlags::defaults(),
            vocabulary: Vocabulary::default(),
            collaborators: CollaboratorIds::default(),
            config_sources: Vec::new(),
        }
    }
}

impl RuntimeConfig {
    /// Recency half-life in seconds, derived from `retention_days`.
    ///
    /// Used by `recency_decay(age) = exp(-age / half_life)` (§4.C).
    #[must_use]
    pub fn retention_half_life_seconds(&self) -> f64 {
        f64::from(self.retention_days) * 86_400.0
    }

    /// Builds config by layering defaults, an optional TOML file, then
    /// `${VAR}`-expanded environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file is present but fails to parse.
    pub fn load(config_path: Option<&Path>) -> crate::Result<Self> {
        let mut config = Self::default();

        if let Some(path) = config_path {
            if path.exists() {
                let raw = std::fs::read_to_string(path).map_err(|e| crate::Error::Storage {
                    operation: "read_config".to_string(),
                    cause: e.to_string(),
                })?;
                let expanded = expand_env_vars(&raw);
                let file_config: Self =
                    toml::from_str(&expanded).map_err(|e| crate::Error::InvalidInput(format!(
                        "malformed config file {}: {e}",
                        path.display()
                    )))?;
                config = file_config;
                config.config_sources.push(path.to_path_buf());
            }
        }

        if let Ok(val) = std::env::var("CRT_RETRIEVE_K") {
            if let Ok(k) = val.parse() {
                config.retrieve_k = k;
            }
        }
        if let Ok(val) = std::env::var("CRT_RETENTION_DAYS") {
            if let Ok(days) = val.parse() {
                config.retention_days = days;
            }
        }
        if let Ok(val) = std::env::var("CRT_PII_ANONYMIZATION") {
            config.features.pii_anonymization = val == "1" || val.eq_ignore_ascii_case("true");
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn expand_env_vars_leaves_plain_strings_alone() {
        assert_eq!(expand_env_vars("no vars here"), "no vars here");
    }

    #[test]
    fn expand_env_vars_substitutes_known_var() {
        std::env::set_var("CRT_TEST_EXPAND_VAR", "value123");
        assert_eq!(
            expand_env_vars("prefix-${CRT_TEST_EXPAND_VAR}-suffix"),
            "prefix-value123-suffix"
        );
        std::env::remove_var("CRT_TEST_EXPAND_VAR");
    }

    #[test]
    fn default_gate_thresholds_match_spec_table() {
        let gates = GateConfig::default();
        assert!((gates.factual.intent - 0.35).abs() < f32::EPSILON);
        assert!((gates.explanatory.memory - 0.25).abs() < f32::EPSILON);
        assert!(gates.conversational.grounding.is_none());
    }

    #[test]
    fn retention_half_life_derives_from_days() {
        let config = RuntimeConfig::default();
        assert!((config.retention_half_life_seconds() - 90.0 * 86_400.0).abs() < 1.0);
    }
}
