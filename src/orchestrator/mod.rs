//! RAG Orchestrator (§4.H): the top-level control flow for a single user
//! turn — extract, retrieve, detect, gate, compose, disclose.

mod cancellation;

pub use cancellation::CancellationToken;

use crate::classify::{self, ClassifyInput};
use crate::config::RuntimeConfig;
use crate::disclosure::{self, Disclosure};
use crate::embedding::Embedder;
use crate::extract;
use crate::gates;
use crate::generator::{compose_prompt, GenerationRequest, Generator};
use crate::ledger::ContradictionLedger;
use crate::models::{
    EventKind, EventRecord, Fact, Memory, MemoryId, MemoryLane, RetrievedMemory, ResolutionMethod, ResponseType, ThreadId, Topology,
};
use crate::observability::EngineMetrics;
use crate::security;
use crate::store::{LanePreference, MemoryStore, RetrievalQuery};
use crate::storage::StorageBackend;
use crate::{current_timestamp, Error, Result};
use std::sync::{Arc, RwLock};
use tracing::{info, instrument, warn};

/// Everything about a completed turn beyond the plain answer text, exposed
/// for the caller (HTTP façade, CLI, tests) to inspect (§4.H step 10).
#[derive(Debug, Clone)]
pub struct TurnMetadata {
    /// Memories retrieved for this turn (empty for a pure statement turn),
    /// each tagged with its current `reintroduced_claim` status.
    pub retrieved: Vec<RetrievedMemory>,
    /// Facts extracted from the utterance, if it was a statement.
    pub facts_extracted: Vec<Fact>,
    /// Ledger entries opened or recorded during this turn.
    pub topologies_recorded: Vec<Topology>,
    /// True if the turn's answer was a collaborator-failure error,
    /// exempting it from the caveat invariant (§4.G, §7).
    pub collaborator_error: bool,
}

/// The full result of one orchestrator pass (§4.H step 10).
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    /// The final answer text shown to the user.
    pub answer: String,
    /// The disclosure mode that produced `answer`.
    pub response_type: ResponseType,
    /// Whether the reconstruction gates passed (always `true` for a
    /// statement-only turn, which never reaches the gates).
    pub gates_passed: bool,
    /// The gate failure reason, if any.
    pub gate_reason: Option<String>,
    /// Supplementary detail about how the turn was produced.
    pub metadata: TurnMetadata,
}

/// Default number of memories retrieved per question turn (§4.H step 4).
const DEFAULT_RETRIEVE_K: usize = 6;

/// Top-level control flow: extract -> retrieve -> detect -> gate -> compose
/// -> disclose (§4.H).
pub struct Orchestrator {
    backend: Arc<dyn StorageBackend>,
    store: MemoryStore,
    ledger: ContradictionLedger,
    embedder: Arc<dyn Embedder>,
    generator: Arc<dyn Generator>,
    config: RwLock<Arc<RuntimeConfig>>,
    metrics: EngineMetrics,
}

impl Orchestrator {
    /// Builds an orchestrator over a storage backend and its collaborators.
    #[must_use]
    pub fn new(
        backend: Arc<dyn StorageBackend>,
        embedder: Arc<dyn Embedder>,
        generator: Arc<dyn Generator>,
        config: RuntimeConfig,
    ) -> Self {
        Self {
            store: MemoryStore::new(Arc::clone(&backend)),
            ledger: ContradictionLedger::new(Arc::clone(&backend)),
            backend,
            embedder,
            generator,
            config: RwLock::new(Arc::new(config)),
            metrics: EngineMetrics::install(),
        }
    }

    /// Returns the config snapshot in effect for turns starting right now.
    ///
    /// In-flight turns keep the `Arc` they already cloned even if
    /// [`Orchestrator::reload_config`] swaps it out mid-turn (§9A).
    #[must_use]
    pub fn config(&self) -> Arc<RuntimeConfig> {
        let guard = self.config.read().unwrap_or_else(std::sync::PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// Re-reads `path` and atomically swaps the active config snapshot.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn reload_config(&self, path: &std::path::Path) -> Result<()> {
        let fresh = RuntimeConfig::load(Some(path))?;
        let mut guard = self.config.write().unwrap_or_else(std::sync::PoisonError::into_inner);
        *guard = Arc::new(fresh);
        Ok(())
    }

    /// Handles one user turn with no cancellation support. Equivalent to
    /// calling [`Orchestrator::handle_turn_cancellable`] with a fresh,
    /// never-cancelled token.
    ///
    /// # Errors
    ///
    /// Returns an error if a storage write fails (the ledger/memory write
    /// pathway is never silently dropped, §4.H failure semantics) or an
    /// integrity violation is detected (§7).
    pub fn handle_turn(&self, thread_id: &ThreadId, utterance: &str) -> Result<TurnOutcome> {
        self.handle_turn_cancellable(thread_id, utterance, &CancellationToken::new())
    }

    /// Handles one user turn (§4.H steps 1-10).
    ///
    /// # Errors
    ///
    /// See [`Orchestrator::handle_turn`].
    #[instrument(skip(self, cancellation), fields(thread_id = %thread_id))]
    pub fn handle_turn_cancellable(
        &self,
        thread_id: &ThreadId,
        utterance: &str,
        cancellation: &CancellationToken,
    ) -> Result<TurnOutcome> {
        if utterance.trim().is_empty() {
            return Err(Error::InvalidInput("utterance must not be empty".to_string()));
        }

        let config = self.config();
        let now = current_timestamp();

        if extract::is_question(utterance) {
            self.handle_question(thread_id, utterance, &config, now, cancellation)
        } else {
            self.handle_statement(thread_id, utterance, &config, now)
        }
    }

    /// §4.H step 3: extract facts, store each, classify against priors,
    /// record ledger entries, evolve trust on CONFLICT.
    #[instrument(skip(self, config))]
    fn handle_statement(
        &self,
        thread_id: &ThreadId,
        utterance: &str,
        config: &RuntimeConfig,
        now: u64,
    ) -> Result<TurnOutcome> {
        let facts = extract::extract(utterance);
        let mut topologies_recorded = Vec::new();

        if facts.is_empty() {
            let vector = self.embed_or_degrade(utterance);
            let text = self.maybe_anonymize(utterance, config);
            let memory = Memory::new_speech(thread_id.clone(), text, vector, now);
            self.store.put(memory, now)?;
        }

        for fact in &facts {
            let priors = self.store.retrieve_by_slot(thread_id, &fact.slot)?;
            let vector = self.embed_or_degrade(&fact.value);
            let text = self.maybe_anonymize(utterance, config);
            let memory =
                Memory::new_user_fact(thread_id.clone(), text, fact.slot.clone(), fact.value.clone(), fact.confidence, vector.clone(), now);
            let new_id = self.store.put(memory, now)?;

            for prior in &priors {
                let classification = classify::classify(
                    &ClassifyInput {
                        old_text: &prior.text,
                        new_text: utterance,
                        old_vector: &prior.vector,
                        new_vector: &vector,
                        old_value: prior.value.as_deref().unwrap_or_default(),
                        new_value: &fact.value,
                        slot: &fact.slot,
                    },
                    &config.vocabulary,
                );

                self.record_topology(thread_id, &prior.id, &new_id, classification.topology, classification.drift, fact.confidence, prior.confidence, now)?;
                topologies_recorded.push(classification.topology);
            }
        }

        Ok(TurnOutcome {
            answer: "Noted.".to_string(),
            response_type: ResponseType::Speech,
            gates_passed: true,
            gate_reason: None,
            metadata: TurnMetadata {
                retrieved: Vec::new(),
                facts_extracted: facts,
                topologies_recorded,
                collaborator_error: false,
            },
        })
    }

    /// Records one classified `(old, new)` pair as a ledger entry,
    /// evolving the prior's trust when the topology is CONFLICT or
    /// REVISION (§4.C, §4.E).
    #[allow(clippy::too_many_arguments)]
    fn record_topology(
        &self,
        thread_id: &ThreadId,
        old_id: &MemoryId,
        new_id: &MemoryId,
        topology: Topology,
        drift: f32,
        new_confidence: f32,
        old_confidence: f32,
        now: u64,
    ) -> Result<()> {
        let confidence_delta = new_confidence - old_confidence;
        let summary = format!("{topology} on slot update (drift {drift:.2})");

        self.ledger.record(thread_id.clone(), old_id.clone(), new_id.clone(), topology, drift, confidence_delta, summary, now)?;
        self.metrics.contradiction_opened(topology.as_str());

        if matches!(topology, Topology::Conflict | Topology::Revision) {
            if let Some(old_memory) = self.store.get(old_id)? {
                self.store.evolve_trust(&old_memory, topology, drift, now)?;
            }
        }

        self.append_event(thread_id, EventKind::Contradiction, serde_json::json!({
            "old_memory_id": old_id.to_string(),
            "new_memory_id": new_id.to_string(),
            "topology": topology.as_str(),
            "drift": drift,
        }), now)
    }

    /// §4.H steps 4-9: retrieve, compose, generate, gate, disclose.
    #[instrument(skip(self, config, cancellation))]
    fn handle_question(
        &self,
        thread_id: &ThreadId,
        utterance: &str,
        config: &RuntimeConfig,
        now: u64,
        cancellation: &CancellationToken,
    ) -> Result<TurnOutcome> {
        let query = self.embed_or_degrade(utterance);
        let retrieval_query = if query.is_empty() {
            RetrievalQuery::Keywords(utterance)
        } else {
            RetrievalQuery::Vector(&query)
        };

        let k = if config.retrieve_k == 0 { DEFAULT_RETRIEVE_K } else { config.retrieve_k };
        let mut retrieved = self.store.retrieve(
            thread_id,
            retrieval_query,
            k,
            config.theta_mem,
            LanePreference::PreferBelief,
            config.lane_weights,
            config.retention_half_life_seconds(),
            now,
        )?;
        // Two-Lane Separation: a belief-mode answer is never allowed to see
        // SPEECH memories, no matter how they scored against the query.
        retrieved.retain(|m| m.memory.lane == MemoryLane::Belief);

        self.append_event(thread_id, EventKind::Retrieval, serde_json::json!({
            "query": utterance,
            "retrieved_count": retrieved.len(),
        }), now)?;

        let open_conflicts = self.ledger.unresolved_for_thread(thread_id)?;
        let blocking_contradiction = retrieved.iter().any(|m| {
            open_conflicts.iter().any(|entry| {
                entry.topology == Topology::Conflict
                    && entry.drift >= config.theta_contra
                    && (entry.old_memory_id == m.memory.id || entry.new_memory_id == m.memory.id)
            })
        });

        if cancellation.is_cancelled() {
            return Ok(self.cancelled_outcome(retrieved));
        }

        let request = GenerationRequest { query: utterance, retrieved: &retrieved };
        let prompt = compose_prompt(&request);

        let candidate = match self.generator.generate(&prompt) {
            Ok(text) => text,
            Err(err) => {
                warn!(error = %err, "generator collaborator failed, returning marked error response");
                return Ok(self.collaborator_error_outcome(retrieved));
            }
        };

        let answer_vector = self.embed_or_degrade(&candidate);
        let kind = gates::classify_response_kind(utterance);
        let retrieved_vectors: Vec<&[f32]> = retrieved.iter().map(|m| m.memory.vector.as_slice()).collect();
        let retrieved_values: Vec<&str> = retrieved.iter().map(|m| m.memory.value.as_deref().unwrap_or(m.memory.text.as_str())).collect();
        let answer_value = retrieved_values.iter().find(|v| candidate.contains(**v)).copied();

        let decision = gates::score(
            &query,
            &answer_vector,
            &candidate,
            answer_value,
            &retrieved_vectors,
            &retrieved_values,
            kind,
            &config.gates,
            blocking_contradiction,
        );
        self.metrics.gate_decision(kind.as_str(), decision.passed());

        let disclosure = disclosure::disclose(&retrieved, &decision, &candidate, &config.vocabulary);

        if let Disclosure::Belief { caveat_inserted: true, .. } = &disclosure {
            self.metrics.caveat_correction();
        }

        if !disclosure::caveat_invariant_holds(&retrieved, &disclosure, &config.vocabulary) {
            return Err(Error::Integrity(
                "BELIEF answer referenced a reintroduced claim without a caveat after wrapping".to_string(),
            ));
        }

        let (answer, response_type) = match &disclosure {
            Disclosure::Uncertainty(text) => (text.clone(), ResponseType::Uncertainty),
            Disclosure::Belief { text, .. } => (text.clone(), ResponseType::Belief),
            Disclosure::Speech(text) => (text.clone(), ResponseType::Speech),
        };
        self.metrics.response_mode(response_type.as_str());

        self.append_event(thread_id, EventKind::GateDecision, serde_json::json!({
            "kind": kind.to_string(),
            "passed": decision.passed(),
            "response_type": response_type.to_string(),
        }), now)?;

        info!(response_type = %response_type, gates_passed = decision.passed(), "turn completed");

        Ok(TurnOutcome {
            answer,
            response_type,
            gates_passed: decision.passed(),
            gate_reason: decision.reason().map(ToString::to_string),
            metadata: TurnMetadata {
                retrieved,
                facts_extracted: Vec::new(),
                topologies_recorded: Vec::new(),
                collaborator_error: false,
            },
        })
    }

    /// §5 cancellation: memory/ledger writes already happened by this point
    /// (the statement pathway, if any, ran before retrieval); the generator
    /// call is skipped and a marked SPEECH-mode error response returned.
    fn cancelled_outcome(&self, retrieved: Vec<RetrievedMemory>) -> TurnOutcome {
        TurnOutcome {
            answer: "Generation was cancelled before a response could be produced. (error)".to_string(),
            response_type: ResponseType::Speech,
            gates_passed: false,
            gate_reason: Some("cancelled".to_string()),
            metadata: TurnMetadata {
                retrieved,
                facts_extracted: Vec::new(),
                topologies_recorded: Vec::new(),
                collaborator_error: true,
            },
        }
    }

    /// §4.H / §7: generator failure, after its local retry, returns a
    /// marked error string and skips caveat enforcement.
    fn collaborator_error_outcome(&self, retrieved: Vec<RetrievedMemory>) -> TurnOutcome {
        TurnOutcome {
            answer: "I could not reach the model to generate a response. (error)".to_string(),
            response_type: ResponseType::Speech,
            gates_passed: false,
            gate_reason: Some("generator collaborator unavailable".to_string()),
            metadata: TurnMetadata {
                retrieved,
                facts_extracted: Vec::new(),
                topologies_recorded: Vec::new(),
                collaborator_error: true,
            },
        }
    }

    /// Embeds `text`, degrading to an empty vector (keyword-only mode) if
    /// the embedder collaborator fails even after its local retry (§4.H
    /// failure semantics).
    fn embed_or_degrade(&self, text: &str) -> Vec<f32> {
        match self.embedder.embed(text) {
            Ok(vector) => vector,
            Err(err) => {
                warn!(error = %err, "embedder collaborator failed, degrading to keyword-only mode");
                Vec::new()
            }
        }
    }

    fn maybe_anonymize(&self, text: &str, config: &RuntimeConfig) -> String {
        if config.features.pii_anonymization {
            security::anonymize(text)
        } else {
            text.to_string()
        }
    }

    fn append_event(&self, thread_id: &ThreadId, kind: EventKind, payload: serde_json::Value, now: u64) -> Result<()> {
        let event = EventRecord::new(thread_id.clone(), kind, payload, now);
        self.backend.append_event(&event)
    }

    /// Resolves an open ledger entry (HTTP façade's `ledger.resolve`, §6).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn resolve_contradiction(&self, thread_id: &ThreadId, ledger_id: &crate::models::LedgerId, method: ResolutionMethod) -> Result<()> {
        let now = current_timestamp();
        self.ledger.resolve(ledger_id, method, now)?;
        self.append_event(thread_id, EventKind::Resolution, serde_json::json!({ "ledger_id": ledger_id.to_string() }), now)
    }

    /// Returns every currently-unresolved contradiction for a thread
    /// (HTTP façade's `ledger.open`, §6).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn open_contradictions(&self, thread_id: &ThreadId) -> Result<Vec<crate::models::ContradictionEntry>> {
        self.ledger.unresolved_for_thread(thread_id)
    }

    /// Exports a full thread snapshot (HTTP façade's `thread.export`, §6).
    ///
    /// # Errors
    ///
    /// Returns an error if any underlying read fails.
    pub fn export_thread(&self, thread_id: &ThreadId) -> Result<crate::io::ThreadExport> {
        crate::io::ThreadExport::build(&self.backend, thread_id)
    }

    /// Summarizes a thread's state (HTTP façade's `profile`, §6): memory
    /// counts per lane, average trust, and open contradiction count.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn profile(&self, thread_id: &ThreadId) -> Result<ThreadProfile> {
        let memories = self.backend.list_memories(thread_id)?;
        let open = self.ledger.unresolved_for_thread(thread_id)?.len();

        let belief_count = memories.iter().filter(|m| m.lane == MemoryLane::Belief).count();
        let speech_count = memories.len() - belief_count;
        #[allow(clippy::cast_precision_loss)]
        let average_trust = if memories.is_empty() {
            0.0
        } else {
            memories.iter().map(|m| m.trust).sum::<f32>() / memories.len() as f32
        };

        Ok(ThreadProfile {
            thread_id: thread_id.clone(),
            belief_count,
            speech_count,
            average_trust,
            open_contradictions: open,
        })
    }

    /// Returns the `limit` most recently created memories for a thread,
    /// newest first (HTTP façade's `memory.recent`, §6).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn recent_memories(&self, thread_id: &ThreadId, limit: usize) -> Result<Vec<Memory>> {
        let mut memories = self.backend.list_memories(thread_id)?;
        memories.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        memories.truncate(limit);
        Ok(memories)
    }

    /// Searches a thread's memories by similarity to `query`, independent
    /// of the question/answer turn pathway (HTTP façade's `memory.search`,
    /// §6). Both lanes are scored identically; callers inspecting BELIEF
    /// vs SPEECH results do so via [`Memory::lane`].
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn search_memories(&self, thread_id: &ThreadId, query: &str, k: usize, min_trust: f32) -> Result<Vec<RetrievedMemory>> {
        let config = self.config();
        let now = current_timestamp();
        let vector = self.embed_or_degrade(query);
        let retrieval_query = if vector.is_empty() {
            RetrievalQuery::Keywords(query)
        } else {
            RetrievalQuery::Vector(&vector)
        };

        self.store.retrieve(
            thread_id,
            retrieval_query,
            k,
            min_trust,
            LanePreference::Any,
            config.lane_weights,
            config.retention_half_life_seconds(),
            now,
        )
    }
}

/// Summary of a thread's current state (§6 `profile`).
#[derive(Debug, Clone)]
pub struct ThreadProfile {
    /// The thread this profile describes.
    pub thread_id: ThreadId,
    /// Number of belief-lane memories.
    pub belief_count: usize,
    /// Number of speech-lane memories.
    pub speech_count: usize,
    /// Mean trust across all memories, `0.0` for an empty thread.
    pub average_trust: f32,
    /// Number of currently-open contradictions.
    pub open_contradictions: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::DeterministicEmbedder;
    use crate::generator::ComposingGenerator;
    use crate::storage::SqliteStorage;

    fn orchestrator() -> Orchestrator {
        let backend: Arc<dyn StorageBackend> = Arc::new(SqliteStorage::in_memory().unwrap());
        Orchestrator::new(backend, Arc::new(DeterministicEmbedder::new()), Arc::new(ComposingGenerator::new()), RuntimeConfig::default())
    }

    #[test]
    fn storing_a_name_then_asking_returns_it_without_caveat() {
        let orchestrator = orchestrator();
        let thread = ThreadId::new("scenario-1");
        orchestrator.handle_turn(&thread, "My name is Sarah").unwrap();

        let outcome = orchestrator.handle_turn(&thread, "What's my name?").unwrap();
        assert!(outcome.answer.to_lowercase().contains("sarah"));
        assert_eq!(outcome.response_type, ResponseType::Belief);
        assert!(outcome.gates_passed);
    }

    #[test]
    fn refinement_does_not_open_a_conflict() {
        let orchestrator = orchestrator();
        let thread = ThreadId::new("scenario-2");
        orchestrator.handle_turn(&thread, "I live in Seattle").unwrap();
        let outcome = orchestrator.handle_turn(&thread, "I live in Bellevue, in the Seattle area").unwrap();

        assert!(outcome.metadata.topologies_recorded.iter().any(|t| *t == Topology::Refinement));
        assert!(orchestrator.open_contradictions(&thread).unwrap().is_empty());
    }

    #[test]
    fn conflicting_employer_opens_conflict_and_yields_uncertainty() {
        let orchestrator = orchestrator();
        let thread = ThreadId::new("scenario-3");
        orchestrator.handle_turn(&thread, "I work at Microsoft").unwrap();
        let second = orchestrator.handle_turn(&thread, "Actually, I work at Amazon").unwrap();
        assert!(second.metadata.topologies_recorded.iter().any(|t| *t == Topology::Conflict));

        let open = orchestrator.open_contradictions(&thread).unwrap();
        assert!(open.iter().any(|e| e.topology == Topology::Conflict));

        let outcome = orchestrator.handle_turn(&thread, "Where do I work?").unwrap();
        assert_eq!(outcome.response_type, ResponseType::Uncertainty);
        assert!(!outcome.gates_passed);
        let lower = outcome.answer.to_lowercase();
        assert!(lower.contains("microsoft"));
        assert!(lower.contains("amazon"));
    }

    #[test]
    fn empty_utterance_is_rejected() {
        let orchestrator = orchestrator();
        let thread = ThreadId::new("scenario-empty");
        assert!(orchestrator.handle_turn(&thread, "   ").is_err());
    }

    #[test]
    fn cancelled_question_still_commits_prior_writes() {
        let orchestrator = orchestrator();
        let thread = ThreadId::new("scenario-cancel");
        orchestrator.handle_turn(&thread, "I work at Acme").unwrap();

        let token = CancellationToken::new();
        token.cancel();
        let outcome = orchestrator.handle_turn_cancellable(&thread, "Where do I work?", &token).unwrap();
        assert_eq!(outcome.response_type, ResponseType::Speech);
        assert!(outcome.metadata.collaborator_error);

        // The prior memory write is unaffected by the cancelled question turn.
        let export = orchestrator.export_thread(&thread).unwrap();
        assert!(!export.memories.is_empty());
    }
}
