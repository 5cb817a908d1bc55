//! Memory Store (§4.C): the durable home for facts and speech, and the
//! only place `Memory::trust` is allowed to change.

pub mod scoring;
pub mod trust;

use crate::config::LaneWeights;
use crate::models::{Memory, MemoryId, MemoryLane, RetrievedMemory, ThreadId, Topology};
use crate::storage::StorageBackend;
use crate::Result;
use std::sync::Arc;

/// Whether a retrieval pass should prefer belief-lane memories.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LanePreference {
    /// Penalize SPEECH-lane memories in the composite score (question answering).
    PreferBelief,
    /// Score both lanes identically.
    Any,
}

/// A query embedding, or its degraded keyword-only substitute.
pub enum RetrievalQuery<'a> {
    /// A dense query vector, compared by cosine similarity.
    Vector(&'a [f32]),
    /// Plain query text, compared by token-overlap Jaccard similarity.
    ///
    /// Used when the embedder collaborator is degraded (§4.H failure
    /// semantics).
    Keywords(&'a str),
}

/// The durable store of memories, backed by a [`StorageBackend`].
pub struct MemoryStore {
    backend: Arc<dyn StorageBackend>,
}

impl MemoryStore {
    /// Wraps a storage backend.
    #[must_use]
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Persists a new memory, or reinforces an existing near-duplicate
    /// instead of inserting a fresh row.
    ///
    /// Reinforcement triggers when a same-slot/value memory already exists
    /// with cosine similarity >= [`trust::REINFORCEMENT_COSINE_THRESHOLD`]
    /// against the incoming vector; its trust is bumped via
    /// [`trust::reinforce`] and its id is returned instead of creating a
    /// duplicate row.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn put(&self, memory: Memory, now: u64) -> Result<MemoryId> {
        if let (Some(slot), Some(value)) = (memory.slot.as_deref(), memory.value.as_deref()) {
            let existing = self.backend.list_memories_by_slot(&memory.thread_id, slot)?;
            if let Some(dup) = existing.iter().find(|m| {
                m.value.as_deref() == Some(value)
                    && scoring::cosine_similarity(&m.vector, &memory.vector)
                        >= trust::REINFORCEMENT_COSINE_THRESHOLD
            }) {
                let new_trust = trust::reinforce(dup.trust);
                self.backend.set_trust(&dup.id, new_trust, "reinforcement", now)?;
                return Ok(dup.id.clone());
            }
        }

        let id = memory.id.clone();
        self.backend.put_memory(&memory)?;
        Ok(id)
    }

    /// Fetches a memory by id. Absent, not an error, for an unknown id.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn get(&self, id: &MemoryId) -> Result<Option<Memory>> {
        self.backend.get_memory(id)
    }

    /// Returns all memories for a thread with the given slot, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn retrieve_by_slot(&self, thread_id: &ThreadId, slot: &str) -> Result<Vec<Memory>> {
        self.backend.list_memories_by_slot(thread_id, slot)
    }

    /// Returns the top-`k` memories for a thread by composite score
    /// `alpha*similarity + beta*trust + gamma*recency`.
    ///
    /// `k = 0` returns an empty list. Memories below `min_trust` are
    /// excluded before ranking.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn retrieve(
        &self,
        thread_id: &ThreadId,
        query: RetrievalQuery<'_>,
        k: usize,
        min_trust: f32,
        lane_preference: LanePreference,
        weights: LaneWeights,
        half_life_seconds: f64,
        now: u64,
    ) -> Result<Vec<RetrievedMemory>> {
        if k == 0 {
            return Ok(Vec::new());
        }

        let candidates = self.backend.list_memories(thread_id)?;
        let mut scored: Vec<(Memory, f32)> = candidates
            .into_iter()
            .filter(|m| m.trust >= min_trust)
            .map(|m| {
                let similarity = match &query {
                    RetrievalQuery::Vector(q) => scoring::cosine_similarity(q, &m.vector),
                    RetrievalQuery::Keywords(q) => scoring::token_jaccard_similarity(q, &m.text),
                };
                #[allow(clippy::cast_precision_loss)]
                let age_seconds = now.saturating_sub(m.created_at) as f64;
                let recency = scoring::recency_decay(age_seconds, half_life_seconds);
                let mut score =
                    scoring::composite_score(similarity, m.trust, recency, weights.alpha, weights.beta, weights.gamma);
                if lane_preference == LanePreference::PreferBelief && m.lane == MemoryLane::Speech {
                    score *= weights.speech_penalty;
                }
                (m, score)
            })
            .collect();

        scored.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.id.as_str().cmp(b.0.id.as_str())));
        scored.truncate(k);

        scored
            .into_iter()
            .map(|(memory, score)| {
                let reintroduced_claim = self.backend.has_open_conflict(&memory.id)?;
                Ok(RetrievedMemory {
                    memory,
                    score: Some(score),
                    reintroduced_claim,
                })
            })
            .collect()
    }

    /// Applies a contradiction's trust consequence to the old memory and
    /// appends the `trust_history` row (§4.C). `REFINEMENT`/`TEMPORAL` are
    /// no-ops here by construction of [`trust::evolve`].
    ///
    /// # Errors
    ///
    /// Returns an error if the storage write fails.
    pub fn evolve_trust(&self, old_memory: &Memory, topology: Topology, drift: f32, now: u64) -> Result<()> {
        let new_trust = trust::evolve(old_memory.trust, topology, drift);
        #[allow(clippy::float_cmp)]
        if new_trust != old_memory.trust {
            self.backend.set_trust(&old_memory.id, new_trust, topology.as_str(), now)?;
        }
        Ok(())
    }

    /// Annotates a fetched memory with its current `reintroduced_claim`
    /// status, computed fresh against the ledger (invariant 3).
    ///
    /// # Errors
    ///
    /// Returns an error if the storage read fails.
    pub fn reintroduced_claim(&self, memory_id: &MemoryId) -> Result<bool> {
        self.backend.has_open_conflict(memory_id)
    }
}
