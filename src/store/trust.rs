//! Trust evolution rules (§4.C, invariant 2).
//!
//! Trust only ever moves through these functions; nothing else in the
//! engine assigns `Memory::trust` directly after creation.

use crate::models::Topology;

/// Trust floor: trust never drops below this value (§4.C).
pub const TRUST_FLOOR: f32 = 0.3;
/// Trust ceiling for reinforcement (§4.C).
pub const TRUST_CEILING: f32 = 0.95;

/// Decay rate `lambda` applied to a CONFLICT.
const CONFLICT_LAMBDA: f32 = 0.5;
/// Decay rate `lambda` applied to a REVISION.
const REVISION_LAMBDA: f32 = 0.3;

/// Returns the new trust for the *old* memory in a contradiction pair,
/// given the classified topology and the semantic drift between old and
/// new.
///
/// `REFINEMENT` and `TEMPORAL` never change trust; only `CONFLICT` and
/// `REVISION` decay it, at different rates.
#[must_use]
pub fn evolve(old_trust: f32, topology: Topology, drift: f32) -> f32 {
    let drift = drift.clamp(0.0, 1.0);
    match topology {
        Topology::Conflict => (old_trust * (1.0 - CONFLICT_LAMBDA * drift)).max(TRUST_FLOOR),
        Topology::Revision => (old_trust * (1.0 - REVISION_LAMBDA * drift)).max(TRUST_FLOOR),
        Topology::Refinement | Topology::Temporal => old_trust,
    }
}

/// Reinforces trust on a near-duplicate insertion (cosine >= 0.9, same
/// slot/value): `trust <- min(0.95, trust + 0.1)`.
#[must_use]
pub fn reinforce(trust: f32) -> f32 {
    (trust + 0.1).min(TRUST_CEILING)
}

/// Minimum cosine similarity for a new fact to count as a near-duplicate
/// reinforcement rather than a fresh memory.
pub const REINFORCEMENT_COSINE_THRESHOLD: f32 = 0.9;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_decays_and_respects_floor() {
        let trust = evolve(0.5, Topology::Conflict, 1.0);
        assert!((trust - 0.3).abs() < 1e-5);

        let trust = evolve(0.31, Topology::Conflict, 1.0);
        assert!(trust >= TRUST_FLOOR);
    }

    #[test]
    fn revision_decays_less_than_conflict() {
        let conflict = evolve(0.8, Topology::Conflict, 0.5);
        let revision = evolve(0.8, Topology::Revision, 0.5);
        assert!(revision > conflict);
    }

    #[test]
    fn refinement_and_temporal_never_change_trust() {
        assert!((evolve(0.6, Topology::Refinement, 0.9) - 0.6).abs() < 1e-6);
        assert!((evolve(0.6, Topology::Temporal, 0.9) - 0.6).abs() < 1e-6);
    }

    #[test]
    fn reinforcement_caps_at_ceiling() {
        assert!((reinforce(0.9) - 1.0).abs() > 0.0);
        assert!(reinforce(0.9) <= TRUST_CEILING);
        assert!((reinforce(0.9) - 0.95).abs() < 1e-5);
    }
}
