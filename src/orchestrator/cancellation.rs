//! Cooperative cancellation flag checked at the embedder/generator
//! suspension boundaries (§5, §9 "coroutine-style async orchestrator ->
//! synchronous state machine plus explicit suspension... cancellation
//! delivered as a flag checked at those boundaries").

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// A cheaply cloneable flag a caller can flip from another thread to cancel
/// an in-flight turn's generator call.
///
/// Cancelling never rolls back memory writes or opened contradictions
/// (§5): those reflect what the user said, not what the assistant said.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken(Arc<AtomicBool>);

impl CancellationToken {
    /// Creates a new, not-yet-cancelled token.
    #[must_use]
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(false)))
    }

    /// Marks this token (and every clone of it) as cancelled.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Returns true if [`CancellationToken::cancel`] has been called.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_not_cancelled() {
        assert!(!CancellationToken::new().is_cancelled());
    }

    #[test]
    fn cancel_is_visible_on_clones() {
        let token = CancellationToken::new();
        let clone = token.clone();
        token.cancel();
        assert!(clone.is_cancelled());
    }
}
