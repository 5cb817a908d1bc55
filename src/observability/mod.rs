//! Structured logging and metrics (§9A ambient stack).
//!
//! `tracing` spans wrap each orchestrator stage (extract, retrieve,
//! classify, gate, disclose); verbosity is driven by `RUST_LOG` via
//! `tracing-subscriber`'s `EnvFilter`. A small `metrics`-crate counter set
//! tracks contradictions opened, gate pass/fail counts, and caveat
//! corrections — exposed for local inspection, not shipped to a remote
//! collector, since this is a single-process engine (Non-goals, §1).

mod metrics_registry;

pub use metrics_registry::EngineMetrics;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Initializes the global `tracing` subscriber from `RUST_LOG`, defaulting
/// to `info` when unset.
///
/// Safe to call more than once per process; subsequent calls are no-ops
/// (subscriber installation is idempotent via `try_init`).
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    let _ = tracing_subscriber::registry().with(filter).with(fmt_layer).try_init();
}
