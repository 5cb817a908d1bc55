//! Local-inspection metrics: a Prometheus recorder installed once per
//! process, plus named counters the orchestrator increments at each stage.
//!
//! No push/scrape exporter is wired up — the heavier distributed-tracing
//! plumbing a multi-service deployment needs is dropped here (DESIGN.md);
//! `render()` is enough for a CLI subcommand or a local debug endpoint to
//! print the current counters.

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use std::sync::OnceLock;

static HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Named counters the orchestrator and its components increment.
///
/// A thin, stateless wrapper around the globally installed `metrics`
/// recorder: cloning is free, there is nothing to lock.
#[derive(Debug, Clone, Copy, Default)]
pub struct EngineMetrics;

impl EngineMetrics {
    /// Installs the process-wide Prometheus recorder. Idempotent: later
    /// calls reuse the handle installed by the first.
    pub fn install() -> Self {
        HANDLE.get_or_init(|| {
            PrometheusBuilder::new()
                .install_recorder()
                .expect("prometheus recorder installs exactly once per process")
        });
        Self
    }

    /// Renders the current snapshot of all counters/gauges as Prometheus
    /// text exposition format, for local inspection (e.g. a CLI
    /// subcommand), or an empty string if metrics were never installed.
    #[must_use]
    pub fn render() -> String {
        HANDLE.get().map(PrometheusHandle::render).unwrap_or_default()
    }

    /// A contradiction was opened by the classifier/orchestrator.
    pub fn contradiction_opened(&self, topology: &'static str) {
        metrics::counter!("crt_contradictions_opened_total", "topology" => topology).increment(1);
    }

    /// A reconstruction-gate decision was made.
    pub fn gate_decision(&self, kind: &'static str, passed: bool) {
        let outcome = if passed { "pass" } else { "fail" };
        metrics::counter!("crt_gate_decisions_total", "kind" => kind, "outcome" => outcome).increment(1);
    }

    /// The disclosure engine had to mechanically insert a caveat the
    /// generator's answer omitted.
    pub fn caveat_correction(&self) {
        metrics::counter!("crt_caveat_corrections_total").increment(1);
    }

    /// A turn's response mode, for a coarse distribution over BELIEF /
    /// SPEECH / UNCERTAINTY.
    pub fn response_mode(&self, mode: &'static str) {
        metrics::counter!("crt_response_mode_total", "mode" => mode).increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn install_is_idempotent() {
        let first = EngineMetrics::install();
        let second = EngineMetrics::install();
        first.gate_decision("factual", true);
        second.caveat_correction();
    }
}
