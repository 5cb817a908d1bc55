//! Contradiction ledger commands: `ledger open`, `ledger resolve` (HTTP
//! façade's `ledger.open`/`ledger.resolve`, §6).

use crate::models::{ContradictionEntry, LedgerId, ResolutionMethod};
use crate::{Orchestrator, Result, ThreadId};
use clap::Subcommand;

/// `ledger` subcommands.
#[derive(Debug, Subcommand)]
pub enum LedgerAction {
    /// Lists every currently-unresolved contradiction for a thread.
    Open {
        /// The thread to inspect.
        thread: String,
    },
    /// Resolves an open ledger entry.
    Resolve {
        /// The thread the ledger entry belongs to.
        thread: String,
        /// The ledger entry id to resolve.
        ledger_id: String,
        /// How the entry was resolved: `user`, `recency`, or `superseded`.
        #[arg(long, default_value = "user")]
        method: String,
    },
}

/// Parses a resolution method string, defaulting to user clarification for
/// an unrecognized value.
fn parse_resolution_method(s: &str) -> ResolutionMethod {
    match s.to_lowercase().as_str() {
        "recency" => ResolutionMethod::Recency,
        "superseded" => ResolutionMethod::Superseded,
        _ => ResolutionMethod::UserClarification,
    }
}

#[allow(clippy::print_stdout)]
pub fn dispatch(orchestrator: &Orchestrator, action: &LedgerAction) -> Result<()> {
    match action {
        LedgerAction::Open { thread } => {
            let entries = orchestrator.open_contradictions(&ThreadId::new(thread.as_str()))?;
            print_entries(&entries);
            Ok(())
        }
        LedgerAction::Resolve { thread, ledger_id, method } => {
            let thread_id = ThreadId::new(thread.as_str());
            let ledger_id = LedgerId::from(ledger_id.clone());
            orchestrator.resolve_contradiction(&thread_id, &ledger_id, parse_resolution_method(method))?;
            println!("resolved {ledger_id}");
            Ok(())
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_entries(entries: &[ContradictionEntry]) {
    if entries.is_empty() {
        println!("(no open contradictions)");
        return;
    }
    for entry in entries {
        println!(
            "{}  {}  drift={:.2}  {}",
            entry.ledger_id, entry.topology, entry.drift, entry.summary
        );
    }
}
