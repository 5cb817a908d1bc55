//! Memory inspection commands: `memory recent`, `memory search` (HTTP
//! façade's `memory.recent`/`memory.search`, §6).

use crate::config::RuntimeConfig;
use crate::models::{Memory, RetrievedMemory};
use crate::{Orchestrator, Result, ThreadId};
use clap::Subcommand;
use std::sync::Arc;

/// `memory` subcommands.
#[derive(Debug, Subcommand)]
pub enum MemoryAction {
    /// Prints the most recently created memories for a thread.
    Recent {
        /// The thread to inspect.
        thread: String,
        /// Maximum number of memories to print.
        #[arg(long, default_value_t = 10)]
        limit: usize,
    },
    /// Searches a thread's memories by similarity to a query.
    Search {
        /// The thread to search.
        thread: String,
        /// The search query text.
        query: String,
        /// Maximum number of results.
        #[arg(long, default_value_t = 5)]
        k: usize,
        /// Minimum trust for a memory to be eligible. Defaults to the
        /// configured retrieval floor (`theta_mem`).
        #[arg(long)]
        min_trust: Option<f32>,
    },
}

pub fn dispatch(orchestrator: &Orchestrator, action: &MemoryAction, config: &Arc<RuntimeConfig>) -> Result<()> {
    match action {
        MemoryAction::Recent { thread, limit } => {
            let memories = orchestrator.recent_memories(&ThreadId::new(thread.as_str()), *limit)?;
            print_memories(&memories);
            Ok(())
        }
        MemoryAction::Search { thread, query, k, min_trust } => {
            let min_trust = min_trust.unwrap_or(config.theta_mem);
            let retrieved = orchestrator.search_memories(&ThreadId::new(thread.as_str()), query, *k, min_trust)?;
            print_retrieved(&retrieved);
            Ok(())
        }
    }
}

#[allow(clippy::print_stdout)]
fn print_memories(memories: &[Memory]) {
    if memories.is_empty() {
        println!("(no memories)");
        return;
    }
    for memory in memories {
        println!(
            "{}  [{}]  {}  trust={:.2}",
            memory.id,
            memory.lane,
            memory.value.as_deref().unwrap_or(&memory.text),
            memory.trust
        );
    }
}

#[allow(clippy::print_stdout)]
fn print_retrieved(retrieved: &[RetrievedMemory]) {
    if retrieved.is_empty() {
        println!("(no matches)");
        return;
    }
    for hit in retrieved {
        let score = hit.score.unwrap_or(0.0);
        let flag = if hit.reintroduced_claim { "  [reintroduced_claim]" } else { "" };
        println!(
            "{}  [{}]  score={:.3}  trust={:.2}  {}{}",
            hit.memory.id,
            hit.memory.lane,
            score,
            hit.memory.trust,
            hit.memory.value.as_deref().unwrap_or(&hit.memory.text),
            flag
        );
    }
}
