//! `send` command: feeds one turn through the orchestrator and prints the
//! answer (HTTP façade's `send`, §6).

use crate::{Orchestrator, Result, ThreadId};

#[allow(clippy::print_stdout)]
pub fn cmd_send(orchestrator: &Orchestrator, thread: &ThreadId, message: &str) -> Result<()> {
    let outcome = orchestrator.handle_turn(thread, message)?;

    println!("{}", outcome.answer);
    println!("  response_type: {}", outcome.response_type);
    println!("  gates_passed: {}", outcome.gates_passed);
    if let Some(reason) = &outcome.gate_reason {
        println!("  gate_reason: {reason}");
    }
    if !outcome.metadata.topologies_recorded.is_empty() {
        let topologies: Vec<&str> = outcome.metadata.topologies_recorded.iter().map(|t| t.as_str()).collect();
        println!("  topologies_recorded: {}", topologies.join(", "));
    }

    Ok(())
}
