//! `profile` command: summarizes a thread's memory state (HTTP façade's
//! `profile`, §6).

use crate::{Orchestrator, Result, ThreadId};

#[allow(clippy::print_stdout)]
pub fn cmd_profile(orchestrator: &Orchestrator, thread: &ThreadId) -> Result<()> {
    let profile = orchestrator.profile(thread)?;

    println!("thread: {}", profile.thread_id);
    println!("  belief_count: {}", profile.belief_count);
    println!("  speech_count: {}", profile.speech_count);
    println!("  average_trust: {:.2}", profile.average_trust);
    println!("  open_contradictions: {}", profile.open_contradictions);

    Ok(())
}
