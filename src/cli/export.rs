//! `export` command: prints a full thread snapshot as JSON (HTTP façade's
//! `thread.export`, §6).

use crate::{Orchestrator, Result, ThreadId};

#[allow(clippy::print_stdout)]
pub fn cmd_export(orchestrator: &Orchestrator, thread: &ThreadId) -> Result<()> {
    let export = orchestrator.export_thread(thread)?;
    println!("{}", export.to_json()?);
    Ok(())
}
