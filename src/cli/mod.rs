//! Command-line interface, mirroring the operations the out-of-scope HTTP
//! façade would expose 1:1 onto the orchestrator (§6): `send`, `profile`,
//! `memory recent`/`memory search`, `ledger open`/`ledger resolve`,
//! `export`.
//!
//! `thread.reset` from the same façade contract is not implemented here: it
//! would require a destructive delete primitive the storage backend and the
//! ledger's append-only invariant (invariant 4) deliberately don't provide.

mod export;
mod ledger;
mod memory;
mod profile;
mod send;

use crate::config::RuntimeConfig;
use crate::embedding::{DeterministicEmbedder, ResilientEmbedder};
use crate::generator::{ComposingGenerator, ResilientGenerator};
use crate::storage::{SqliteStorage, StorageBackend};
use crate::{Orchestrator, Result, ThreadId};
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// A contradiction-preserving personal memory engine.
#[derive(Debug, Parser)]
#[command(name = "crt", version, about)]
pub struct Cli {
    /// Path to the `SQLite` database file. Defaults to a per-user data
    /// directory managed by `directories`.
    #[arg(long, global = true, env = "CRT_DB_PATH")]
    pub db: Option<PathBuf>,

    /// Path to a TOML config file layered over the built-in defaults.
    #[arg(long, global = true, env = "CRT_CONFIG_PATH")]
    pub config: Option<PathBuf>,

    /// The subcommand to run.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sends a user turn (statement or question) and prints the answer.
    Send {
        /// The conversation thread this turn belongs to.
        #[arg(long)]
        thread: String,
        /// The user's utterance.
        message: String,
    },
    /// Prints a summary of a thread's memory state.
    Profile {
        /// The conversation thread to summarize.
        thread: String,
    },
    /// Memory inspection commands.
    #[command(subcommand)]
    Memory(memory::MemoryAction),
    /// Contradiction ledger commands.
    #[command(subcommand)]
    Ledger(ledger::LedgerAction),
    /// Exports a full thread snapshot as JSON.
    Export {
        /// The conversation thread to export.
        thread: String,
    },
    /// Prints the current Prometheus metrics snapshot.
    Metrics,
    /// Prints a shell completion script to stdout.
    Completions {
        /// The shell to generate completions for.
        shell: Shell,
    },
}

/// Parses arguments and dispatches to the matching command handler.
///
/// # Errors
///
/// Returns an error if the engine operation fails.
pub fn run(cli: &Cli) -> Result<()> {
    if let Commands::Completions { shell } = &cli.command {
        print_completions(*shell);
        return Ok(());
    }

    let config = Arc::new(RuntimeConfig::load(cli.config.as_deref())?);
    let orchestrator = build_orchestrator(cli.db.as_deref(), &config)?;

    match &cli.command {
        Commands::Send { thread, message } => send::cmd_send(&orchestrator, &ThreadId::new(thread.as_str()), message),
        Commands::Profile { thread } => profile::cmd_profile(&orchestrator, &ThreadId::new(thread.as_str())),
        Commands::Memory(action) => memory::dispatch(&orchestrator, action, &config),
        Commands::Ledger(action) => ledger::dispatch(&orchestrator, action),
        Commands::Export { thread } => export::cmd_export(&orchestrator, &ThreadId::new(thread.as_str())),
        Commands::Metrics => {
            print_metrics();
            Ok(())
        }
        Commands::Completions { .. } => unreachable!("handled above"),
    }
}

#[allow(clippy::print_stdout)]
fn print_completions(shell: Shell) {
    let mut command = Cli::command();
    let name = command.get_name().to_string();
    clap_complete::generate(shell, &mut command, name, &mut std::io::stdout());
}

#[allow(clippy::print_stdout)]
fn print_metrics() {
    println!("{}", crate::observability::EngineMetrics::render());
}

/// Resolves the default `SQLite` path under the platform's per-user data
/// directory, creating the directory if needed.
fn default_db_path() -> PathBuf {
    directories::ProjectDirs::from("", "", "crt-engine")
        .map(|dirs| dirs.data_dir().join("crt.sqlite3"))
        .unwrap_or_else(|| PathBuf::from("crt.sqlite3"))
}

fn build_orchestrator(db: Option<&std::path::Path>, config: &Arc<RuntimeConfig>) -> Result<Orchestrator> {
    let db_path = db.map_or_else(default_db_path, std::path::Path::to_path_buf);
    if let Some(parent) = db_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }

    let backend: Arc<dyn StorageBackend> = Arc::new(SqliteStorage::open(db_path)?);
    let embedder = Arc::new(ResilientEmbedder::new(
        DeterministicEmbedder::new(),
        Duration::from_millis(config.timeouts.embedder_ms),
    ));
    let generator = Arc::new(ResilientGenerator::new(
        ComposingGenerator::new(),
        Duration::from_millis(config.timeouts.generator_ms),
    ));

    Ok(Orchestrator::new(backend, embedder, generator, config.as_ref().clone()))
}
