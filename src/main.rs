//! Binary entry point for crt-engine.
//!
//! This binary provides the CLI interface for the contradiction-preserving
//! personal memory engine.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(missing_docs)]
#![allow(clippy::print_stderr)]

use clap::Parser;
use crt_engine::cli::Cli;

/// Main entry point.
fn main() {
    let _ = dotenvy::dotenv();
    crt_engine::observability::init_logging();

    let cli = Cli::parse();
    if let Err(err) = crt_engine::cli::run(&cli) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}
