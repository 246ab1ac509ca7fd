//! `Dockhand` CLI - Command-line interface for the `Dockhand` dashboard core
//!
//! Provides commands for listing configured servers, running remote
//! commands through the connection pool, and collecting system and
//! Docker metrics through the TTL cache.

mod cli;
mod commands;
mod error;
mod util;

use clap::Parser;
use cli::Cli;
use dockhand_core::logging::{init_logging, LogLevel};

fn main() {
    let cli = Cli::parse();
    let config_path = cli.config.as_deref();

    if !cli.quiet {
        let level = match cli.verbose {
            0 => LogLevel::Warn,
            1 => LogLevel::Info,
            2 => LogLevel::Debug,
            _ => LogLevel::Trace,
        };
        if let Err(e) = init_logging(level) {
            eprintln!("Warning: failed to initialize logging: {e}");
        }
    }

    let result = commands::dispatch(config_path, cli.command);

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e}");
        }
        std::process::exit(e.exit_code());
    }
}
