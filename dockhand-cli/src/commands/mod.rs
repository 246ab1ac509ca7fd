//! Command handler modules for the CLI.

mod exec;
mod history;
mod metrics;
mod servers;

use std::path::Path;

use crate::cli::Commands;
use crate::error::CliError;

/// Dispatch a CLI command to the appropriate handler.
pub fn dispatch(config_path: Option<&Path>, command: Commands) -> Result<(), CliError> {
    match command {
        Commands::Servers => servers::cmd_servers(config_path),
        Commands::Exec { server, command } => {
            exec::cmd_exec(config_path, &server, &command.join(" "))
        }
        Commands::Metrics {
            server,
            kind,
            service,
        } => metrics::cmd_metrics(config_path, &server, kind, service.as_deref()),
        Commands::History {
            server,
            samples,
            interval,
            since,
            until,
        } => history::cmd_history(config_path, &server, samples, interval, since, until),
    }
}

/// Creates the single-threaded runtime command handlers block on
pub(crate) fn create_runtime() -> Result<tokio::runtime::Runtime, CliError> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(|e| CliError::Connection(format!("Failed to create async runtime: {e}")))
}
