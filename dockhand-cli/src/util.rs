//! Shared utility functions used across command modules.

use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dockhand_core::config::ConfigManager;
use dockhand_core::{
    CommandExecutor, ConnectionPool, PoolConfig, ServerConfig, SshConnector,
};

use crate::error::CliError;

/// Creates a `ConfigManager` using the optional custom config directory
/// from CLI args.
pub fn create_config_manager(config_path: Option<&Path>) -> Result<ConfigManager, CliError> {
    match config_path {
        Some(path) => Ok(ConfigManager::new(path)),
        None => ConfigManager::default_location()
            .map_err(|e| CliError::Config(format!("Failed to locate config: {e}"))),
    }
}

/// Loads the server inventory, failing on an empty one
pub fn load_servers(config_manager: &ConfigManager) -> Result<Vec<ServerConfig>, CliError> {
    let servers = config_manager
        .load_servers()
        .map_err(|e| CliError::Config(format!("Failed to load servers: {e}")))?;
    if servers.is_empty() {
        return Err(CliError::Config(
            "no servers configured; add entries to servers.yaml".to_string(),
        ));
    }
    Ok(servers)
}

/// Checks that `name` exists in the inventory
pub fn find_server<'a>(
    servers: &'a [ServerConfig],
    name: &str,
) -> Result<&'a ServerConfig, CliError> {
    servers
        .iter()
        .find(|s| s.name == name)
        .ok_or_else(|| CliError::ServerNotFound(name.to_string()))
}

/// Parses an RFC 3339 timestamp from a CLI flag
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, String> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| format!("invalid timestamp '{value}': {e}"))
}

/// Wires a pool and executor over the SSH transport for the given
/// inventory, using the dashboard's pool tunables
///
/// Must be called from within a Tokio runtime; the pool spawns its
/// idle reaper on construction.
pub fn create_executor(
    config_manager: &ConfigManager,
    servers: Vec<ServerConfig>,
) -> Result<CommandExecutor, CliError> {
    let settings = config_manager
        .load_dashboard_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;
    let connector = Arc::new(SshConnector::new(servers));
    let pool = Arc::new(ConnectionPool::new(connector, PoolConfig::from(&settings.pool)));
    Ok(CommandExecutor::new(pool))
}
