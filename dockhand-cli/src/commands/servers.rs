//! List configured servers command.

use std::path::Path;

use crate::error::CliError;
use crate::util::{create_config_manager, load_servers};

/// List servers command handler
pub fn cmd_servers(config_path: Option<&Path>) -> Result<(), CliError> {
    let config_manager = create_config_manager(config_path)?;
    let servers = load_servers(&config_manager)?;

    let name_width = servers
        .iter()
        .map(|s| s.name.len())
        .max()
        .unwrap_or(4)
        .max(4);

    println!("{:<name_width$}  {:<24}  {:>5}  {}", "NAME", "HOST", "PORT", "AUTH");
    for server in &servers {
        let auth = if server.key_path.is_some() {
            "key"
        } else {
            "password"
        };
        let host = server.username.as_ref().map_or_else(
            || server.host.clone(),
            |user| format!("{user}@{}", server.host),
        );
        println!(
            "{:<name_width$}  {:<24}  {:>5}  {}",
            server.name, host, server.port, auth
        );
    }

    Ok(())
}
