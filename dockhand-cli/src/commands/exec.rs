//! Run a remote command through the connection pool.

use std::io::Write as _;
use std::path::Path;

use crate::error::CliError;
use crate::util::{create_config_manager, create_executor, find_server, load_servers};

/// Exec command handler
pub fn cmd_exec(config_path: Option<&Path>, server: &str, command: &str) -> Result<(), CliError> {
    let config_manager = create_config_manager(config_path)?;
    let servers = load_servers(&config_manager)?;
    find_server(&servers, server)?;

    let runtime = super::create_runtime()?;
    let output = runtime.block_on(async {
        let executor = create_executor(&config_manager, servers)?;
        let output = executor.execute(server, command).await?;
        executor.pool().shutdown().await;
        Ok::<_, CliError>(output)
    })?;

    if !output.stdout.is_empty() {
        print!("{}", output.stdout);
        let _ = std::io::stdout().flush();
    }
    if !output.stderr.is_empty() {
        eprint!("{}", output.stderr);
    }
    if !output.success() {
        return Err(CliError::CommandFailed(output.exit_code));
    }

    Ok(())
}
