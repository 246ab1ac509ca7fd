//! CLI error types and exit codes.

use dockhand_core::PoolError;

/// Exit codes for CLI operations
pub mod exit_codes {
    /// General error - configuration, validation, or other non-connection errors
    pub const GENERAL_ERROR: i32 = 1;
    /// Connection failure - the server was unreachable or the remote
    /// command could not be run
    pub const CONNECTION_FAILURE: i32 = 2;
}

/// CLI error type
#[derive(Debug, thiserror::Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Server not found in the inventory
    #[error("Server not found: {0}")]
    ServerNotFound(String),

    /// Connection or remote execution failure
    #[error("Connection error: {0}")]
    Connection(String),

    /// Remote command finished with a non-zero exit code
    #[error("Command failed with exit code {0}")]
    CommandFailed(i32),

    /// Metrics collection failure
    #[error("Metrics error: {0}")]
    Metrics(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<PoolError> for CliError {
    fn from(err: PoolError) -> Self {
        match err {
            PoolError::UnknownTarget(name) => Self::ServerNotFound(name),
            PoolError::Connection { .. } | PoolError::Execution { .. } => {
                Self::Connection(err.to_string())
            }
        }
    }
}

impl CliError {
    /// Returns the appropriate exit code for this error type.
    ///
    /// Exit codes:
    /// - 0: Success (not an error)
    /// - 1: General error (configuration, validation, IO)
    /// - 2: Connection failure (unreachable server, failed remote command)
    #[must_use]
    pub const fn exit_code(&self) -> i32 {
        match self {
            Self::Connection(_) | Self::ServerNotFound(_) | Self::CommandFailed(_) => {
                exit_codes::CONNECTION_FAILURE
            }
            Self::Config(_) | Self::Metrics(_) | Self::Io(_) => exit_codes::GENERAL_ERROR,
        }
    }
}
