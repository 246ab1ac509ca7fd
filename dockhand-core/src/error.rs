//! Error types for the `dockhand` core library
//!
//! Each subsystem has its own error enum and `Result` alias. Pool and
//! executor errors propagate synchronously to the caller; hub delivery
//! errors are contained inside the hub and never surface to broadcasters.

use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the connection pool and command executor
#[derive(Debug, Error)]
pub enum PoolError {
    /// Session creation or transport-level failure. Never retried
    /// internally; surfaced to the caller as-is.
    #[error("connection to {target} failed: {message}")]
    Connection {
        /// Target the connection was attempted against
        target: String,
        /// Underlying failure description
        message: String,
    },

    /// The transport round-trip failed while a command was in flight.
    /// Distinct from a nonzero exit code, which is a normal result.
    #[error("command execution on {target} failed: {source}")]
    Execution {
        /// Target the command was issued against
        target: String,
        /// Transport-level cause
        #[source]
        source: SessionError,
    },

    /// No server with this name exists in the inventory
    #[error("unknown target: {0}")]
    UnknownTarget(String),
}

/// Result type alias for pool operations
pub type PoolResult<T> = std::result::Result<T, PoolError>;

/// Transport-level session failures, produced by `RemoteSession`
/// implementations
#[derive(Debug, Error)]
pub enum SessionError {
    /// The session process could not be spawned
    #[error("failed to spawn session process: {0}")]
    Spawn(#[source] std::io::Error),

    /// The command did not complete within the session timeout
    #[error("command timed out after {0} seconds")]
    Timeout(u64),

    /// The session produced output that is not valid UTF-8
    #[error("session output is not valid UTF-8: {0}")]
    InvalidOutput(#[from] std::string::FromUtf8Error),

    /// The underlying transport is closed or otherwise unusable
    #[error("session transport failed: {0}")]
    Transport(String),
}

/// Result type alias for session operations
pub type SessionResult<T> = std::result::Result<T, SessionError>;

/// Push-socket transport failures, produced by `PushSocket`
/// implementations
#[derive(Debug, Error)]
#[error("push socket failed: {0}")]
pub struct SocketError(pub String);

/// Errors produced by the event hub's public operations
#[derive(Debug, Error)]
pub enum HubError {
    /// The hub has been shut down and no longer accepts clients
    #[error("event hub is shut down")]
    ShutDown,
}

/// Result type alias for hub operations
pub type HubResult<T> = std::result::Result<T, HubError>;

/// Configuration loading and validation errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file does not exist
    #[error("configuration file not found: {0}")]
    NotFound(PathBuf),

    /// The configuration file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path that failed to read
        path: PathBuf,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML
    #[error("failed to parse {path}: {source}")]
    Parse {
        /// Path that failed to parse
        path: PathBuf,
        /// Underlying YAML error
        #[source]
        source: serde_yaml::Error,
    },

    /// The configuration is structurally valid but semantically wrong
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;
