//! Remote session and connector capability traits
//!
//! The pool is transport-agnostic: anything that can run a command and
//! answer a liveness probe can be pooled. The production implementation
//! lives in [`crate::ssh`]; tests inject in-memory fakes.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::{PoolResult, SessionResult};

/// Result of one remote command round-trip
///
/// A nonzero exit code is a normal result, not an error; callers
/// inspect `exit_code` themselves.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CommandOutput {
    /// Process exit code (`-1` when the transport reported none)
    pub exit_code: i32,
    /// Captured standard output
    pub stdout: String,
    /// Captured standard error
    pub stderr: String,
}

impl CommandOutput {
    /// Returns whether the command exited with code zero
    #[must_use]
    pub const fn success(&self) -> bool {
        self.exit_code == 0
    }
}

/// A live handle to a remote endpoint capable of executing commands
#[async_trait]
pub trait RemoteSession: Send {
    /// Executes a command over the session, capturing exit code and
    /// both output streams
    ///
    /// # Errors
    ///
    /// Returns a [`crate::error::SessionError`] only for transport
    /// failures; a nonzero exit code is a successful round-trip.
    async fn execute(&mut self, command: &str) -> SessionResult<CommandOutput>;

    /// Cheap liveness probe
    ///
    /// Returns `false` when the session is no longer usable. Callers
    /// branch on the result rather than treating a failed no-op
    /// command as control flow.
    async fn is_alive(&mut self) -> bool;

    /// Tears the session down
    ///
    /// # Errors
    ///
    /// Close failures are reported so callers can log them; they are
    /// never fatal to the pool.
    fn close(&mut self) -> SessionResult<()>;
}

/// Creates new sessions for a target on pool misses
#[async_trait]
pub trait Connector: Send + Sync {
    /// Establishes a fresh session to `target`
    ///
    /// May block on network I/O. Failures are surfaced to the
    /// `acquire` caller and never retried by the pool.
    ///
    /// # Errors
    ///
    /// Returns [`crate::error::PoolError::Connection`] when the
    /// session cannot be established, or
    /// [`crate::error::PoolError::UnknownTarget`] for targets missing
    /// from the inventory.
    async fn connect(&self, target: &str) -> PoolResult<Box<dyn RemoteSession>>;
}
