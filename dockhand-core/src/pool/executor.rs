//! Command execution on top of the connection pool

use std::sync::Arc;

use tracing::debug;

use super::{CommandOutput, ConnectionPool};
use crate::error::{PoolError, PoolResult};

/// Runs commands against pooled sessions with the scoped-lease protocol
///
/// A transport failure discards the lease so the broken session never
/// returns to the pool; any completed round-trip, nonzero exit code
/// included, returns the session for reuse.
#[derive(Clone)]
pub struct CommandExecutor {
    pool: Arc<ConnectionPool>,
}

impl CommandExecutor {
    /// Creates an executor over an existing pool
    #[must_use]
    pub fn new(pool: Arc<ConnectionPool>) -> Self {
        Self { pool }
    }

    /// Returns the underlying pool
    #[must_use]
    pub fn pool(&self) -> &Arc<ConnectionPool> {
        &self.pool
    }

    /// Executes `command` on `target`, capturing exit code, stdout,
    /// and stderr
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Connection`] when no session could be
    /// established and [`PoolError::Execution`] when the transport
    /// failed mid-command. A nonzero exit code is a normal result.
    pub async fn execute(&self, target: &str, command: &str) -> PoolResult<CommandOutput> {
        let mut lease = self.pool.acquire(target).await?;
        match lease.execute(command).await {
            Ok(output) => {
                debug!(%target, exit_code = output.exit_code, "command completed");
                Ok(output)
            }
            Err(source) => {
                lease.discard();
                Err(PoolError::Execution {
                    target: target.to_string(),
                    source,
                })
            }
        }
    }
}
