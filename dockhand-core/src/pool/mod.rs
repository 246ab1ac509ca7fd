//! Connection pool with scoped leases and idle reclamation
//!
//! The pool keeps up to `max_connections` idle sessions per target and
//! lends them out as [`ConnectionLease`] guards. Returning a lease
//! pushes the session back onto the idle list (or closes it when the
//! list is full); a background reaper closes sessions idle beyond
//! `max_idle_time`. Dead sessions are detected by an explicit probe on
//! reuse and replaced via the injected [`Connector`].

mod executor;
mod session;

pub use executor::CommandExecutor;
pub use session::{CommandOutput, Connector, RemoteSession};

use std::collections::HashMap;
use std::ops::{Deref, DerefMut};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};

use crate::config::PoolSettings;
use crate::error::PoolResult;
use crate::sync::lock;

/// Default maximum idle connections retained per target
pub const DEFAULT_MAX_CONNECTIONS: usize = 10;

/// Default interval between idle-reaper runs (seconds)
pub const DEFAULT_REAP_INTERVAL_SECS: u64 = 300;

/// Default idle age after which a connection is reaped (seconds)
pub const DEFAULT_MAX_IDLE_SECS: u64 = 600;

/// Connection pool tunables
#[derive(Debug, Clone, Copy)]
pub struct PoolConfig {
    /// Maximum idle sessions retained per target
    pub max_connections: usize,
    /// Interval between idle-reaper runs
    pub reap_interval: Duration,
    /// Idle age after which a session is closed by the reaper
    pub max_idle_time: Duration,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            max_connections: DEFAULT_MAX_CONNECTIONS,
            reap_interval: Duration::from_secs(DEFAULT_REAP_INTERVAL_SECS),
            max_idle_time: Duration::from_secs(DEFAULT_MAX_IDLE_SECS),
        }
    }
}

impl PoolConfig {
    /// Creates a config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the per-target idle capacity
    #[must_use]
    pub const fn with_max_connections(mut self, max: usize) -> Self {
        self.max_connections = max;
        self
    }

    /// Sets the reaper interval
    #[must_use]
    pub const fn with_reap_interval(mut self, interval: Duration) -> Self {
        self.reap_interval = interval;
        self
    }

    /// Sets the maximum idle age
    #[must_use]
    pub const fn with_max_idle_time(mut self, max_idle: Duration) -> Self {
        self.max_idle_time = max_idle;
        self
    }
}

impl From<&PoolSettings> for PoolConfig {
    fn from(settings: &PoolSettings) -> Self {
        Self {
            max_connections: settings.max_connections,
            reap_interval: Duration::from_secs(settings.reap_interval_secs),
            max_idle_time: Duration::from_secs(settings.max_idle_secs),
        }
    }
}

/// An idle session together with its last-use timestamp
struct IdleConnection {
    session: Box<dyn RemoteSession>,
    last_used: Instant,
}

/// Shared pool state, behind the pool's single coarse lock
struct PoolInner {
    idle: Mutex<HashMap<String, Vec<IdleConnection>>>,
    connector: Arc<dyn Connector>,
    config: PoolConfig,
}

impl PoolInner {
    /// Returns a session to the idle list, or closes it when the
    /// target's idle set is already at capacity
    fn release(&self, target: &str, session: Box<dyn RemoteSession>) {
        let excess = {
            let mut idle = lock(&self.idle);
            let list = idle.entry(target.to_string()).or_default();
            if list.len() < self.config.max_connections {
                list.push(IdleConnection {
                    session,
                    last_used: Instant::now(),
                });
                debug!(%target, idle = list.len(), "returned connection to pool");
                None
            } else {
                Some(session)
            }
        };
        if let Some(mut session) = excess {
            debug!(%target, "idle list full, closing returned connection");
            if let Err(e) = session.close() {
                warn!(%target, error = %e, "error closing surplus connection");
            }
        }
    }

    /// Closes and removes every idle session older than `max_idle_time`
    fn reap_idle(&self) {
        let max_idle = self.config.max_idle_time;
        let mut expired: Vec<(String, Box<dyn RemoteSession>)> = Vec::new();
        {
            let mut idle = lock(&self.idle);
            for (target, list) in idle.iter_mut() {
                let mut kept = Vec::with_capacity(list.len());
                for conn in list.drain(..) {
                    if conn.last_used.elapsed() > max_idle {
                        expired.push((target.clone(), conn.session));
                    } else {
                        kept.push(conn);
                    }
                }
                *list = kept;
            }
            idle.retain(|_, list| !list.is_empty());
        }
        // Closing happens outside the lock; one bad close must not
        // stop the rest of the sweep.
        for (target, mut session) in expired {
            match session.close() {
                Ok(()) => debug!(%target, "closed idle connection"),
                Err(e) => error!(%target, error = %e, "error closing idle connection"),
            }
        }
    }
}

/// Pool of reusable remote sessions, keyed by target
///
/// Construction spawns the idle reaper; call [`ConnectionPool::shutdown`]
/// to stop it and close any remaining idle sessions.
pub struct ConnectionPool {
    inner: Arc<PoolInner>,
    stop_tx: mpsc::Sender<()>,
    reaper: Mutex<Option<JoinHandle<()>>>,
}

impl ConnectionPool {
    /// Creates a pool around the given connector and starts the reaper
    #[must_use]
    pub fn new(connector: Arc<dyn Connector>, config: PoolConfig) -> Self {
        let inner = Arc::new(PoolInner {
            idle: Mutex::new(HashMap::new()),
            connector,
            config,
        });

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let reaper_inner = Arc::clone(&inner);
        let reaper = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.reap_interval);
            // the first tick of a tokio interval fires immediately
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = ticker.tick() => reaper_inner.reap_idle(),
                }
            }
        });

        Self {
            inner,
            stop_tx,
            reaper: Mutex::new(Some(reaper)),
        }
    }

    /// Acquires a session for `target` as a scoped lease
    ///
    /// Pops the most recently returned idle session and probes it; a
    /// dead session is closed and replaced by a fresh connect. The
    /// connect is never retried here.
    ///
    /// # Errors
    ///
    /// Propagates the connector's [`crate::error::PoolError`] when a
    /// new session is needed and cannot be established.
    pub async fn acquire(&self, target: &str) -> PoolResult<ConnectionLease> {
        let popped = lock(&self.inner.idle)
            .get_mut(target)
            .and_then(Vec::pop);

        let reused = match popped {
            Some(mut idle) => {
                // probe outside the lock; connects and probes must not
                // serialize unrelated acquires
                if idle.session.is_alive().await {
                    debug!(%target, "reusing pooled connection");
                    Some(idle.session)
                } else {
                    debug!(%target, "pooled connection is dead, discarding");
                    if let Err(e) = idle.session.close() {
                        warn!(%target, error = %e, "error closing dead connection");
                    }
                    None
                }
            }
            None => None,
        };

        let session = match reused {
            Some(session) => session,
            None => {
                let session = self.inner.connector.connect(target).await?;
                debug!(%target, "created new connection");
                session
            }
        };

        Ok(ConnectionLease {
            pool: Arc::clone(&self.inner),
            target: target.to_string(),
            session: Some(session),
        })
    }

    /// Number of idle sessions currently held for `target`
    #[must_use]
    pub fn idle_count(&self, target: &str) -> usize {
        lock(&self.inner.idle).get(target).map_or(0, Vec::len)
    }

    /// Stops the reaper and closes every idle session
    pub async fn shutdown(&self) {
        let _ = self.stop_tx.send(()).await;
        let handle = lock(&self.reaper).take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }

        let drained: Vec<(String, Vec<IdleConnection>)> =
            lock(&self.inner.idle).drain().collect();
        for (target, list) in drained {
            for mut conn in list {
                if let Err(e) = conn.session.close() {
                    warn!(%target, error = %e, "error closing connection on shutdown");
                }
            }
        }
    }
}

/// Scoped borrow of a pooled session
///
/// Dropping the lease runs the return-or-close path exactly once:
/// the session goes back to the idle list when there is room, and is
/// closed otherwise. After a transport fault, call
/// [`ConnectionLease::discard`] instead so the broken session is never
/// offered to another caller.
pub struct ConnectionLease {
    pool: Arc<PoolInner>,
    target: String,
    session: Option<Box<dyn RemoteSession>>,
}

impl ConnectionLease {
    /// Target this lease was acquired for
    #[must_use]
    pub fn target(&self) -> &str {
        &self.target
    }

    /// Consumes the lease and closes the session instead of returning
    /// it to the pool
    pub fn discard(mut self) {
        if let Some(mut session) = self.session.take() {
            debug!(target = %self.target, "discarding leased connection");
            if let Err(e) = session.close() {
                warn!(target = %self.target, error = %e, "error closing discarded connection");
            }
        }
    }
}

impl Deref for ConnectionLease {
    type Target = dyn RemoteSession;

    fn deref(&self) -> &Self::Target {
        // session is only None after take() in drop/discard
        self.session.as_deref().expect("lease already released")
    }
}

impl DerefMut for ConnectionLease {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.session.as_deref_mut().expect("lease already released")
    }
}

impl Drop for ConnectionLease {
    fn drop(&mut self) {
        if let Some(session) = self.session.take() {
            self.pool.release(&self.target, session);
        }
    }
}
