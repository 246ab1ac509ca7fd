//! `Dockhand` Core Library
//!
//! This crate provides the resource-management core for the `Dockhand`
//! operations dashboard: pooled SSH connections, real-time event
//! fan-out, and a TTL cache with bounded metric history.
//!
//! # Crate Structure
//!
//! - [`pool`] - SSH connection pool with scoped leases and an idle reaper
//! - [`ssh`] - OpenSSH ControlMaster transport backing the pool
//! - [`hub`] - Event hub: client registry, subscriptions, ordered delivery
//! - [`metrics`] - TTL metrics cache and bounded FIFO history store
//! - [`config`] - Application settings and server inventory (YAML)
//! - [`error`] - Error types shared across the crate
//! - [`logging`] - `tracing` subscriber setup

#![warn(missing_docs)]

pub mod config;
pub mod error;
pub mod hub;
pub mod logging;
pub mod metrics;
pub mod pool;
pub mod ssh;
mod sync;

pub use config::{AppConfig, ConfigManager, DashboardSettings, ServerConfig};
pub use error::{ConfigError, HubError, PoolError, SessionError, SocketError};
pub use hub::{ClientId, EventHub, HubConfig, HubStatus, PushMessage, PushSocket};
pub use metrics::{CacheConfig, HistoryPoint, MetricsStore};
pub use pool::{
    CommandExecutor, CommandOutput, ConnectionLease, ConnectionPool, Connector, PoolConfig,
    RemoteSession,
};
pub use ssh::SshConnector;
