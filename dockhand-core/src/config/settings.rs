//! Dashboard settings and server inventory types

use std::time::Duration;

use secrecy::SecretString;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ConfigResult};

/// Default SSH port for servers that do not specify one
pub const DEFAULT_SSH_PORT: u16 = 22;

/// Top-level application configuration
///
/// Combines the dashboard tunables from `config.yaml` with the server
/// inventory from `servers.yaml`.
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Dashboard tunables
    pub dashboard: DashboardSettings,
    /// Configured remote servers
    pub servers: Vec<ServerConfig>,
}

impl AppConfig {
    /// Looks up a server by name
    #[must_use]
    pub fn server(&self, name: &str) -> Option<&ServerConfig> {
        self.servers.iter().find(|s| s.name == name)
    }
}

/// Tunables for the pool, hub, and cache subsystems
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardSettings {
    /// Connection pool settings
    pub pool: PoolSettings,
    /// Event hub settings
    pub hub: HubSettings,
    /// Metrics cache settings
    pub cache: CacheSettings,
}

/// Connection pool tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolSettings {
    /// Maximum idle connections retained per target
    pub max_connections: usize,
    /// Seconds between idle-reaper runs
    pub reap_interval_secs: u64,
    /// Seconds an idle connection may sit unused before reaping
    pub max_idle_secs: u64,
}

impl Default for PoolSettings {
    fn default() -> Self {
        Self {
            max_connections: 10,
            reap_interval_secs: 300,
            max_idle_secs: 600,
        }
    }
}

/// Event hub tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HubSettings {
    /// Seconds between client liveness sweeps; clients silent for
    /// more than twice this are dropped
    pub ping_interval_secs: u64,
}

impl Default for HubSettings {
    fn default() -> Self {
        Self {
            ping_interval_secs: 30,
        }
    }
}

/// Metrics cache tunables
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Default time-to-live for cached metric values, in seconds
    pub ttl_secs: u64,
    /// Seconds between expiry sweeps
    pub sweep_interval_secs: u64,
    /// Maximum entries retained per history series
    pub history_max: usize,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            ttl_secs: 60,
            sweep_interval_secs: 300,
            history_max: 1000,
        }
    }
}

impl CacheSettings {
    /// Returns the configured TTL as a [`Duration`]
    #[must_use]
    pub const fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

/// A single remote server in the inventory
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Unique name used as the pool target
    pub name: String,
    /// Hostname or IP address
    pub host: String,
    /// SSH port
    #[serde(default = "default_port")]
    pub port: u16,
    /// SSH username
    #[serde(default)]
    pub username: Option<String>,
    /// Path to an SSH private key; `~` is expanded on load
    #[serde(default)]
    pub key_path: Option<String>,
    /// SSH password, used via `sshpass` when no key is available
    #[serde(default, skip_serializing)]
    pub password: Option<SecretString>,
}

const fn default_port() -> u16 {
    DEFAULT_SSH_PORT
}

impl ServerConfig {
    /// Validates the server entry, returning a descriptive error for
    /// missing or contradictory fields
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the name or host is empty
    /// or no authentication method is configured.
    pub fn validate(&self) -> ConfigResult<()> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid("server name must not be empty".into()));
        }
        if self.host.trim().is_empty() {
            return Err(ConfigError::Invalid(format!(
                "server {} has no host",
                self.name
            )));
        }
        if self.key_path.is_none() && self.password.is_none() {
            return Err(ConfigError::Invalid(format!(
                "server {} needs either key_path or password",
                self.name
            )));
        }
        Ok(())
    }

    /// Returns the key path with `~` expanded, if configured
    #[must_use]
    pub fn expanded_key_path(&self) -> Option<String> {
        self.key_path
            .as_deref()
            .map(|p| shellexpand::tilde(p).into_owned())
    }
}
