//! Configuration management for dockhand
//!
//! Dashboard tunables live in `config.yaml`, the server inventory in
//! `servers.yaml`; both are YAML and both are optional.

mod manager;
mod settings;

pub use manager::ConfigManager;
pub use settings::{
    AppConfig, CacheSettings, DashboardSettings, HubSettings, PoolSettings, ServerConfig,
    DEFAULT_SSH_PORT,
};
