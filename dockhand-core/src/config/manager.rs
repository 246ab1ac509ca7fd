//! Configuration loading from `config.yaml` and `servers.yaml`

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::settings::{AppConfig, DashboardSettings, ServerConfig};
use crate::error::{ConfigError, ConfigResult};

/// File holding dashboard tunables
const CONFIG_FILE: &str = "config.yaml";

/// File holding the server inventory
const SERVERS_FILE: &str = "servers.yaml";

/// Loads and validates dashboard configuration from a directory
///
/// `config.yaml` is optional (defaults apply when absent); `servers.yaml`
/// is optional too, yielding an empty inventory. Both files are
/// validated after parsing.
#[derive(Debug, Clone)]
pub struct ConfigManager {
    config_dir: PathBuf,
}

impl ConfigManager {
    /// Creates a manager rooted at an explicit directory
    #[must_use]
    pub fn new(config_dir: impl Into<PathBuf>) -> Self {
        Self {
            config_dir: config_dir.into(),
        }
    }

    /// Creates a manager rooted at the platform config directory
    /// (`~/.config/dockhand` on Linux)
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when the platform config
    /// directory cannot be determined.
    pub fn default_location() -> ConfigResult<Self> {
        let base = dirs::config_dir()
            .ok_or_else(|| ConfigError::Invalid("cannot determine config directory".into()))?;
        Ok(Self::new(base.join("dockhand")))
    }

    /// Returns the directory this manager reads from
    #[must_use]
    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    /// Loads and validates the full application configuration
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] when a file cannot be read or parsed,
    /// or a server entry fails validation.
    pub fn load(&self) -> ConfigResult<AppConfig> {
        let dashboard = self.load_dashboard_settings()?;
        let servers = self.load_servers()?;
        info!(
            servers = servers.len(),
            dir = %self.config_dir.display(),
            "configuration loaded"
        );
        Ok(AppConfig { dashboard, servers })
    }

    /// Loads dashboard tunables, falling back to defaults when the
    /// file is absent
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on read or parse failure.
    pub fn load_dashboard_settings(&self) -> ConfigResult<DashboardSettings> {
        let path = self.config_dir.join(CONFIG_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(DashboardSettings::default());
        }
        let raw = read_file(&path)?;
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })
    }

    /// Loads and validates the server inventory
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] on read/parse failure, duplicate
    /// server names, or an invalid server entry.
    pub fn load_servers(&self) -> ConfigResult<Vec<ServerConfig>> {
        let path = self.config_dir.join(SERVERS_FILE);
        if !path.exists() {
            debug!(path = %path.display(), "no servers file, empty inventory");
            return Ok(Vec::new());
        }
        let raw = read_file(&path)?;
        let servers: Vec<ServerConfig> =
            serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse { path, source })?;

        for server in &servers {
            server.validate()?;
        }
        let mut names: Vec<&str> = servers.iter().map(|s| s.name.as_str()).collect();
        names.sort_unstable();
        names.dedup();
        if names.len() != servers.len() {
            return Err(ConfigError::Invalid(
                "duplicate server names in inventory".into(),
            ));
        }
        Ok(servers)
    }
}

fn read_file(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })
}
