//! Structured logging bootstrap
//!
//! Initializes the `tracing` subscriber for the dashboard. The level can
//! be overridden at runtime with the `DOCKHAND_LOG` environment variable,
//! which accepts any `tracing_subscriber` filter directive.

use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

/// Environment variable consulted for a custom filter directive
pub const LOG_ENV_VAR: &str = "DOCKHAND_LOG";

/// Global flag indicating whether logging has been initialized
static LOGGING_INITIALIZED: AtomicBool = AtomicBool::new(false);

/// Errors that can occur during logging initialization
#[derive(Debug, Error)]
pub enum LoggingError {
    /// Failed to install the tracing subscriber
    #[error("failed to initialize logging: {0}")]
    InitializationFailed(String),

    /// Logging already initialized
    #[error("logging has already been initialized")]
    AlreadyInitialized,
}

/// Log level configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Only errors
    Error,
    /// Errors and warnings
    Warn,
    /// Errors, warnings, and info (default)
    #[default]
    Info,
    /// All above plus debug messages
    Debug,
    /// All messages including trace
    Trace,
}

impl std::str::FromStr for LogLevel {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "error" => Ok(Self::Error),
            "warn" | "warning" => Ok(Self::Warn),
            "info" => Ok(Self::Info),
            "debug" => Ok(Self::Debug),
            "trace" => Ok(Self::Trace),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for LogLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Error => write!(f, "error"),
            Self::Warn => write!(f, "warn"),
            Self::Info => write!(f, "info"),
            Self::Debug => write!(f, "debug"),
            Self::Trace => write!(f, "trace"),
        }
    }
}

/// Initializes the tracing subscriber at the given level
///
/// Should be called once at application startup; subsequent calls
/// return [`LoggingError::AlreadyInitialized`]. `DOCKHAND_LOG`
/// overrides `level` when set.
///
/// # Errors
///
/// Returns an error if logging was already initialized or the
/// subscriber cannot be installed.
pub fn init_logging(level: LogLevel) -> Result<(), LoggingError> {
    if LOGGING_INITIALIZED.swap(true, Ordering::SeqCst) {
        return Err(LoggingError::AlreadyInitialized);
    }

    let filter = EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_new(format!("dockhand_core={level},dockhand_cli={level}")))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(true)
                .with_level(true)
                .with_writer(std::io::stderr),
        )
        .try_init()
        .map_err(|e| LoggingError::InitializationFailed(e.to_string()))
}

/// Returns whether logging has been initialized
pub fn is_logging_initialized() -> bool {
    LOGGING_INITIALIZED.load(Ordering::SeqCst)
}
