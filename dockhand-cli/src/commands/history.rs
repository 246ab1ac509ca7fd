//! Sample system metrics repeatedly and print the recorded series.

use std::path::Path;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dockhand_core::metrics::simple_key;
use dockhand_core::{CacheConfig, MetricsStore};

use crate::cli::MetricKind;
use crate::error::CliError;
use crate::util::{create_config_manager, create_executor, find_server, load_servers};

/// History command handler
///
/// Collects `samples` system readings `interval` seconds apart with a
/// zero TTL so every reading lands in the history series, then prints
/// the series as JSON lines. `since` and `until` bound the printed
/// range inclusively.
pub fn cmd_history(
    config_path: Option<&Path>,
    server: &str,
    samples: usize,
    interval: u64,
    since: Option<DateTime<Utc>>,
    until: Option<DateTime<Utc>>,
) -> Result<(), CliError> {
    if samples == 0 {
        return Err(CliError::Metrics("--samples must be at least 1".to_string()));
    }
    let config_manager = create_config_manager(config_path)?;
    let servers = load_servers(&config_manager)?;
    find_server(&servers, server)?;
    let settings = config_manager
        .load_dashboard_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;

    let runtime = super::create_runtime()?;
    let points = runtime.block_on(async {
        let executor = create_executor(&config_manager, servers)?;
        let store = MetricsStore::new(CacheConfig::from(&settings.cache));
        let key = simple_key("system", server);

        for i in 0..samples {
            if i > 0 {
                tokio::time::sleep(Duration::from_secs(interval)).await;
            }
            super::metrics::collect(
                &executor,
                &store,
                Duration::ZERO,
                server,
                MetricKind::System,
                None,
            )
            .await?;
        }

        let points: Vec<_> = store.get_history(&key, since, until).collect();
        store.shutdown().await;
        executor.pool().shutdown().await;
        Ok::<_, CliError>(points)
    })?;

    for point in points {
        let line = serde_json::to_string(&point)
            .map_err(|e| CliError::Metrics(format!("Failed to render history: {e}")))?;
        println!("{line}");
    }
    Ok(())
}
