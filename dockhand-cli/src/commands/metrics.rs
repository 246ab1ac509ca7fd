//! Collect server metrics through the TTL cache.

use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

use serde_json::{json, Map, Value};

use dockhand_core::metrics::{cache_key, simple_key};
use dockhand_core::{CacheConfig, CommandExecutor, MetricsStore};

use crate::cli::MetricKind;
use crate::error::CliError;
use crate::util::{create_config_manager, create_executor, find_server, load_servers};

/// Shell probes behind the `system` metric family
const SYSTEM_COMMANDS: &[(&str, &str)] = &[
    ("cpu", "top -bn1 | grep 'Cpu(s)' | awk '{print $2 + $4}'"),
    ("memory", "free -m | awk 'NR==2{printf \"%.2f\", $3*100/$2}'"),
    ("disk", "df -h / | awk 'NR==2{print $5}' | sed 's/%//g'"),
    ("load", "uptime | awk -F'[a-z]:' '{ print $2}'"),
];

/// Metrics command handler
pub fn cmd_metrics(
    config_path: Option<&Path>,
    server: &str,
    kind: MetricKind,
    service: Option<&str>,
) -> Result<(), CliError> {
    let config_manager = create_config_manager(config_path)?;
    let servers = load_servers(&config_manager)?;
    find_server(&servers, server)?;
    let settings = config_manager
        .load_dashboard_settings()
        .map_err(|e| CliError::Config(format!("Failed to load settings: {e}")))?;
    let ttl = settings.cache.ttl();

    let runtime = super::create_runtime()?;
    let value = runtime.block_on(async {
        let executor = create_executor(&config_manager, servers)?;
        let store = MetricsStore::new(CacheConfig::from(&settings.cache));
        let value = collect(&executor, &store, ttl, server, kind, service).await;
        store.shutdown().await;
        executor.pool().shutdown().await;
        value
    })?;

    let rendered = serde_json::to_string_pretty(&value)
        .map_err(|e| CliError::Metrics(format!("Failed to render metrics: {e}")))?;
    println!("{rendered}");
    Ok(())
}

/// Collects one metric family for `server`, going through the cache
pub(crate) async fn collect(
    executor: &CommandExecutor,
    store: &MetricsStore,
    ttl: Duration,
    server: &str,
    kind: MetricKind,
    service: Option<&str>,
) -> Result<Value, CliError> {
    match kind {
        MetricKind::System => {
            store
                .get_with_cache(&simple_key("system", server), ttl, || {
                    collect_system(executor, server)
                })
                .await
        }
        MetricKind::Docker => {
            store
                .get_with_cache(&simple_key("docker", server), ttl, || {
                    collect_docker(executor, server)
                })
                .await
        }
        MetricKind::Service => {
            let name = service
                .ok_or_else(|| CliError::Metrics("--service is required for --kind service".to_string()))?;
            let mut params = BTreeMap::new();
            params.insert("service".to_string(), name.to_string());
            store
                .get_with_cache(&cache_key("service", server, &params), ttl, || {
                    collect_service(executor, server, name)
                })
                .await
        }
    }
}

async fn collect_system(executor: &CommandExecutor, server: &str) -> Result<Value, CliError> {
    let mut metrics = Map::new();
    for (metric, command) in SYSTEM_COMMANDS {
        let output = executor.execute(server, command).await?;
        if output.success() {
            metrics.insert((*metric).to_string(), parse_metric_value(&output.stdout));
        }
    }
    Ok(Value::Object(metrics))
}

async fn collect_docker(executor: &CommandExecutor, server: &str) -> Result<Value, CliError> {
    let stats = executor
        .execute(
            server,
            "docker stats --no-stream --format '{{.Name}}\t{{.CPUPerc}}\t{{.MemPerc}}\t{{.NetIO}}\t{{.BlockIO}}'",
        )
        .await?;

    let mut containers = Vec::new();
    if stats.success() {
        for line in stats.stdout.lines() {
            if let Some(container) = parse_stats_line(line) {
                containers.push(container);
            }
        }
    }
    let mut metrics = Map::new();
    metrics.insert("containers".to_string(), Value::Array(containers));

    let info = executor
        .execute(server, "docker info --format '{{json .}}'")
        .await?;
    if info.success() {
        match parse_docker_info(&info.stdout) {
            Some(summary) => {
                metrics.insert("info".to_string(), summary);
            }
            None => tracing::error!(%server, "failed to parse docker info JSON"),
        }
    }

    Ok(Value::Object(metrics))
}

async fn collect_service(
    executor: &CommandExecutor,
    server: &str,
    service: &str,
) -> Result<Value, CliError> {
    let output = executor
        .execute(
            server,
            &format!("docker stats --no-stream --format '{{{{json .}}}}' {service}"),
        )
        .await?;

    if !output.success() {
        return Ok(json!({}));
    }
    match serde_json::from_str::<Value>(&output.stdout) {
        Ok(stats) => Ok(json!({
            "cpu_usage": stats.get("CPUPerc").cloned().unwrap_or_else(|| json!("0%")),
            "memory_usage": stats.get("MemPerc").cloned().unwrap_or_else(|| json!("0%")),
            "memory_usage_raw": stats.get("MemUsage").cloned().unwrap_or_else(|| json!("")),
            "network_io": stats.get("NetIO").cloned().unwrap_or_else(|| json!("")),
            "block_io": stats.get("BlockIO").cloned().unwrap_or_else(|| json!("")),
            "pids": stats.get("PIDs").cloned().unwrap_or_else(|| json!("0")),
        })),
        Err(e) => {
            tracing::error!(%server, %service, error = %e, "failed to parse service stats JSON");
            Ok(json!({}))
        }
    }
}

/// Numeric probe output becomes a JSON number, anything else stays a
/// trimmed string
fn parse_metric_value(raw: &str) -> Value {
    let trimmed = raw.trim();
    trimmed
        .parse::<f64>()
        .ok()
        .and_then(serde_json::Number::from_f64)
        .map_or_else(|| Value::String(trimmed.to_string()), Value::Number)
}

/// Parses one tab-separated `docker stats` line
fn parse_stats_line(line: &str) -> Option<Value> {
    let mut fields = line.split('\t');
    let name = fields.next()?;
    let cpu = fields.next()?;
    let mem = fields.next()?;
    let net = fields.next()?;
    let block = fields.next()?;
    if name.is_empty() {
        return None;
    }
    Some(json!({
        "name": name,
        "cpu_usage": cpu.trim_end_matches('%'),
        "memory_usage": mem.trim_end_matches('%'),
        "network_io": net,
        "block_io": block,
    }))
}

/// Extracts the engine-wide counters from `docker info` JSON
fn parse_docker_info(raw: &str) -> Option<Value> {
    let info: Value = serde_json::from_str(raw).ok()?;
    Some(json!({
        "containers": info.get("Containers").cloned().unwrap_or_else(|| json!(0)),
        "images": info.get("Images").cloned().unwrap_or_else(|| json!(0)),
        "storage_driver": info.get("Driver").cloned().unwrap_or_else(|| json!("")),
        "running_containers": info.get("ContainersRunning").cloned().unwrap_or_else(|| json!(0)),
        "paused_containers": info.get("ContainersPaused").cloned().unwrap_or_else(|| json!(0)),
        "stopped_containers": info.get("ContainersStopped").cloned().unwrap_or_else(|| json!(0)),
    }))
}
