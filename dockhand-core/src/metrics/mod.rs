//! Metrics cache and history store
//!
//! A short-TTL cache absorbs repeated reads of expensive remote
//! queries, and every successful refresh appends to a bounded per-key
//! history series for trend queries. The producer is injected, so the
//! store never issues remote commands itself.

mod history;
mod key;

pub use history::HistoryPoint;
pub use key::{cache_key, simple_key};

use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info};

use crate::config::CacheSettings;
use crate::sync::lock;

/// Default interval between expiry sweeps (seconds)
pub const DEFAULT_SWEEP_INTERVAL_SECS: u64 = 300;

/// Default cap on entries per history series
pub const DEFAULT_HISTORY_MAX: usize = 1000;

/// Cache and history tunables
#[derive(Debug, Clone, Copy)]
pub struct CacheConfig {
    /// Interval between expiry sweeps
    pub sweep_interval: Duration,
    /// Maximum entries retained per history series
    pub history_max: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            sweep_interval: Duration::from_secs(DEFAULT_SWEEP_INTERVAL_SECS),
            history_max: DEFAULT_HISTORY_MAX,
        }
    }
}

impl CacheConfig {
    /// Creates a config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sweep interval
    #[must_use]
    pub const fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.sweep_interval = interval;
        self
    }

    /// Sets the history cap
    #[must_use]
    pub const fn with_history_max(mut self, max: usize) -> Self {
        self.history_max = max;
        self
    }
}

impl From<&CacheSettings> for CacheConfig {
    fn from(settings: &CacheSettings) -> Self {
        Self {
            sweep_interval: Duration::from_secs(settings.sweep_interval_secs),
            history_max: settings.history_max,
        }
    }
}

/// A cached value with its production time and lifetime
struct CacheEntry {
    value: Value,
    produced_at: Instant,
    ttl: Duration,
}

impl CacheEntry {
    fn expired(&self) -> bool {
        self.produced_at.elapsed() > self.ttl
    }
}

struct StoreInner {
    cache: Mutex<HashMap<String, CacheEntry>>,
    history: Mutex<HashMap<String, VecDeque<HistoryPoint>>>,
    history_max: usize,
}

impl StoreInner {
    fn append_history(&self, key: &str, value: Value) {
        let mut history = lock(&self.history);
        let series = history.entry(key.to_string()).or_default();
        series.push_back(HistoryPoint::now(value));
        while series.len() > self.history_max {
            series.pop_front();
        }
    }

    fn sweep_expired(&self) {
        let mut cache = lock(&self.cache);
        let before = cache.len();
        cache.retain(|key, entry| {
            let keep = !entry.expired();
            if !keep {
                debug!(%key, "removed expired cache entry");
            }
            keep
        });
        let removed = before - cache.len();
        if removed > 0 {
            debug!(removed, "expiry sweep finished");
        }
    }
}

/// Time-bounded cache with bounded append-only history
///
/// Construction starts the expiry sweep; call [`MetricsStore::shutdown`]
/// to stop it.
///
/// Known limitation: there is no single-flight deduplication.
/// Concurrent callers that miss on the same key each invoke their
/// producer, and the last write wins.
pub struct MetricsStore {
    inner: Arc<StoreInner>,
    stop_tx: mpsc::Sender<()>,
    sweep: Mutex<Option<JoinHandle<()>>>,
}

impl MetricsStore {
    /// Creates a store and starts its expiry sweep
    #[must_use]
    pub fn new(config: CacheConfig) -> Self {
        let inner = Arc::new(StoreInner {
            cache: Mutex::new(HashMap::new()),
            history: Mutex::new(HashMap::new()),
            history_max: config.history_max,
        });

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let sweep_inner = Arc::clone(&inner);
        let sweep = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(config.sweep_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = ticker.tick() => sweep_inner.sweep_expired(),
                }
            }
        });

        Self {
            inner,
            stop_tx,
            sweep: Mutex::new(Some(sweep)),
        }
    }

    /// Returns the cached value for `key`, or produces, caches, and
    /// records it
    ///
    /// A non-expired hit returns without invoking `producer`; a miss
    /// or expired entry invokes it, stores the fresh value with
    /// `produced_at = now`, and appends it to the key's history.
    ///
    /// # Errors
    ///
    /// Producer failures propagate unchanged; neither the cache nor
    /// the history is touched on failure.
    pub async fn get_with_cache<F, Fut, E>(
        &self,
        key: &str,
        ttl: Duration,
        producer: F,
    ) -> Result<Value, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Value, E>>,
    {
        if let Some(value) = self.get_cached(key) {
            return Ok(value);
        }

        // Deliberately no single-flight here: concurrent misses on the
        // same key each run their producer; last write wins.
        let value = producer().await?;

        {
            let mut cache = lock(&self.inner.cache);
            cache.insert(
                key.to_string(),
                CacheEntry {
                    value: value.clone(),
                    produced_at: Instant::now(),
                    ttl,
                },
            );
        }
        self.inner.append_history(key, value.clone());
        debug!(%key, "cache refreshed");
        Ok(value)
    }

    /// Returns the non-expired cached value for `key`, dropping an
    /// expired entry on the way
    #[must_use]
    pub fn get_cached(&self, key: &str) -> Option<Value> {
        let mut cache = lock(&self.inner.cache);
        match cache.get(key) {
            Some(entry) if !entry.expired() => {
                debug!(%key, "cache hit");
                Some(entry.value.clone())
            }
            Some(_) => {
                cache.remove(key);
                None
            }
            None => None,
        }
    }

    /// Returns the history series for `key`, filtered to the inclusive
    /// `[start, end]` range
    ///
    /// The result is a snapshot: finite, restartable by calling again,
    /// never a live view of the series.
    pub fn get_history(
        &self,
        key: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> impl Iterator<Item = HistoryPoint> {
        let snapshot: Vec<HistoryPoint> = lock(&self.inner.history)
            .get(key)
            .map(|series| series.iter().cloned().collect())
            .unwrap_or_default();
        snapshot
            .into_iter()
            .filter(move |point| point.in_range(start, end))
    }

    /// Number of entries currently stored for `key`'s history
    #[must_use]
    pub fn history_len(&self, key: &str) -> usize {
        lock(&self.inner.history).get(key).map_or(0, VecDeque::len)
    }

    /// Number of live cache entries
    #[must_use]
    pub fn cache_len(&self) -> usize {
        lock(&self.inner.cache).len()
    }

    /// Empties the cache; history series are untouched
    pub fn clear(&self) {
        lock(&self.inner.cache).clear();
        info!("metrics cache cleared");
    }

    /// Stops the expiry sweep
    pub async fn shutdown(&self) {
        let _ = self.stop_tx.send(()).await;
        let sweep = lock(&self.sweep).take();
        if let Some(handle) = sweep {
            let _ = handle.await;
        }
    }
}

impl Default for MetricsStore {
    fn default() -> Self {
        Self::new(CacheConfig::default())
    }
}
