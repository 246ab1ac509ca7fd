//! Bounded per-key history series

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One recorded value in a metric series
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoryPoint {
    /// When the value was produced
    pub timestamp: DateTime<Utc>,
    /// The produced value
    pub value: Value,
}

impl HistoryPoint {
    /// Creates a point stamped with the current time
    #[must_use]
    pub fn now(value: Value) -> Self {
        Self {
            timestamp: Utc::now(),
            value,
        }
    }

    /// Whether this point falls within the inclusive bounds; an
    /// omitted bound is unconstrained
    #[must_use]
    pub fn in_range(&self, start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> bool {
        start.map_or(true, |s| self.timestamp >= s) && end.map_or(true, |e| self.timestamp <= e)
    }
}
