//! Wire formats exchanged with push clients

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound event envelope: `{"type", "data", "timestamp"}`
///
/// `timestamp` serializes as an ISO-8601 / RFC 3339 string.
#[derive(Debug, Clone, Serialize)]
pub struct PushMessage {
    /// Event type the subscribers asked for
    #[serde(rename = "type")]
    pub event_type: String,
    /// Event payload
    pub data: Value,
    /// Time the event was broadcast
    pub timestamp: DateTime<Utc>,
}

impl PushMessage {
    /// Builds an envelope stamped with the current time
    #[must_use]
    pub fn new(event_type: &str, data: Value) -> Self {
        Self {
            event_type: event_type.to_string(),
            data,
            timestamp: Utc::now(),
        }
    }
}

/// Inbound control messages from a client
///
/// Anything with an unrecognized `type` deserializes to `Unknown` and
/// is dropped with a warning.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ControlMessage {
    /// Keepalive; updates the client's liveness timestamp
    Ping,
    /// Subscribe to an event type
    Subscribe {
        /// Event type to subscribe to
        event_type: String,
    },
    /// Unsubscribe from an event type
    Unsubscribe {
        /// Event type to unsubscribe from
        event_type: String,
    },
    /// Any unrecognized control type
    #[serde(other)]
    Unknown,
}
