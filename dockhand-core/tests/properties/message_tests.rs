//! Property tests for the push wire formats

use proptest::prelude::*;
use serde_json::{json, Value};

use dockhand_core::hub::{ControlMessage, PushMessage};

fn event_type() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_]{0,30}".prop_map(|s| s.to_string())
}

proptest! {
    /// Property: the envelope's "type" field always equals the event
    /// type it was built with
    #[test]
    fn envelope_type_matches_event_type(
        event in event_type(),
        n in any::<i64>(),
    ) {
        let msg = PushMessage::new(&event, json!({"n": n}));
        let value: Value = serde_json::to_value(&msg).expect("serialize");
        prop_assert_eq!(value["type"].as_str(), Some(event.as_str()));
        prop_assert_eq!(value["data"]["n"].as_i64(), Some(n));
        prop_assert!(value["timestamp"].is_string());
    }

    /// Property: subscribe frames parse for any event type string
    #[test]
    fn subscribe_frames_parse(event in event_type()) {
        let text = json!({"type": "subscribe", "event_type": event}).to_string();
        let parsed: ControlMessage = serde_json::from_str(&text).expect("parse");
        prop_assert_eq!(parsed, ControlMessage::Subscribe { event_type: event });
    }

    /// Property: unrecognized control types never fail to parse
    #[test]
    fn unrecognized_types_map_to_unknown(word in "[a-z][a-z0-9_]{0,20}") {
        prop_assume!(!matches!(word.as_str(), "ping" | "subscribe" | "unsubscribe"));
        let text = json!({"type": word}).to_string();
        let parsed: ControlMessage = serde_json::from_str(&text).expect("parse");
        prop_assert_eq!(parsed, ControlMessage::Unknown);
    }
}
