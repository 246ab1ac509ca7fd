//! Property tests for history points and range filtering

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use serde_json::json;

use dockhand_core::HistoryPoint;

fn point(secs: i64) -> HistoryPoint {
    HistoryPoint {
        timestamp: Utc.timestamp_opt(secs, 0).single().expect("timestamp"),
        value: json!(secs),
    }
}

proptest! {
    /// Property: a point is always inside the unbounded range
    #[test]
    fn unbounded_range_contains_everything(secs in 0i64..4_000_000_000) {
        prop_assert!(point(secs).in_range(None, None));
    }

    /// Property: a point is inside [t, t] exactly at its own timestamp
    #[test]
    fn degenerate_range_matches_only_itself(
        secs in 1i64..4_000_000_000,
        offset in 1i64..1000,
    ) {
        let bound = Utc.timestamp_opt(secs, 0).single();
        prop_assert!(point(secs).in_range(bound, bound));
        prop_assert!(!point(secs - offset).in_range(bound, bound));
        prop_assert!(!point(secs + offset).in_range(bound, bound));
    }

    /// Property: widening a bound never excludes a previously
    /// included point
    #[test]
    fn widening_bounds_is_monotone(
        secs in 1000i64..4_000_000_000,
        start_off in 0i64..1000,
        widen in 1i64..1000,
    ) {
        let p = point(secs);
        let tight = Utc.timestamp_opt(secs - start_off, 0).single();
        let wide = Utc.timestamp_opt(secs - start_off - widen, 0).single();
        if p.in_range(tight, None) {
            prop_assert!(p.in_range(wide, None));
        }
    }

    /// Property: serialization round-trips timestamp and value
    #[test]
    fn history_point_serde_round_trips(secs in 0i64..4_000_000_000) {
        let p = point(secs);
        let text = serde_json::to_string(&p).expect("serialize");
        let back: HistoryPoint = serde_json::from_str(&text).expect("deserialize");
        prop_assert_eq!(back.timestamp, p.timestamp);
        prop_assert_eq!(back.value, p.value);
    }
}
