//! Metrics store behavior under concurrent and repeated access

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::Barrier;

use dockhand_core::{CacheConfig, MetricsStore};

const TTL: Duration = Duration::from_secs(60);

#[tokio::test]
async fn concurrent_misses_invoke_producer_twice() {
    let store = Arc::new(MetricsStore::new(CacheConfig::new()));
    let calls = Arc::new(AtomicUsize::new(0));
    // both tasks must be inside their producer before either finishes
    let barrier = Arc::new(Barrier::new(2));

    let mut handles = Vec::new();
    for _ in 0..2 {
        let store = Arc::clone(&store);
        let calls = Arc::clone(&calls);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            store
                .get_with_cache("system:web-1:{}", TTL, || async move {
                    calls.fetch_add(1, Ordering::SeqCst);
                    barrier.wait().await;
                    Ok::<Value, String>(json!({"cpu": 12.5}))
                })
                .await
        }));
    }
    for handle in handles {
        let value = handle.await.expect("join").expect("produce");
        assert_eq!(value["cpu"], 12.5);
    }

    // no request coalescing: each miss runs its own producer
    assert_eq!(calls.load(Ordering::SeqCst), 2);
    assert_eq!(store.history_len("system:web-1:{}"), 2);
    store.shutdown().await;
}

#[tokio::test]
async fn refreshes_append_history_while_hits_do_not() {
    let store = MetricsStore::new(CacheConfig::new());

    for i in 0..3 {
        // zero TTL forces a refresh on every call
        store
            .get_with_cache("load:db-1:{}", Duration::ZERO, || async move {
                Ok::<Value, String>(json!(i))
            })
            .await
            .expect("produce");
    }
    assert_eq!(store.history_len("load:db-1:{}"), 3);

    store
        .get_with_cache("load:db-1:{}", TTL, || async {
            Ok::<Value, String>(json!(99))
        })
        .await
        .expect("produce");
    let produced = AtomicUsize::new(0);
    let hit = store
        .get_with_cache("load:db-1:{}", TTL, || async {
            produced.fetch_add(1, Ordering::SeqCst);
            Ok::<Value, String>(Value::Null)
        })
        .await
        .expect("hit");
    assert_eq!(produced.load(Ordering::SeqCst), 0);
    assert_eq!(hit, json!(99));
    assert_eq!(store.history_len("load:db-1:{}"), 4);

    let values: Vec<Value> = store
        .get_history("load:db-1:{}", None, None)
        .map(|p| p.value)
        .collect();
    assert_eq!(values, vec![json!(0), json!(1), json!(2), json!(99)]);
    store.shutdown().await;
}

#[tokio::test]
async fn producer_errors_leave_no_trace() {
    let store = MetricsStore::new(CacheConfig::new());

    let err = store
        .get_with_cache("system:web-1:{}", TTL, || async {
            Err::<Value, String>("ssh unreachable".to_string())
        })
        .await
        .unwrap_err();
    assert_eq!(err, "ssh unreachable");
    assert!(store.get_cached("system:web-1:{}").is_none());
    assert_eq!(store.history_len("system:web-1:{}"), 0);
    store.shutdown().await;
}

#[tokio::test]
async fn keys_isolate_series_from_each_other() {
    let store = MetricsStore::new(CacheConfig::new().with_history_max(2));

    for target in ["web-1", "web-2"] {
        for i in 0..3 {
            store
                .get_with_cache(
                    &format!("system:{target}:{{}}"),
                    Duration::ZERO,
                    || async move { Ok::<Value, String>(json!(i)) },
                )
                .await
                .expect("produce");
        }
    }

    for target in ["web-1", "web-2"] {
        let key = format!("system:{target}:{{}}");
        assert_eq!(store.history_len(&key), 2);
        let values: Vec<Value> = store.get_history(&key, None, None).map(|p| p.value).collect();
        // oldest entry was evicted by the cap
        assert_eq!(values, vec![json!(1), json!(2)]);
    }
    store.shutdown().await;
}
