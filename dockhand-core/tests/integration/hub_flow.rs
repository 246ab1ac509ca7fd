//! Event hub flows over channel-backed fake sockets

use async_trait::async_trait;
use serde_json::json;
use tokio::sync::mpsc;

use dockhand_core::error::SocketError;
use dockhand_core::{EventHub, HubConfig, PushSocket};

/// Socket backed by a pair of channels: sent frames go out to the
/// test, and the test feeds inbound frames through the returned
/// sender. Dropping that sender reads as the peer closing.
struct ChannelSocket {
    tx: mpsc::UnboundedSender<String>,
    rx: mpsc::UnboundedReceiver<String>,
}

impl ChannelSocket {
    fn new() -> (
        Box<dyn PushSocket>,
        mpsc::UnboundedReceiver<String>,
        mpsc::UnboundedSender<String>,
    ) {
        let (tx, outbound) = mpsc::unbounded_channel();
        let (inbound, rx) = mpsc::unbounded_channel();
        (Box::new(Self { tx, rx }), outbound, inbound)
    }
}

#[async_trait]
impl PushSocket for ChannelSocket {
    async fn send(&mut self, text: &str) -> Result<(), SocketError> {
        self.tx
            .send(text.to_string())
            .map_err(|_| SocketError("receiver dropped".to_string()))
    }

    async fn receive(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    async fn close(&mut self) {}
}

#[tokio::test]
async fn subscribed_client_receives_events_in_order() {
    let hub = EventHub::new(HubConfig::new());
    let (socket, mut rx, _inbound) = ChannelSocket::new();
    let id = hub.register_client(socket).expect("register");
    hub.subscribe(id, "container_update");

    for i in 0..5 {
        let delivered = hub.broadcast_event("container_update", json!({ "seq": i }));
        assert_eq!(delivered, 1);
    }

    for i in 0..5 {
        let frame = rx.recv().await.expect("frame");
        let parsed: serde_json::Value = serde_json::from_str(&frame).expect("json");
        assert_eq!(parsed["type"], "container_update");
        assert_eq!(parsed["data"]["seq"], i);
        assert!(parsed["timestamp"].is_string());
    }

    hub.shutdown().await;
}

#[tokio::test]
async fn broadcast_skips_clients_subscribed_elsewhere() {
    let hub = EventHub::new(HubConfig::new());
    let (containers, mut rx_containers, _inbound_containers) = ChannelSocket::new();
    let (logs, mut rx_logs, _inbound_logs) = ChannelSocket::new();
    let container_client = hub.register_client(containers).expect("register");
    let log_client = hub.register_client(logs).expect("register");
    hub.subscribe(container_client, "container_update");
    hub.subscribe(log_client, "log_line");

    assert_eq!(hub.broadcast_event("container_update", json!({})), 1);

    let frame = rx_containers.recv().await.expect("frame");
    assert!(frame.contains("container_update"));

    hub.shutdown().await;
    // the log client's socket sees nothing before shutdown closes it
    assert!(rx_logs.try_recv().is_err());
}

#[tokio::test]
async fn unsubscribe_stops_delivery() {
    let hub = EventHub::new(HubConfig::new());
    let (socket, mut rx, _inbound) = ChannelSocket::new();
    let id = hub.register_client(socket).expect("register");
    hub.subscribe(id, "stats_update");

    assert_eq!(hub.broadcast_event("stats_update", json!({"n": 1})), 1);
    hub.unsubscribe(id, "stats_update");
    assert_eq!(hub.broadcast_event("stats_update", json!({"n": 2})), 0);

    let frame = rx.recv().await.expect("frame");
    assert!(frame.contains("\"n\":1"));
    hub.shutdown().await;
    assert!(rx.try_recv().is_err());
}

#[tokio::test]
async fn ping_produces_a_pong_frame() {
    let hub = EventHub::new(HubConfig::new());
    let (socket, mut rx, _inbound) = ChannelSocket::new();
    let id = hub.register_client(socket).expect("register");

    hub.handle_client_message(id, r#"{"type":"ping"}"#);

    let frame = rx.recv().await.expect("frame");
    assert_eq!(frame, r#"{"type":"pong"}"#);
    hub.shutdown().await;
}

#[tokio::test]
async fn subscribe_control_message_is_equivalent_to_direct_call() {
    let hub = EventHub::new(HubConfig::new());
    let (socket, mut rx, _inbound) = ChannelSocket::new();
    let id = hub.register_client(socket).expect("register");

    hub.handle_client_message(id, r#"{"type":"subscribe","event_type":"log_line"}"#);
    assert_eq!(hub.broadcast_event("log_line", json!({"line": "ok"})), 1);

    let frame = rx.recv().await.expect("frame");
    assert!(frame.contains("log_line"));
    hub.shutdown().await;
}

#[tokio::test]
async fn status_counts_clients_and_subscriptions() {
    let hub = EventHub::new(HubConfig::new());
    let (a, _rx_a, _inbound_a) = ChannelSocket::new();
    let (b, _rx_b, _inbound_b) = ChannelSocket::new();
    let first = hub.register_client(a).expect("register");
    let second = hub.register_client(b).expect("register");
    hub.subscribe(first, "container_update");
    hub.subscribe(second, "container_update");
    hub.subscribe(second, "log_line");

    let status = hub.status();
    assert_eq!(status.connected_clients, 2);
    assert_eq!(status.subscriptions.get("container_update"), Some(&2));
    assert_eq!(status.subscriptions.get("log_line"), Some(&1));

    hub.unregister_client(second);
    let status = hub.status();
    assert_eq!(status.connected_clients, 1);
    assert_eq!(status.subscriptions.get("container_update"), Some(&1));
    assert_eq!(status.subscriptions.get("log_line"), None);
    assert_eq!(status.event_types, vec!["container_update".to_string()]);

    hub.shutdown().await;
}

#[tokio::test]
async fn frames_sent_by_the_client_drive_the_hub() {
    let hub = EventHub::new(HubConfig::new());
    let (socket, mut rx, inbound) = ChannelSocket::new();
    hub.register_client(socket).expect("register");

    // subscribe and ping arrive over the socket, not through the API
    inbound
        .send(r#"{"type":"subscribe","event_type":"log_line"}"#.to_string())
        .expect("send");
    inbound.send(r#"{"type":"ping"}"#.to_string()).expect("send");

    // the pong confirms both inbound frames have been applied in order
    let frame = rx.recv().await.expect("frame");
    assert_eq!(frame, r#"{"type":"pong"}"#);

    assert_eq!(hub.broadcast_event("log_line", json!({"line": "ok"})), 1);
    let frame = rx.recv().await.expect("frame");
    assert!(frame.contains("log_line"));

    // dropping the inbound side reads as the peer closing
    drop(inbound);
    tokio::time::sleep(std::time::Duration::from_millis(30)).await;
    assert_eq!(hub.client_count(), 0);

    hub.shutdown().await;
}
