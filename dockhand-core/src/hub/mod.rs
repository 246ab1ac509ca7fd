//! Real-time event hub
//!
//! Tracks connected push clients, their event-type subscriptions, and a
//! per-client delivery loop that serializes outbound writes and feeds
//! inbound control frames back into the hub. Broadcasts
//! enqueue without blocking on the network, so one stalled client never
//! delays another. A background sweep drops clients that stop pinging.
//!
//! Client lifecycle: `Registered → (subscribe/unsubscribe)* →
//! Unregistered`; ids are random UUIDs and never reused.

mod message;
mod socket;

pub use message::{ControlMessage, PushMessage};
pub use socket::PushSocket;

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use serde::Serialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::HubSettings;
use crate::error::{HubError, HubResult};
use crate::sync::lock;

/// Default interval between liveness sweeps (seconds)
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;

/// Unique identifier of a registered push client
pub type ClientId = Uuid;

/// Event hub tunables
#[derive(Debug, Clone, Copy)]
pub struct HubConfig {
    /// Liveness sweep interval; clients silent for more than twice
    /// this are removed
    pub ping_interval: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
        }
    }
}

impl HubConfig {
    /// Creates a config with default settings
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the sweep interval
    #[must_use]
    pub const fn with_ping_interval(mut self, interval: Duration) -> Self {
        self.ping_interval = interval;
        self
    }
}

impl From<&HubSettings> for HubConfig {
    fn from(settings: &HubSettings) -> Self {
        Self {
            ping_interval: Duration::from_secs(settings.ping_interval_secs),
        }
    }
}

/// Snapshot of hub state for status endpoints
#[derive(Debug, Clone, Serialize)]
pub struct HubStatus {
    /// Number of registered clients
    pub connected_clients: usize,
    /// Event types with at least one subscriber
    pub event_types: Vec<String>,
    /// Subscriber count per event type
    pub subscriptions: HashMap<String, usize>,
}

/// Message handed to a client's delivery loop
enum Outbound {
    /// JSON text to write to the socket
    Text(String),
    /// Sentinel: drain and exit
    Stop,
}

/// Registry entry for one connected client
struct ClientEntry {
    subscriptions: HashSet<String>,
    last_ping: Instant,
    queue: mpsc::UnboundedSender<Outbound>,
}

/// Shared hub state
///
/// Lock order when both are needed: `clients` first, `event_index`
/// second, always.
struct HubInner {
    clients: Mutex<HashMap<ClientId, ClientEntry>>,
    event_index: Mutex<HashMap<String, HashSet<ClientId>>>,
    tasks: Mutex<HashMap<ClientId, JoinHandle<()>>>,
    shut_down: AtomicBool,
}

impl HubInner {
    /// Removes a client from the registry and every subscription set,
    /// and signals its delivery loop to stop
    ///
    /// Returns the delivery task handle so shutdown can join it;
    /// other callers drop it, leaving the task to drain and exit.
    fn remove_client(&self, id: ClientId) -> Option<JoinHandle<()>> {
        let entry = {
            let mut clients = lock(&self.clients);
            let Some(entry) = clients.remove(&id) else {
                return None;
            };
            let mut index = lock(&self.event_index);
            for event_type in &entry.subscriptions {
                if let Some(subscribers) = index.get_mut(event_type) {
                    subscribers.remove(&id);
                }
            }
            index.retain(|_, subscribers| !subscribers.is_empty());
            entry
        };
        let _ = entry.queue.send(Outbound::Stop);
        info!(client = %id, "client unregistered");
        lock(&self.tasks).remove(&id)
    }

    /// Parses and applies one raw control frame from a client
    ///
    /// Malformed or unrecognized messages are dropped with a warning;
    /// they are never fatal to the connection.
    fn handle_message(&self, id: ClientId, text: &str) {
        let control: ControlMessage = match serde_json::from_str(text) {
            Ok(control) => control,
            Err(e) => {
                warn!(client = %id, error = %e, "invalid control message");
                return;
            }
        };

        match control {
            ControlMessage::Ping => self.handle_ping(id),
            ControlMessage::Subscribe { event_type } => self.subscribe(id, &event_type),
            ControlMessage::Unsubscribe { event_type } => self.unsubscribe(id, &event_type),
            ControlMessage::Unknown => {
                warn!(client = %id, "unknown control message type");
            }
        }
    }

    /// Updates the client's own set and the reverse index in one
    /// critical section; no-op for unknown ids
    fn subscribe(&self, id: ClientId, event_type: &str) {
        let mut clients = lock(&self.clients);
        let Some(entry) = clients.get_mut(&id) else {
            debug!(client = %id, "subscribe for unknown client ignored");
            return;
        };
        let mut index = lock(&self.event_index);
        entry.subscriptions.insert(event_type.to_string());
        index.entry(event_type.to_string()).or_default().insert(id);
        debug!(client = %id, %event_type, "client subscribed");
    }

    fn unsubscribe(&self, id: ClientId, event_type: &str) {
        let mut clients = lock(&self.clients);
        let Some(entry) = clients.get_mut(&id) else {
            debug!(client = %id, "unsubscribe for unknown client ignored");
            return;
        };
        let mut index = lock(&self.event_index);
        entry.subscriptions.remove(event_type);
        if let Some(subscribers) = index.get_mut(event_type) {
            subscribers.remove(&id);
            if subscribers.is_empty() {
                index.remove(event_type);
            }
        }
        debug!(client = %id, %event_type, "client unsubscribed");
    }

    fn handle_ping(&self, id: ClientId) {
        let mut clients = lock(&self.clients);
        if let Some(entry) = clients.get_mut(&id) {
            entry.last_ping = Instant::now();
            let pong = serde_json::json!({"type": "pong"}).to_string();
            let _ = entry.queue.send(Outbound::Text(pong));
        }
    }
}

/// The hub itself
///
/// Construction starts the liveness sweep; call [`EventHub::shutdown`]
/// to stop it and tear down every client.
pub struct EventHub {
    inner: Arc<HubInner>,
    config: HubConfig,
    stop_tx: mpsc::Sender<()>,
    sweep: Mutex<Option<JoinHandle<()>>>,
}

impl EventHub {
    /// Creates a hub and starts its liveness sweep
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        let inner = Arc::new(HubInner {
            clients: Mutex::new(HashMap::new()),
            event_index: Mutex::new(HashMap::new()),
            tasks: Mutex::new(HashMap::new()),
            shut_down: AtomicBool::new(false),
        });

        let (stop_tx, mut stop_rx) = mpsc::channel::<()>(1);
        let sweep_inner = Arc::clone(&inner);
        let ping_interval = config.ping_interval;
        let sweep = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(ping_interval);
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = stop_rx.recv() => break,
                    _ = ticker.tick() => sweep_clients(&sweep_inner, ping_interval),
                }
            }
        });

        Self {
            inner,
            config,
            stop_tx,
            sweep: Mutex::new(Some(sweep)),
        }
    }

    /// Registers a push client and starts its delivery loop
    ///
    /// Returns immediately; delivery happens on the spawned task.
    ///
    /// # Errors
    ///
    /// Returns [`HubError::ShutDown`] after [`EventHub::shutdown`].
    pub fn register_client(&self, socket: Box<dyn PushSocket>) -> HubResult<ClientId> {
        let id = Uuid::new_v4();
        let (queue, rx) = mpsc::unbounded_channel();

        // The flag is checked and the entry inserted under the same
        // `clients` acquisition so a registration can never slip in
        // between `shutdown` setting the flag and snapshotting ids.
        let mut clients = lock(&self.inner.clients);
        if self.inner.shut_down.load(Ordering::SeqCst) {
            return Err(HubError::ShutDown);
        }
        clients.insert(
            id,
            ClientEntry {
                subscriptions: HashSet::new(),
                last_ping: Instant::now(),
                queue,
            },
        );

        let task_inner = Arc::clone(&self.inner);
        let handle = tokio::spawn(delivery_loop(task_inner, id, rx, socket));
        lock(&self.inner.tasks).insert(id, handle);
        drop(clients);

        info!(client = %id, "client registered");
        Ok(id)
    }

    /// Unregisters a client, stopping delivery after the queue drains
    ///
    /// No-op for unknown ids.
    pub fn unregister_client(&self, id: ClientId) {
        drop(self.inner.remove_client(id));
    }

    /// Subscribes a client to an event type
    ///
    /// Updates the client's own set and the reverse index in one
    /// critical section; no-op for unknown ids.
    pub fn subscribe(&self, id: ClientId, event_type: &str) {
        self.inner.subscribe(id, event_type);
    }

    /// Unsubscribes a client from an event type
    ///
    /// No-op for unknown ids.
    pub fn unsubscribe(&self, id: ClientId, event_type: &str) {
        self.inner.unsubscribe(id, event_type);
    }

    /// Broadcasts an event to every subscriber of `event_type`
    ///
    /// Snapshots the subscriber set, then enqueues the envelope onto
    /// each client's queue without touching the network. Returns the
    /// number of clients the event was enqueued for.
    pub fn broadcast_event(&self, event_type: &str, data: Value) -> usize {
        let message = PushMessage::new(event_type, data);
        let text = match serde_json::to_string(&message) {
            Ok(text) => text,
            Err(e) => {
                error!(%event_type, error = %e, "failed to serialize event");
                return 0;
            }
        };

        let subscribers: Vec<ClientId> = lock(&self.inner.event_index)
            .get(event_type)
            .map(|set| set.iter().copied().collect())
            .unwrap_or_default();

        let clients = lock(&self.inner.clients);
        let mut enqueued = 0;
        for id in subscribers {
            if let Some(entry) = clients.get(&id) {
                if entry.queue.send(Outbound::Text(text.clone())).is_ok() {
                    enqueued += 1;
                }
            }
        }
        debug!(%event_type, enqueued, "event broadcast");
        enqueued
    }

    /// Handles a raw control message received from a client
    ///
    /// Malformed or unrecognized messages are dropped with a warning;
    /// they are never fatal to the connection.
    pub fn handle_client_message(&self, id: ClientId, text: &str) {
        self.inner.handle_message(id, text);
    }

    /// Current hub status snapshot
    #[must_use]
    pub fn status(&self) -> HubStatus {
        let clients = lock(&self.inner.clients);
        let index = lock(&self.inner.event_index);
        HubStatus {
            connected_clients: clients.len(),
            event_types: index.keys().cloned().collect(),
            subscriptions: index
                .iter()
                .map(|(event_type, subscribers)| (event_type.clone(), subscribers.len()))
                .collect(),
        }
    }

    /// Number of currently registered clients
    #[must_use]
    pub fn client_count(&self) -> usize {
        lock(&self.inner.clients).len()
    }

    /// Stops the liveness sweep, tears down every client, and joins
    /// their delivery loops
    pub async fn shutdown(&self) {
        {
            // Set under the `clients` lock so every registration either
            // sees the flag or has its entry visible to the snapshot
            // below.
            let _clients = lock(&self.inner.clients);
            self.inner.shut_down.store(true, Ordering::SeqCst);
        }
        let _ = self.stop_tx.send(()).await;
        let sweep = lock(&self.sweep).take();
        if let Some(handle) = sweep {
            let _ = handle.await;
        }

        let ids: Vec<ClientId> = lock(&self.inner.clients).keys().copied().collect();
        let handles: Vec<_> = ids
            .into_iter()
            .filter_map(|id| self.inner.remove_client(id))
            .collect();
        futures::future::join_all(handles).await;
    }

    /// Sweep interval the hub was configured with
    #[must_use]
    pub const fn ping_interval(&self) -> Duration {
        self.config.ping_interval
    }
}

/// Removes clients that have not pinged within `2 * ping_interval`
fn sweep_clients(inner: &Arc<HubInner>, ping_interval: Duration) {
    let deadline = ping_interval * 2;
    let stale: Vec<ClientId> = lock(&inner.clients)
        .iter()
        .filter(|(_, entry)| entry.last_ping.elapsed() > deadline)
        .map(|(id, _)| *id)
        .collect();

    for id in stale {
        warn!(client = %id, "client timed out");
        drop(inner.remove_client(id));
    }
}

/// One step of a client's delivery loop
enum Step {
    Outbound(Option<Outbound>),
    Inbound(Option<String>),
}

/// Single-consumer delivery loop for one client
///
/// Writes queued messages to the socket strictly in FIFO order and
/// feeds inbound control frames back into the hub. A write failure or
/// peer close removes the client and ends the loop; the hub itself is
/// unaffected.
async fn delivery_loop(
    inner: Arc<HubInner>,
    id: ClientId,
    mut rx: mpsc::UnboundedReceiver<Outbound>,
    mut socket: Box<dyn PushSocket>,
) {
    loop {
        // The selected step is acted on outside the `select!` so the
        // receive future's borrow of the socket has ended before the
        // queued text is written.
        let step = tokio::select! {
            outbound = rx.recv() => Step::Outbound(outbound),
            inbound = socket.receive() => Step::Inbound(inbound),
        };

        match step {
            Step::Outbound(Some(Outbound::Text(text))) => {
                if let Err(e) = socket.send(&text).await {
                    debug!(client = %id, error = %e, "delivery failed, removing client");
                    drop(inner.remove_client(id));
                    break;
                }
            }
            Step::Outbound(Some(Outbound::Stop) | None) => break,
            Step::Inbound(Some(text)) => inner.handle_message(id, &text),
            Step::Inbound(None) => {
                debug!(client = %id, "client closed the connection");
                drop(inner.remove_client(id));
                break;
            }
        }
    }
    socket.close().await;
}
