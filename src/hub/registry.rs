//! Live subscriber registry and fan-out.
//!
//! # Responsibilities
//! - Track the set of live subscriber connections
//! - Catch-up push (config, then caption) on registration
//! - Fan out change events to every open connection
//! - Prune connections whose transport has closed
//!
//! # Design Decisions
//! - Delivery is an unbounded per-connection queue: fire-and-forget,
//!   no backpressure, no delivery guarantee. A reconnecting client
//!   converges through the catch-up push instead
//! - Register and broadcast enqueue under the same lock, so a late
//!   joiner can never receive a catch-up snapshot reordered after a
//!   newer broadcast on its own queue

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;

use crate::config::ConfigStore;
use crate::hub::event::PushEvent;
use crate::observability::metrics;
use crate::poller::caption::CaptionState;

/// Opaque handle to one live subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Fans events out to all live subscriber connections.
pub struct BroadcastHub {
    store: Arc<ConfigStore>,
    caption: Arc<CaptionState>,
    connections: Mutex<HashMap<ConnectionId, mpsc::UnboundedSender<String>>>,
    next_id: AtomicU64,
}

impl BroadcastHub {
    pub fn new(store: Arc<ConfigStore>, caption: Arc<CaptionState>) -> Self {
        Self {
            store,
            caption,
            connections: Mutex::new(HashMap::new()),
            next_id: AtomicU64::new(1),
        }
    }

    /// Add a connection to the live set and send it the two-message
    /// catch-up sequence: the full current config, then the last known
    /// caption. Both reads happen under the set lock, linearized with
    /// concurrent broadcasts, which is what makes late joiners converge.
    pub fn register(&self, tx: mpsc::UnboundedSender<String>) -> ConnectionId {
        let id = ConnectionId(self.next_id.fetch_add(1, Ordering::Relaxed));

        let mut connections = self.connections.lock().expect("hub lock poisoned");
        let config_msg = encode(&PushEvent::config(&self.store.current()));
        let caption_msg = encode(&PushEvent::text_update(&self.caption.snapshot()));

        // Enqueue failures here mean the socket task already went away;
        // the connection is pruned at the next broadcast pass anyway.
        if let Some(msg) = config_msg {
            let _ = tx.send(msg);
        }
        if let Some(msg) = caption_msg {
            let _ = tx.send(msg);
        }
        connections.insert(id, tx);
        metrics::set_clients_connected(connections.len());

        tracing::info!(connection = %id, clients = connections.len(), "Subscriber connected");
        id
    }

    /// Remove a connection from the live set. Idempotent.
    pub fn unregister(&self, id: ConnectionId) {
        let mut connections = self.connections.lock().expect("hub lock poisoned");
        if connections.remove(&id).is_some() {
            metrics::set_clients_connected(connections.len());
            tracing::info!(connection = %id, clients = connections.len(), "Subscriber disconnected");
        }
    }

    /// Serialize `event` once and push it to every live connection.
    /// Connections found closed during the pass are dropped from the
    /// set as a side effect. Returns the number of deliveries.
    pub fn broadcast(&self, event: &PushEvent) -> usize {
        let Some(payload) = encode(event) else {
            return 0;
        };

        let mut connections = self.connections.lock().expect("hub lock poisoned");

        let mut closed = Vec::new();
        let mut delivered = 0;
        for (id, tx) in connections.iter() {
            if tx.send(payload.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*id);
            }
        }
        for id in &closed {
            connections.remove(id);
            tracing::debug!(connection = %id, "Pruned closed subscriber during broadcast");
        }
        if !closed.is_empty() {
            metrics::set_clients_connected(connections.len());
        }

        metrics::record_broadcast(event.kind(), delivered);
        delivered
    }

    /// Number of currently live connections.
    pub fn client_count(&self) -> usize {
        self.connections.lock().expect("hub lock poisoned").len()
    }
}

fn encode(event: &PushEvent) -> Option<String> {
    match serde_json::to_string(event) {
        Ok(payload) => Some(payload),
        Err(e) => {
            tracing::error!(kind = event.kind(), error = %e, "Failed to encode push event");
            None
        }
    }
}
