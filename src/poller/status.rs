//! Periodic status polling against the external presentation API.
//!
//! # Responsibilities
//! - One bounded GET per tick against `{external_api}{status_path}`
//! - Detect caption text changes and broadcast them
//! - Track source connectivity, observable on edges only
//!
//! # Design Decisions
//! - The request is awaited inside the tick loop with
//!   `MissedTickBehavior::Skip`: a stalled request (the timeout is much
//!   larger than the period) skips ticks instead of overlapping them
//! - Empty or unparsable bodies are dropped per tick with a counter;
//!   the source cannot distinguish "not yet ready" from "malformed",
//!   so both are treated as transient noise
//! - The API base URL is re-read from the store every tick, so editing
//!   it takes effect without a restart

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, MissedTickBehavior};

use crate::config::{ConfigStore, PollerConfig};
use crate::hub::{BroadcastHub, PushEvent};
use crate::observability::metrics;
use crate::poller::caption::CaptionState;

/// Connectivity state of the external source.
///
/// Transitions only on poll success/failure edges, not on every tick.
pub struct Connectivity {
    connected: AtomicBool,
}

impl Connectivity {
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(false),
        }
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }

    /// Returns true only on the disconnected → connected edge.
    fn mark_connected(&self) -> bool {
        !self.connected.swap(true, Ordering::Relaxed)
    }

    /// Returns true only on the connected → disconnected edge.
    fn mark_disconnected(&self) -> bool {
        self.connected.swap(false, Ordering::Relaxed)
    }
}

impl Default for Connectivity {
    fn default() -> Self {
        Self::new()
    }
}

/// Polls the external status source on a fixed period.
pub struct StatusPoller {
    client: reqwest::Client,
    config: PollerConfig,
    store: Arc<ConfigStore>,
    caption: Arc<CaptionState>,
    hub: Arc<BroadcastHub>,
    connectivity: Arc<Connectivity>,
}

impl StatusPoller {
    pub fn new(
        config: PollerConfig,
        store: Arc<ConfigStore>,
        caption: Arc<CaptionState>,
        hub: Arc<BroadcastHub>,
        connectivity: Arc<Connectivity>,
    ) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            config,
            store,
            caption,
            hub,
            connectivity,
        })
    }

    /// Run the poll loop for the lifetime of the process.
    pub async fn run(self) {
        tracing::info!(
            interval_ms = self.config.interval_ms,
            timeout_ms = self.config.timeout_ms,
            "Status poller starting"
        );

        let mut ticker = time::interval(Duration::from_millis(self.config.interval_ms));
        // In-flight guard: poll_once is awaited before the next tick is
        // taken, and ticks that fired meanwhile are skipped, not queued.
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            ticker.tick().await;
            self.poll_once().await;
        }
    }

    /// One poll tick: request, classify, and on a well-formed response
    /// run change detection.
    async fn poll_once(&self) {
        let base = self.store.current().external_api.clone();
        let url = format!("{}{}", base.trim_end_matches('/'), self.config.status_path);

        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(e) => {
                self.on_failure(&format!("request failed: {e}"));
                return;
            }
        };

        if !response.status().is_success() {
            self.on_failure(&format!("HTTP {}", response.status()));
            return;
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                self.on_failure(&format!("body read failed: {e}"));
                return;
            }
        };

        self.handle_body(&body);
    }

    fn handle_body(&self, body: &str) {
        // Dropped tick: no connectivity transition, no broadcast.
        if body.trim().is_empty() {
            metrics::record_poll_drop("empty_body");
            tracing::debug!("Dropped poll tick: empty body");
            return;
        }

        let data: serde_json::Value = match serde_json::from_str(body) {
            Ok(data) => data,
            Err(_) => {
                metrics::record_poll_drop("malformed_json");
                tracing::debug!("Dropped poll tick: malformed JSON");
                return;
            }
        };

        if self.connectivity.mark_connected() {
            tracing::info!("Status source connected");
            metrics::set_source_connected(true);
        }

        let text = data
            .get("current")
            .and_then(|c| c.get("text"))
            .and_then(|t| t.as_str())
            .unwrap_or("");

        if let Some(caption) = self.caption.update_if_changed(text) {
            tracing::debug!(text = %caption.text, "Caption text changed");
            metrics::record_text_update();
            self.hub.broadcast(&PushEvent::text_update(&caption));
        }
    }

    fn on_failure(&self, reason: &str) {
        metrics::record_poll_failure();
        if self.connectivity.mark_disconnected() {
            tracing::warn!(reason = %reason, "Status source disconnected");
            metrics::set_source_connected(false);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn connectivity_reports_edges_only() {
        let conn = Connectivity::new();
        assert!(!conn.is_connected());

        // First success is an edge; repeats are not.
        assert!(conn.mark_connected());
        assert!(!conn.mark_connected());
        assert!(conn.is_connected());

        // First failure is an edge; repeats are not.
        assert!(conn.mark_disconnected());
        assert!(!conn.mark_disconnected());
        assert!(!conn.is_connected());
    }
}
