//! Configuration schema definitions.
//!
//! Two distinct documents live here:
//! - [`DisplayConfig`], the authoritative display document that is
//!   persisted, merged, and pushed to subscribers.
//! - [`BridgeConfig`], the server's own configuration (bind address,
//!   polling cadence, observability), deserialized from a TOML file.

use serde::{Deserialize, Serialize};

/// The complete display configuration document.
///
/// The in-memory snapshot is always complete: every field carries a
/// per-field serde default, so a partially persisted document loads
/// against defaults instead of failing or regressing later writes.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Caption color (hex string).
    pub color: String,

    /// Caption position on screen ("bas" or other).
    pub position: String,

    /// Font size (numeric string).
    pub size: String,

    /// Font family name.
    pub font: String,

    /// Title overlay message.
    pub title_message: String,

    /// Whether the title overlay is shown.
    pub title_active: bool,

    /// Title auto-hide timer in seconds.
    pub title_timer: u64,

    /// Whether the title timer is armed.
    pub title_timer_active: bool,

    /// Whether captions are hidden entirely.
    pub is_hidden: bool,

    /// Base URL of the presentation application's status API.
    pub external_api: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            color: "#802B36".to_string(),
            position: "bas".to_string(),
            size: "35".to_string(),
            font: "Montserrat".to_string(),
            title_message: String::new(),
            title_active: false,
            title_timer: 10,
            title_timer_active: false,
            is_hidden: false,
            external_api: "http://192.168.1.22:49196".to_string(),
        }
    }
}

impl DisplayConfig {
    /// Shallow-merge a partial update into this document.
    ///
    /// Every field present in `patch` overwrites the corresponding
    /// field; absent fields are untouched. Unknown keys never reach
    /// here: the typed patch drops them at deserialization time.
    pub fn merge(&self, patch: &DisplayConfigPatch) -> Self {
        let mut merged = self.clone();
        if let Some(v) = &patch.color {
            merged.color = v.clone();
        }
        if let Some(v) = &patch.position {
            merged.position = v.clone();
        }
        if let Some(v) = &patch.size {
            merged.size = v.clone();
        }
        if let Some(v) = &patch.font {
            merged.font = v.clone();
        }
        if let Some(v) = &patch.title_message {
            merged.title_message = v.clone();
        }
        if let Some(v) = patch.title_active {
            merged.title_active = v;
        }
        if let Some(v) = patch.title_timer {
            merged.title_timer = v;
        }
        if let Some(v) = patch.title_timer_active {
            merged.title_timer_active = v;
        }
        if let Some(v) = patch.is_hidden {
            merged.is_hidden = v;
        }
        if let Some(v) = &patch.external_api {
            merged.external_api = v.clone();
        }
        merged
    }
}

/// A partial display configuration, as received from the editor.
///
/// Mirrors [`DisplayConfig`] with every field optional. Keys outside
/// the recognized set are ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DisplayConfigPatch {
    pub color: Option<String>,
    pub position: Option<String>,
    pub size: Option<String>,
    pub font: Option<String>,
    pub title_message: Option<String>,
    pub title_active: Option<bool>,
    pub title_timer: Option<u64>,
    pub title_timer_active: Option<bool>,
    pub is_hidden: Option<bool>,
    pub external_api: Option<String>,
}

/// Root server configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct BridgeConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Display-config persistence settings.
    pub store: StoreConfig,

    /// Status poller settings.
    pub poller: PollerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Static asset serving for the editor/display pages.
    pub assets: AssetsConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:3000").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:3000".to_string(),
        }
    }
}

/// Display-config persistence settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the persisted display-config JSON document.
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: "display-config.json".to_string(),
        }
    }
}

/// Status poller settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PollerConfig {
    /// Poll period in milliseconds.
    pub interval_ms: u64,

    /// Per-request timeout in milliseconds.
    ///
    /// Deliberately larger than the interval; a stalled request causes
    /// intervening ticks to be skipped, never overlapped.
    pub timeout_ms: u64,

    /// Path of the slide status endpoint on the external API.
    pub status_path: String,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval_ms: 500,
            timeout_ms: 5000,
            status_path: "/v1/status/slide".to_string(),
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

/// Static asset serving configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// Serve static files (config/display pages).
    pub enabled: bool,

    /// Directory to serve from.
    pub dir: String,
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dir: "public".to_string(),
        }
    }
}
