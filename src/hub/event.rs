//! Push-channel event types.

use serde::Serialize;

use crate::config::DisplayConfig;
use crate::poller::caption::Caption;

/// An event pushed to subscribers. Two kinds only; no acknowledgment,
/// no delivery retry.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PushEvent {
    /// The full current configuration document.
    Config { config: DisplayConfig },

    /// A caption change: new text plus epoch-ms change timestamp.
    TextUpdate { text: String, timestamp: u64 },
}

impl PushEvent {
    pub fn config(config: &DisplayConfig) -> Self {
        Self::Config {
            config: config.clone(),
        }
    }

    pub fn text_update(caption: &Caption) -> Self {
        Self::TextUpdate {
            text: caption.text.clone(),
            timestamp: caption.timestamp,
        }
    }

    /// Short name for logging and metrics labels.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Config { .. } => "config",
            Self::TextUpdate { .. } => "text_update",
        }
    }
}
