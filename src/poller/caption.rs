//! Last-observed caption state.

use std::sync::Mutex;
use std::time::{SystemTime, UNIX_EPOCH};

/// A caption observation: text plus the epoch-ms timestamp of the last
/// change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caption {
    pub text: String,
    pub timestamp: u64,
}

/// Current time in epoch milliseconds.
pub fn now_ms() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Holds the last caption text observed from the external source.
///
/// Mutated only by the status poller; read by the hub (catch-up push)
/// and the status report.
pub struct CaptionState {
    inner: Mutex<Caption>,
}

impl CaptionState {
    /// Start empty. The timestamp is initialized to process start so
    /// the first catch-up push carries a meaningful value.
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(Caption {
                text: String::new(),
                timestamp: now_ms(),
            }),
        }
    }

    /// Current observation.
    pub fn snapshot(&self) -> Caption {
        self.inner.lock().expect("caption lock poisoned").clone()
    }

    /// Compare-and-update: stores `text` with the current timestamp and
    /// returns the new observation if it differs from the held value;
    /// returns `None` (no mutation) if the text is unchanged.
    pub fn update_if_changed(&self, text: &str) -> Option<Caption> {
        let mut inner = self.inner.lock().expect("caption lock poisoned");
        if inner.text == text {
            return None;
        }
        inner.text = text.to_string();
        inner.timestamp = now_ms();
        Some(inner.clone())
    }
}

impl Default for CaptionState {
    fn default() -> Self {
        Self::new()
    }
}
