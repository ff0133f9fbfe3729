//! Authoritative display-config store.
//!
//! # Responsibilities
//! - Own the in-memory snapshot (always a complete document)
//! - Load the persisted document at startup, recovering to defaults
//! - Serialize the merge → persist → swap → notify sequence across
//!   writers
//! - Keep the persisted copy tracking the in-memory copy
//!
//! # Design Decisions
//! - Snapshot lives in an `ArcSwap`: readers (poller, hub catch-up,
//!   status report) take lock-free loads on the hot path
//! - A merged document is swapped into memory only after persistence
//!   succeeds, so memory and disk never diverge on a failed write
//! - The caller's `on_commit` hook (the broadcast) runs while the
//!   write lock is still held: commit order and notification order can
//!   never disagree under concurrent writes
//! - Persistence writes to a temp file and renames over the target,
//!   off the async workers via `spawn_blocking`

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use arc_swap::ArcSwap;
use tokio::sync::Mutex;

use crate::config::schema::{DisplayConfig, DisplayConfigPatch};

/// Error type for display-config persistence.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write display config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to encode display config: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Owns the authoritative display configuration snapshot.
pub struct ConfigStore {
    snapshot: ArcSwap<DisplayConfig>,
    path: PathBuf,
    /// Serializes the whole read-modify-persist-swap-notify sequence.
    write_lock: Mutex<()>,
}

impl ConfigStore {
    /// Open the store, loading the persisted document if present.
    ///
    /// A missing, unreadable, or malformed file recovers to the default
    /// document; load failures are logged, never surfaced.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let initial = Self::load(&path);
        Self {
            snapshot: ArcSwap::from_pointee(initial),
            path,
            write_lock: Mutex::new(()),
        }
    }

    fn load(path: &Path) -> DisplayConfig {
        match fs::read_to_string(path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(config) => {
                    tracing::info!(path = %path.display(), "Display config loaded");
                    config
                }
                Err(e) => {
                    tracing::warn!(
                        path = %path.display(),
                        error = %e,
                        "Persisted display config malformed, using defaults"
                    );
                    DisplayConfig::default()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No persisted display config, using defaults");
                DisplayConfig::default()
            }
            Err(e) => {
                tracing::warn!(
                    path = %path.display(),
                    error = %e,
                    "Failed to read persisted display config, using defaults"
                );
                DisplayConfig::default()
            }
        }
    }

    /// Current complete snapshot.
    pub fn current(&self) -> Arc<DisplayConfig> {
        self.snapshot.load_full()
    }

    /// Merge a partial update, persist, and swap in the merged document.
    ///
    /// `on_commit` runs with the merged document after the swap, still
    /// inside the write-lock scope; callers broadcast from it so that
    /// two concurrent writes can never notify subscribers in the
    /// opposite order of their commits.
    ///
    /// On persist failure the in-memory snapshot keeps its pre-write
    /// value, `on_commit` is not invoked, and the error is returned.
    pub async fn update(
        &self,
        patch: &DisplayConfigPatch,
        on_commit: impl FnOnce(&DisplayConfig),
    ) -> Result<Arc<DisplayConfig>, StoreError> {
        let _guard = self.write_lock.lock().await;

        let merged = Arc::new(self.snapshot.load().merge(patch));
        self.persist(&merged).await?;
        self.snapshot.store(merged.clone());
        on_commit(&merged);

        tracing::info!(path = %self.path.display(), "Display config updated");
        Ok(merged)
    }

    /// Replace the snapshot with the default document.
    ///
    /// The swap and `on_commit` happen regardless of persist outcome; a
    /// persist failure is logged only. Callers always get the default
    /// document.
    pub async fn reset(&self, on_commit: impl FnOnce(&DisplayConfig)) -> Arc<DisplayConfig> {
        let _guard = self.write_lock.lock().await;

        let defaults = Arc::new(DisplayConfig::default());
        self.snapshot.store(defaults.clone());

        if let Err(e) = self.persist(&defaults).await {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "Failed to persist display config on reset"
            );
        } else {
            tracing::info!(path = %self.path.display(), "Display config reset to defaults");
        }
        on_commit(&defaults);

        defaults
    }

    /// Persist the full document: write to a temp file, rename over the
    /// target so readers never observe a half-written document. The
    /// file I/O runs on the blocking pool so a slow disk cannot stall
    /// an async worker thread.
    async fn persist(&self, config: &DisplayConfig) -> Result<(), StoreError> {
        let encoded = serde_json::to_string_pretty(config)?;
        let path = self.path.clone();
        let tmp = self.path.with_extension("json.tmp");

        tokio::task::spawn_blocking(move || -> Result<(), StoreError> {
            fs::write(&tmp, encoded)?;
            fs::rename(&tmp, &path)?;
            Ok(())
        })
        .await
        .map_err(|e| StoreError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
    }
}
