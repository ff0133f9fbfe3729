//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! server config (TOML)
//!     → loader.rs (parse & deserialize)
//!     → validation.rs (semantic checks)
//!     → BridgeConfig (validated, immutable for the process lifetime)
//!
//! display config (JSON document)
//!     → store.rs (load at startup, defaults on any failure)
//!     → merged on write, persisted, swapped, broadcast by the API
//! ```
//!
//! # Design Decisions
//! - The server config is immutable once loaded; the display config is
//!   the system's mutable state and goes through the store exclusively
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks

pub mod loader;
pub mod schema;
pub mod store;
pub mod validation;

pub use schema::{
    AssetsConfig, BridgeConfig, DisplayConfig, DisplayConfigPatch, ListenerConfig,
    ObservabilityConfig, PollerConfig, StoreConfig,
};
pub use store::{ConfigStore, StoreError};
