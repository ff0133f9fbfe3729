//! Caption bridge library.
//!
//! Bridges a presentation application's status API to live display
//! clients and a configuration editor: a change-detecting poller, a
//! broadcast hub with late-joiner catch-up, and an authoritative
//! display-config store with persistence and broadcast-on-write.

pub mod config;
pub mod http;
pub mod hub;
pub mod observability;
pub mod poller;

pub use config::{BridgeConfig, ConfigStore, DisplayConfig, DisplayConfigPatch};
pub use http::{AppState, BridgeServer};
pub use hub::{BroadcastHub, PushEvent};
pub use poller::{CaptionState, Connectivity, StatusPoller};
