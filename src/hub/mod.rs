//! Broadcast hub subsystem.
//!
//! # Data Flow
//! ```text
//! StatusPoller text change ──┐
//! ControlAPI write/reset  ───┼─▶ BroadcastHub.broadcast(event)
//!                            │        │ serialize once
//!                            │        ▼ fan out to live set
//! new WebSocket connection ──┴─▶ register → catch-up push
//!                                (config, then last caption)
//! ```

pub mod event;
pub mod registry;

pub use event::PushEvent;
pub use registry::{BroadcastHub, ConnectionId};
