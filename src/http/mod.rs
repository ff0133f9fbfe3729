//! HTTP surface: control API and WebSocket push channel.
//!
//! # Data Flow
//! ```text
//! editor  ── GET/POST /api/config, /api/config/reset ──▶ server.rs
//! anyone  ── GET /api/status ──▶ server.rs (read-only projection)
//! display ── GET /ws upgrade ──▶ websocket.rs → hub registration
//! ```

pub mod server;
pub mod websocket;

pub use server::{AppState, BridgeServer};
