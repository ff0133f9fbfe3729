//! Status polling subsystem.
//!
//! # State Machine
//! ```text
//! Disconnected → (well-formed response) → Connected
//! Connected → (timeout | network error | non-2xx) → Disconnected
//! ```
//! Transition edges, not steady-state ticks, are the only loggable
//! events; empty or malformed bodies drop the tick without any
//! transition.

pub mod caption;
pub mod status;

pub use caption::{Caption, CaptionState};
pub use status::{Connectivity, StatusPoller};
