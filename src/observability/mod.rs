//! Observability subsystem.
//!
//! Silent recovery paths (dropped poll ticks, pruned subscribers) are
//! routed through counters here instead of per-tick log lines, so
//! sustained failure stays detectable without flooding the log at a
//! sub-second polling cadence.

pub mod metrics;
