//! Server configuration validation.
//!
//! Semantic checks on top of serde's syntactic ones. Pure function:
//! `BridgeConfig → Result<(), Vec<ValidationError>>`, returning all
//! errors rather than just the first.

use std::net::SocketAddr;

use crate::config::schema::BridgeConfig;

/// A single semantic validation failure.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

fn err(field: &'static str, message: impl Into<String>) -> ValidationError {
    ValidationError {
        field,
        message: message.into(),
    }
}

/// Validate a server configuration.
pub fn validate_config(config: &BridgeConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(err(
            "listener.bind_address",
            format!("not a valid socket address: {}", config.listener.bind_address),
        ));
    }

    if config.poller.interval_ms == 0 {
        errors.push(err("poller.interval_ms", "must be greater than zero"));
    }
    if config.poller.timeout_ms == 0 {
        errors.push(err("poller.timeout_ms", "must be greater than zero"));
    }
    if !config.poller.status_path.starts_with('/') {
        errors.push(err("poller.status_path", "must start with '/'"));
    }

    if config.store.path.is_empty() {
        errors.push(err("store.path", "must not be empty"));
    }

    if config.observability.metrics_enabled
        && config
            .observability
            .metrics_address
            .parse::<SocketAddr>()
            .is_err()
    {
        errors.push(err(
            "observability.metrics_address",
            format!(
                "not a valid socket address: {}",
                config.observability.metrics_address
            ),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
