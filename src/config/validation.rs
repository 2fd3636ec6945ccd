//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, limits > 0)
//! - Check that the correlation header is a usable HTTP header name
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: LensConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use axum::http::HeaderName;

use crate::config::schema::{CorrelationConfig, LensConfig};

/// A single semantic problem found in a configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{field}: {reason}")]
pub struct ValidationError {
    /// Dotted path of the offending field.
    pub field: &'static str,
    /// Human-readable description.
    pub reason: String,
}

impl ValidationError {
    fn new(field: &'static str, reason: impl Into<String>) -> Self {
        Self {
            field,
            reason: reason.into(),
        }
    }
}

/// Validate a parsed configuration, collecting every error.
pub fn validate_config(config: &LensConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a host:port socket address", config.listener.bind_address),
        ));
    }

    if config.timeouts.request_secs == 0 {
        errors.push(ValidationError::new("timeouts.request_secs", "must be greater than zero"));
    }

    match &config.correlation {
        Some(correlation) => {
            if let Err(e) = validate_correlation(correlation) {
                errors.push(e);
            }
        }
        None => errors.push(ValidationError::new("correlation", "section is required")),
    }

    if config.capture.max_logged_body_bytes == 0 {
        errors.push(ValidationError::new(
            "capture.max_logged_body_bytes",
            "must be greater than zero",
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Check the correlation options on their own.
///
/// Shared with [`CorrelationLayer::new`](crate::http::CorrelationLayer::new) so
/// the layer rejects exactly what the loader rejects.
pub fn validate_correlation(config: &CorrelationConfig) -> Result<(), ValidationError> {
    if config.header.trim().is_empty() {
        return Err(ValidationError::new("correlation.header", "must not be empty"));
    }
    if HeaderName::from_bytes(config.header.as_bytes()).is_err() {
        return Err(ValidationError::new(
            "correlation.header",
            format!("'{}' is not a valid HTTP header name", config.header),
        ));
    }
    if config.max_length == 0 {
        return Err(ValidationError::new("correlation.max_length", "must be greater than zero"));
    }
    Ok(())
}
