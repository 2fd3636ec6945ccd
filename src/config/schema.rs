//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the pipeline.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the observability pipeline and its demo host.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LensConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Correlation identifier propagation.
    ///
    /// Defaults apply when the section is absent from the file. `None` can
    /// only be set programmatically, and the correlation layer refuses to
    /// build without it.
    pub correlation: Option<CorrelationConfig>,

    /// Request/response body capture.
    pub capture: CaptureConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

fn default_correlation() -> Option<CorrelationConfig> {
    Some(CorrelationConfig::default())
}

impl Default for LensConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            correlation: default_correlation(),
            capture: CaptureConfig::default(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Correlation identifier configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorrelationConfig {
    /// Header carrying the correlation identifier, inbound and outbound.
    pub header: String,

    /// Echo the identifier on the response under the same header.
    pub include_in_response: bool,

    /// Inbound identifiers longer than this are ignored and a fresh one
    /// is generated instead.
    pub max_length: usize,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            header: "X-Correlation-Id".to_string(),
            include_in_response: true,
            max_length: 128,
        }
    }
}

/// What the interceptor does after logging a failure of the next stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Answer with an empty `500 Internal Server Error`.
    #[default]
    InternalError,
    /// Hand the error (or panic) back to the host framework.
    Propagate,
}

/// Body capture configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Longest body prefix, in bytes, copied into a record's `body_text`.
    /// Bodies are always forwarded whole; longer ones are logged truncated.
    pub max_logged_body_bytes: usize,

    /// Behavior after a downstream failure has been logged.
    pub failure_policy: FailurePolicy,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            max_logged_body_bytes: 1024 * 1024,
            failure_policy: FailurePolicy::InternalError,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error). `RUST_LOG` wins when set.
    pub log_level: String,

    /// Output format of the fmt layer.
    pub format: LogFormat,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}
