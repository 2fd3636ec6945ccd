//! Log record model.

use std::error::Error as StdError;
use std::fmt;

use serde::Serialize;

/// Severity a record is emitted at.
///
/// Only routes a record to the matching emission path of a sink; filtering
/// is the subscriber's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    Trace,
    Debug,
    Information,
    Warning,
    Error,
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Severity::Trace => "trace",
            Severity::Debug => "debug",
            Severity::Information => "information",
            Severity::Warning => "warning",
            Severity::Error => "error",
            Severity::Critical => "critical",
        };
        f.write_str(s)
    }
}

/// A loggable event observed by the pipeline.
///
/// Serialized with a `log_type` tag so downstream consumers can filter by
/// kind without inspecting the fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "log_type")]
pub enum LogRecord {
    /// An inbound request, logged before the handler runs.
    #[serde(rename = "QueryRequestData")]
    Request {
        scheme: String,
        host: String,
        path: String,
        /// Includes the leading `?`; empty when the URI has no query.
        query_string: String,
        body_text: String,
        remote_address: Option<String>,
    },

    /// A completed response, logged before its body is delivered.
    #[serde(rename = "QueryResponseData")]
    Response {
        status_code: u16,
        elapsed_millis: u64,
        body_text: String,
    },

    /// A failure that escaped the handler.
    #[serde(rename = "ExceptionData")]
    Exception {
        message: String,
        cause: Option<String>,
    },
}

impl LogRecord {
    /// Build an exception record from an error and its source chain.
    pub fn from_error(err: &(dyn StdError + 'static)) -> Self {
        let mut causes = Vec::new();
        let mut source = err.source();
        while let Some(inner) = source {
            causes.push(inner.to_string());
            source = inner.source();
        }

        LogRecord::Exception {
            message: err.to_string(),
            cause: if causes.is_empty() {
                None
            } else {
                Some(causes.join(": "))
            },
        }
    }

    /// Stable tag naming the record kind.
    pub fn kind(&self) -> &'static str {
        match self {
            LogRecord::Request { .. } => "QueryRequestData",
            LogRecord::Response { .. } => "QueryResponseData",
            LogRecord::Exception { .. } => "ExceptionData",
        }
    }
}

/// Decode captured bytes for logging.
///
/// Invalid UTF-8 never fails: offending sequences become U+FFFD.
pub fn body_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Like [`body_text`], but decodes at most `limit` bytes and marks the cut.
pub fn capped_body_text(bytes: &[u8], limit: usize) -> String {
    if bytes.len() <= limit {
        return body_text(bytes);
    }
    format!(
        "{}...[truncated {} bytes]",
        body_text(&bytes[..limit]),
        bytes.len() - limit
    )
}
