//! Log sinks: where the pipeline's records go.

use std::sync::{Arc, Mutex, OnceLock, PoisonError};

use crate::observability::record::{LogRecord, Severity};

/// Target of every event emitted by [`TracingSink`], so subscribers can
/// route traffic records apart from the rest of the application's logs.
pub const TRAFFIC_TARGET: &str = "traffic_lens::traffic";

/// Destination for [`LogRecord`]s produced by the middleware.
///
/// Implementations must be safe to call from many requests at once and
/// must never panic or report failure to the caller: a sink that cannot
/// deliver a record drops it.
pub trait LogSink: Send + Sync {
    /// Emit a single record at the given severity.
    fn write(&self, level: Severity, record: &LogRecord);
}

macro_rules! emit {
    ($level:expr, $($fields:tt)+) => {
        match $level {
            Severity::Trace => tracing::trace!(target: TRAFFIC_TARGET, $($fields)+),
            Severity::Debug => tracing::debug!(target: TRAFFIC_TARGET, $($fields)+),
            Severity::Information => tracing::info!(target: TRAFFIC_TARGET, $($fields)+),
            Severity::Warning => tracing::warn!(target: TRAFFIC_TARGET, $($fields)+),
            Severity::Error => tracing::error!(target: TRAFFIC_TARGET, $($fields)+),
            // tracing has no level above ERROR.
            Severity::Critical => tracing::error!(target: TRAFFIC_TARGET, critical = true, $($fields)+),
        }
    };
}

/// Sink that turns records into `tracing` events, one named field per
/// record attribute.
///
/// Whatever subscriber is installed decides the final destination. Events
/// inherit the current span, so records emitted inside the correlation
/// span carry its `correlation_id`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn write(&self, level: Severity, record: &LogRecord) {
        let log_type = record.kind();
        match record {
            LogRecord::Request {
                scheme,
                host,
                path,
                query_string,
                body_text,
                remote_address,
            } => emit!(
                level,
                log_type,
                scheme = %scheme,
                host = %host,
                path = %path,
                query_string = %query_string,
                body_text = %body_text,
                remote_address = remote_address.as_deref(),
                "request received"
            ),
            LogRecord::Response {
                status_code,
                elapsed_millis,
                body_text,
            } => emit!(
                level,
                log_type,
                status_code = *status_code,
                elapsed_millis = *elapsed_millis,
                body_text = %body_text,
                "response sent"
            ),
            LogRecord::Exception { message, cause } => emit!(
                level,
                log_type,
                cause = cause.as_deref(),
                message = %message
            ),
        }
    }
}

/// Sink that keeps every record in memory.
///
/// Useful for tests and for embedders that want to inspect traffic
/// in-process.
#[derive(Debug, Default)]
pub struct MemorySink {
    records: Mutex<Vec<(Severity, LogRecord)>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything written so far, in emission order.
    pub fn records(&self) -> Vec<(Severity, LogRecord)> {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of records of the given kind.
    pub fn count(&self, kind: &str) -> usize {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, record)| record.kind() == kind)
            .count()
    }

    pub fn clear(&self) {
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

impl LogSink for MemorySink {
    fn write(&self, level: Severity, record: &LogRecord) {
        // A panic elsewhere while holding the lock must not stop logging.
        self.records
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((level, record.clone()));
    }
}

/// Process-wide default sink, created on first use.
pub fn shared_sink() -> Arc<dyn LogSink> {
    static SHARED: OnceLock<Arc<dyn LogSink>> = OnceLock::new();
    SHARED.get_or_init(|| Arc::new(TracingSink)).clone()
}
