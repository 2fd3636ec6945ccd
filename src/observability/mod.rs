//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Middleware produces:
//!     → record.rs (LogRecord: request, response, exception)
//!     → sink.rs (LogSink::write, one structured event per record)
//!     → logging.rs (global subscriber: filter + fmt layer)
//!
//! Consumers:
//!     → stdout (pretty or JSON), or whatever subscriber the host installs
//!     → MemorySink for in-process inspection
//! ```
//!
//! # Design Decisions
//! - Records are a closed enum; sinks match exhaustively
//! - Sinks never fail outward: logging must not break the traffic it observes
//! - Correlation IDs arrive through the enclosing tracing span

pub mod logging;
pub mod record;
pub mod sink;

pub use record::{LogRecord, Severity};
pub use sink::{shared_sink, LogSink, MemorySink, TracingSink};
