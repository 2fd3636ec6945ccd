//! HTTP observability pipeline.
//!
//! # Data Flow
//! ```text
//! TCP connection (axum::serve, peer address recorded)
//!     → correlation.rs (adopt or generate the correlation ID, open request span)
//!     → intercept.rs (buffer request, log it, time the handler,
//!                     capture response, log it, deliver it unchanged)
//!     → application handlers
//! ```

pub mod client_addr;
pub mod correlation;
pub mod intercept;
pub mod server;

pub use correlation::{CorrelationId, CorrelationIdExt, CorrelationLayer, CorrelationService};
pub use intercept::{CaptureError, InterceptLayer, InterceptService};
pub use server::{demo_routes, with_pipeline, HttpServer};
