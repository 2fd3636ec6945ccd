//! HTTP traffic observability for axum services.
//!
//! Two tower layers do the work: [`http::CorrelationLayer`] gives every
//! request a correlation ID, and [`http::InterceptLayer`] logs the request,
//! the response (or the failure) and the time in between, while handing the
//! handler and the client exactly the bytes they would have seen without it.
//!
//! ```rust,no_run
//! use axum::{routing::get, Router};
//! use traffic_lens::{config::LensConfig, http::with_pipeline, observability::shared_sink};
//!
//! # fn build() -> Result<Router, traffic_lens::config::ConfigError> {
//! let app = Router::new().route("/items", get(|| async { "[]" }));
//! let app = with_pipeline(app, &LensConfig::default(), shared_sink())?;
//! # Ok(app)
//! # }
//! ```

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::LensConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
