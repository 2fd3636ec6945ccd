//! HTTP server setup and pipeline wiring.
//!
//! # Responsibilities
//! - Wrap any axum `Router` in the observability pipeline
//! - Provide the demo host routes (`/health`, `/echo`)
//! - Bind to a listener with peer addresses recorded for the interceptor
//! - Shut down gracefully on signal or on an internal trigger
//!
//! # Layer order (outermost first)
//! ```text
//! TraceLayer → CorrelationLayer → TimeoutLayer → InterceptLayer → handlers
//! ```
//!
//! The timeout wraps the interceptor so body capture in both directions is
//! bounded by `timeouts.request_secs`.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    body::Bytes,
    http::{header, HeaderMap, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    routing::{any, get},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::{ConfigError, LensConfig};
use crate::http::correlation::CorrelationLayer;
use crate::http::intercept::InterceptLayer;
use crate::lifecycle::signals::wait_for_signal;
use crate::observability::LogSink;

/// Wrap `app` in the observability pipeline described by `config`.
///
/// Fails when the correlation options are missing or invalid, so a
/// misconfigured pipeline is never served.
#[allow(deprecated)]
pub fn with_pipeline(
    app: Router,
    config: &LensConfig,
    sink: Arc<dyn LogSink>,
) -> Result<Router, ConfigError> {
    let correlation = CorrelationLayer::new(config.correlation.clone())?;

    Ok(app
        .layer(InterceptLayer::new(sink, config.capture.clone()))
        .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
        .layer(correlation)
        .layer(TraceLayer::new_for_http()))
}

/// Routes served by the demo host.
pub fn demo_routes() -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/echo", any(echo))
        .fallback(not_found)
}

async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}

async fn health() -> &'static str {
    "ok"
}

/// Reflect the request body with its content type.
async fn echo(headers: HeaderMap, body: Bytes) -> Response {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .cloned()
        .unwrap_or_else(|| HeaderValue::from_static("application/octet-stream"));

    ([(header::CONTENT_TYPE, content_type)], body).into_response()
}

/// HTTP server hosting the demo routes behind the pipeline.
pub struct HttpServer {
    router: Router,
    config: LensConfig,
}

impl HttpServer {
    /// Create a new HTTP server with the given configuration and sink.
    pub fn new(config: LensConfig, sink: Arc<dyn LogSink>) -> Result<Self, ConfigError> {
        let router = with_pipeline(demo_routes(), &config, sink)?;
        Ok(Self { router, config })
    }

    /// Run the server until a shutdown signal or `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();

        axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                tokio::select! {
                    _ = shutdown.recv() => tracing::info!("Shutdown triggered"),
                    _ = wait_for_signal() => {}
                }
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }

    /// Get a reference to the config.
    pub fn config(&self) -> &LensConfig {
        &self.config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observability::MemorySink;
    use axum::body::Body;
    use axum::http::Request;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    #[test]
    fn refuses_to_build_without_correlation_options() {
        let config = LensConfig {
            correlation: None,
            ..LensConfig::default()
        };
        let result = HttpServer::new(config, Arc::new(MemorySink::new()));
        assert!(matches!(result, Err(ConfigError::InvalidConfiguration(_))));
    }

    #[tokio::test]
    async fn echo_reflects_body_and_content_type() {
        let sink = Arc::new(MemorySink::new());
        let app = with_pipeline(demo_routes(), &LensConfig::default(), sink.clone()).unwrap();

        let res = app
            .oneshot(
                Request::post("/echo")
                    .header("content-type", "text/plain")
                    .body(Body::from("ping"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(res.headers()["content-type"], "text/plain");
        assert!(res.headers().contains_key("x-correlation-id"));
        let body = res.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&body[..], b"ping");
        assert_eq!(sink.records().len(), 2);
    }

    #[tokio::test]
    async fn health_answers_ok() {
        let app = with_pipeline(
            demo_routes(),
            &LensConfig::default(),
            Arc::new(MemorySink::new()),
        )
        .unwrap();
        let res = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }
}
