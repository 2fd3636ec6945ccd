//! Request/response interception.
//!
//! # Responsibilities
//! - Buffer the inbound body for logging, then hand the same bytes downstream
//! - Time the downstream call and capture the body it produced
//! - Emit one request record before the call, and one response record or one
//!   exception record after it
//! - Deliver the captured response body to the client unchanged
//!
//! # Design Decisions
//! - The interceptor never rejects a request: the whole body is forwarded,
//!   and only the logged text is capped at `max_logged_body_bytes`
//! - Buffers are owned by the request future; dropping it (client abort,
//!   timeout) frees them and nothing is left waiting
//! - Handler panics are caught and treated like errors
//! - After logging a failure, [`FailurePolicy`] decides between a generic
//!   500 and handing the failure back to the host

use std::any::Any;
use std::error::Error as StdError;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Instant;

use axum::body::{Body, Bytes, HttpBody};
use axum::http::{header, Request, Response, StatusCode};
use axum::response::IntoResponse;
use axum::BoxError;
use futures_util::FutureExt;
use http_body_util::BodyExt;
use tower::{Layer, Service};

use crate::config::{CaptureConfig, FailurePolicy};
use crate::http::client_addr::remote_address;
use crate::observability::record::capped_body_text;
use crate::observability::{LogRecord, LogSink, Severity};

/// The inbound body stream failed before it could be buffered.
#[derive(Debug, thiserror::Error)]
#[error("failed to read request body")]
pub struct CaptureError(#[source] BoxError);

impl IntoResponse for CaptureError {
    fn into_response(self) -> axum::response::Response {
        StatusCode::BAD_REQUEST.into_response()
    }
}

/// Tower layer logging every request/response cycle to a [`LogSink`].
#[derive(Clone)]
pub struct InterceptLayer {
    sink: Arc<dyn LogSink>,
    options: CaptureConfig,
}

impl InterceptLayer {
    pub fn new(sink: Arc<dyn LogSink>, options: CaptureConfig) -> Self {
        Self { sink, options }
    }
}

impl<S> Layer<S> for InterceptLayer {
    type Service = InterceptService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        InterceptService {
            inner,
            sink: Arc::clone(&self.sink),
            options: self.options.clone(),
        }
    }
}

/// Middleware service produced by [`InterceptLayer`].
#[derive(Clone)]
pub struct InterceptService<S> {
    inner: S,
    sink: Arc<dyn LogSink>,
    options: CaptureConfig,
}

impl<S, ResBody> Service<Request<Body>> for InterceptService<S>
where
    S: Service<Request<Body>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    S::Error: StdError + Send + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    type Response = Response<Body>;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let clone = self.inner.clone();
        let inner = std::mem::replace(&mut self.inner, clone);
        let sink = Arc::clone(&self.sink);
        let options = self.options.clone();

        Box::pin(intercept(inner, sink, options, req))
    }
}

async fn intercept<S, ResBody>(
    mut inner: S,
    sink: Arc<dyn LogSink>,
    options: CaptureConfig,
    req: Request<Body>,
) -> Result<Response<Body>, S::Error>
where
    S: Service<Request<Body>, Response = Response<ResBody>>,
    S::Error: StdError + 'static,
    ResBody: HttpBody<Data = Bytes> + Send + 'static,
    ResBody::Error: Into<BoxError>,
{
    let started = Instant::now();

    let limit = options.max_logged_body_bytes;
    let req = match capture_request(req, limit).await {
        Ok((req, record)) => {
            sink.write(Severity::Information, &record);
            req
        }
        Err(err) => {
            tracing::debug!(error = %err, "request body capture failed");
            sink.write(Severity::Critical, &LogRecord::from_error(&err));
            return Ok(err.into_response());
        }
    };

    let outcome = AssertUnwindSafe(async { inner.call(req).await })
        .catch_unwind()
        .await;

    let response = match outcome {
        Ok(Ok(response)) => response,
        Ok(Err(err)) => {
            sink.write(Severity::Critical, &LogRecord::from_error(&err));
            return match options.failure_policy {
                FailurePolicy::InternalError => Ok(internal_error()),
                FailurePolicy::Propagate => Err(err),
            };
        }
        Err(panic) => {
            sink.write(Severity::Critical, &panic_record(panic.as_ref()));
            return match options.failure_policy {
                FailurePolicy::InternalError => Ok(internal_error()),
                FailurePolicy::Propagate => std::panic::resume_unwind(panic),
            };
        }
    };

    let (parts, body) = response.into_parts();
    let captured = match body.collect().await {
        Ok(collected) => collected.to_bytes(),
        Err(err) => {
            let err: BoxError = err.into();
            sink.write(Severity::Critical, &LogRecord::from_error(&*err));
            // The head is already built; a 500 is the only honest answer left.
            return Ok(internal_error());
        }
    };

    let record = LogRecord::Response {
        status_code: parts.status.as_u16(),
        elapsed_millis: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
        body_text: capped_body_text(&captured, limit),
    };
    sink.write(Severity::Information, &record);

    Ok(Response::from_parts(parts, Body::from(captured)))
}

/// Buffer the inbound body and build its request record.
///
/// The returned request carries a fresh body over the same bytes, so the
/// handler reads exactly what the client sent. `limit` caps the logged text
/// only; body size policy belongs to the application.
async fn capture_request(
    req: Request<Body>,
    limit: usize,
) -> Result<(Request<Body>, LogRecord), CaptureError> {
    let (parts, body) = req.into_parts();

    let bytes = body
        .collect()
        .await
        .map_err(|err| CaptureError(err.into()))?
        .to_bytes();

    let host = parts
        .headers
        .get(header::HOST)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| parts.uri.authority().map(ToString::to_string))
        .unwrap_or_default();

    let req = Request::from_parts(parts, Body::from(bytes.clone()));

    let record = LogRecord::Request {
        scheme: req.uri().scheme_str().unwrap_or("http").to_string(),
        host,
        path: req.uri().path().to_string(),
        query_string: req
            .uri()
            .query()
            .map(|q| format!("?{q}"))
            .unwrap_or_default(),
        body_text: capped_body_text(&bytes, limit),
        remote_address: remote_address(&req).map(|addr| addr.ip().to_string()),
    };

    Ok((req, record))
}

fn panic_record(payload: &(dyn Any + Send)) -> LogRecord {
    let message = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "handler panicked".to_string());

    LogRecord::Exception {
        message,
        cause: Some("panic".to_string()),
    }
}

fn internal_error() -> Response<Body> {
    StatusCode::INTERNAL_SERVER_ERROR.into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::SocketAddr;

    use axum::extract::ConnectInfo;

    #[tokio::test]
    async fn capture_keeps_body_readable() {
        let req = Request::builder()
            .uri("/items?x=1")
            .header("host", "api.local")
            .body(Body::from("hello"))
            .unwrap();

        let (req, record) = capture_request(req, 1024).await.unwrap();
        let replayed = req.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(&replayed[..], b"hello");
        assert_eq!(
            record,
            LogRecord::Request {
                scheme: "http".into(),
                host: "api.local".into(),
                path: "/items".into(),
                query_string: "?x=1".into(),
                body_text: "hello".into(),
                remote_address: None,
            }
        );
    }

    #[tokio::test]
    async fn capture_reads_authority_and_peer() {
        let addr: SocketAddr = "192.0.2.10:5000".parse().unwrap();
        let mut req = Request::builder()
            .uri("https://example.org/")
            .body(Body::empty())
            .unwrap();
        req.extensions_mut().insert(ConnectInfo(addr));

        let (_, record) = capture_request(req, 1024).await.unwrap();
        match record {
            LogRecord::Request {
                scheme,
                host,
                query_string,
                remote_address,
                ..
            } => {
                assert_eq!(scheme, "https");
                assert_eq!(host, "example.org");
                assert_eq!(query_string, "");
                assert_eq!(remote_address.as_deref(), Some("192.0.2.10"));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn capture_forwards_whole_body_and_caps_logged_text() {
        let req = Request::builder()
            .body(Body::from(vec![b'a'; 32]))
            .unwrap();

        let (req, record) = capture_request(req, 16).await.unwrap();
        let replayed = req.into_body().collect().await.unwrap().to_bytes();

        assert_eq!(replayed.len(), 32);
        match record {
            LogRecord::Request { body_text, .. } => {
                assert_eq!(body_text, format!("{}...[truncated 16 bytes]", "a".repeat(16)));
            }
            other => panic!("unexpected record: {other:?}"),
        }
    }

    #[tokio::test]
    async fn capture_reports_broken_stream_as_bad_request() {
        let chunks: Vec<Result<Bytes, std::io::Error>> = vec![
            Ok(Bytes::from_static(b"half")),
            Err(std::io::Error::other("client went away")),
        ];
        let req = Request::builder()
            .body(Body::from_stream(futures_util::stream::iter(chunks)))
            .unwrap();

        let err = capture_request(req, 1024).await.unwrap_err();
        assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn panic_payloads_become_messages() {
        let record = panic_record(&"boom");
        assert!(matches!(record, LogRecord::Exception { ref message, .. } if message == "boom"));

        let record = panic_record(&String::from("owned boom"));
        assert!(matches!(record, LogRecord::Exception { ref message, .. } if message == "owned boom"));

        let record = panic_record(&42_u8);
        assert!(matches!(record, LogRecord::Exception { ref message, .. } if message == "handler panicked"));
    }
}
