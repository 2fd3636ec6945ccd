//! Correlation identifier propagation.
//!
//! # Responsibilities
//! - Adopt the correlation ID sent by the caller, or generate one (UUID v4)
//! - Make it available to everything downstream: request extensions, the
//!   request header, and a `request` tracing span wrapping the handler
//! - Optionally echo it on the response under the same header
//!
//! # Design Decisions
//! - Configuration problems surface when the layer is built, never per request
//! - Inbound IDs that are empty, non-ASCII or oversized are replaced, not rejected
//! - The echo uses `insert`, so the response carries exactly one value

use std::fmt;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use axum::http::{HeaderName, HeaderValue, Request, Response};
use tower::{Layer, Service};
use tracing::Instrument;
use uuid::Uuid;

use crate::config::validation::validate_correlation;
use crate::config::{ConfigError, CorrelationConfig};

/// Identifier tying together everything logged for one request.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CorrelationId(Arc<str>);

impl CorrelationId {
    /// Generate a new random identifier.
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string().into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for CorrelationId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Read access to the identifier attached by [`CorrelationLayer`].
pub trait CorrelationIdExt {
    fn correlation_id(&self) -> Option<&CorrelationId>;
}

impl<B> CorrelationIdExt for Request<B> {
    fn correlation_id(&self) -> Option<&CorrelationId> {
        self.extensions().get::<CorrelationId>()
    }
}

/// Tower layer establishing a [`CorrelationId`] for every request.
#[derive(Debug, Clone)]
pub struct CorrelationLayer {
    header: HeaderName,
    include_in_response: bool,
    max_length: usize,
}

impl CorrelationLayer {
    /// Build the layer from its options.
    ///
    /// Fails with [`ConfigError::InvalidConfiguration`] when the options are
    /// missing or name an unusable header.
    pub fn new(options: Option<CorrelationConfig>) -> Result<Self, ConfigError> {
        let options = options.ok_or_else(|| {
            ConfigError::InvalidConfiguration("correlation options are required".into())
        })?;
        validate_correlation(&options)
            .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))?;
        let header = HeaderName::from_bytes(options.header.as_bytes())
            .map_err(|e| ConfigError::InvalidConfiguration(e.to_string()))?;

        Ok(Self {
            header,
            include_in_response: options.include_in_response,
            max_length: options.max_length,
        })
    }
}

impl<S> Layer<S> for CorrelationLayer {
    type Service = CorrelationService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        CorrelationService {
            inner,
            layer: self.clone(),
        }
    }
}

/// Middleware service produced by [`CorrelationLayer`].
#[derive(Debug, Clone)]
pub struct CorrelationService<S> {
    inner: S,
    layer: CorrelationLayer,
}

impl<S> CorrelationService<S> {
    fn inbound_id<B>(&self, req: &Request<B>) -> Option<CorrelationId> {
        req.headers()
            .get(&self.layer.header)
            .and_then(|v| v.to_str().ok())
            .map(str::trim)
            .filter(|s| !s.is_empty() && s.len() <= self.layer.max_length)
            .map(CorrelationId::from)
    }
}

impl<S, ReqBody, ResBody> Service<Request<ReqBody>> for CorrelationService<S>
where
    S: Service<Request<ReqBody>, Response = Response<ResBody>> + Clone + Send + 'static,
    S::Future: Send + 'static,
    ReqBody: Send + 'static,
    ResBody: Send + 'static,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut req: Request<ReqBody>) -> Self::Future {
        let correlation_id = self.inbound_id(&req).unwrap_or_else(CorrelationId::generate);

        // A trimmed header value or a fresh UUID is always a valid header value.
        let header_value = HeaderValue::from_str(correlation_id.as_str()).ok();
        if let Some(value) = &header_value {
            req.headers_mut().insert(self.layer.header.clone(), value.clone());
        }
        req.extensions_mut().insert(correlation_id.clone());

        let span = tracing::info_span!(
            "request",
            correlation_id = %correlation_id,
            method = %req.method(),
            path = %req.uri().path(),
        );

        let echo = if self.layer.include_in_response {
            header_value.map(|value| (self.layer.header.clone(), value))
        } else {
            None
        };

        // Drive the instance that was polled ready; leave a fresh clone behind.
        let clone = self.inner.clone();
        let mut inner = std::mem::replace(&mut self.inner, clone);

        Box::pin(
            async move {
                let mut response = inner.call(req).await?;
                if let Some((name, value)) = echo {
                    response.headers_mut().insert(name, value);
                }
                Ok::<_, S::Error>(response)
            }
            .instrument(span),
        )
    }
}
