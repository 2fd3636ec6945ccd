//! Shared helpers for the pipeline tests.

use std::net::SocketAddr;
use std::sync::Arc;

use axum::body::{Body, Bytes};
use axum::http::Response;
use axum::Router;
use http_body_util::BodyExt;
use tokio::net::TcpListener;

use traffic_lens::config::LensConfig;
use traffic_lens::http::{with_pipeline, HttpServer};
use traffic_lens::observability::{LogRecord, MemorySink, Severity};
use traffic_lens::Shutdown;

/// Wrap `app` in the pipeline, logging into a fresh in-memory sink.
#[allow(dead_code)]
pub fn observed(app: Router, config: &LensConfig) -> (Router, Arc<MemorySink>) {
    let sink = Arc::new(MemorySink::new());
    let app = with_pipeline(app, config, sink.clone()).expect("valid pipeline config");
    (app, sink)
}

#[allow(dead_code)]
pub async fn body_bytes(res: Response<Body>) -> Bytes {
    res.into_body().collect().await.unwrap().to_bytes()
}

/// Records of one kind, in emission order.
#[allow(dead_code)]
pub fn of_kind(sink: &MemorySink, kind: &str) -> Vec<(Severity, LogRecord)> {
    sink.records()
        .into_iter()
        .filter(|(_, record)| record.kind() == kind)
        .collect()
}

/// Start the demo host on an ephemeral port.
///
/// The returned [`Shutdown`] must stay alive for as long as the server
/// should keep running.
#[allow(dead_code)]
pub async fn start_demo_host(config: LensConfig) -> (SocketAddr, Arc<MemorySink>, Shutdown) {
    let sink = Arc::new(MemorySink::new());
    let server = HttpServer::new(config, sink.clone()).expect("valid server config");
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    (addr, sink, shutdown)
}
