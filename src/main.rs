//! traffic-lens demo host.
//!
//! Serves `/health` and `/echo` behind the observability pipeline so the
//! request, response and exception records can be watched end to end.

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use traffic_lens::config::{load_config, validation::validate_config, ConfigError, LensConfig};
use traffic_lens::observability::{logging::init_logging, shared_sink};
use traffic_lens::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "traffic-lens")]
#[command(about = "HTTP request/response logging pipeline", long_about = None)]
struct Cli {
    /// TOML configuration file; built-in defaults when omitted.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = match &cli.config {
        Some(path) => load_config(path)?,
        None => LensConfig::default(),
    };
    if let Some(bind) = cli.bind {
        config.listener.bind_address = bind;
        validate_config(&config).map_err(ConfigError::Validation)?;
    }

    if let Err(e) = init_logging(&config.observability) {
        eprintln!("logging already initialized: {e}");
    }

    tracing::info!("traffic-lens v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        request_timeout_secs = config.timeouts.request_secs,
        failure_policy = ?config.capture.failure_policy,
        "Configuration loaded"
    );

    let server = HttpServer::new(config, shared_sink())?;

    let listener = TcpListener::bind(&server.config().listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
