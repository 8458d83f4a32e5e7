//! API gateway
//!
//! Accepts HTTP requests on topic endpoints, queues each one as a job and
//! lets a fixed worker pool run it through admission, routing and
//! forwarding before replying with a uniform JSON envelope.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ ingress ──▶ dispatch queue (bounded)
//!                                       ▲                │
//!                                       │                ▼
//!                                  reply slot      worker pool (N tasks)
//!                                       │                │
//!                                       │                ▼
//!                                       │    admission ──▶ routing ──▶ forwarder ──▶ Backend
//!                                       │                                  │
//!                                       └────────── normalizer ◀───────────┘
//! ```

use std::path::PathBuf;

use api_gateway::config::{load_config, validate_config, ConfigError, GatewayConfig};
use api_gateway::lifecycle::shutdown_signal;
use api_gateway::observability::{logging, metrics};
use api_gateway::Gateway;
use clap::Parser;
use tokio::net::TcpListener;

#[derive(Parser, Debug)]
#[command(name = "api-gateway")]
#[command(about = "Topic-routed API gateway with a bounded worker pool", long_about = None)]
struct Args {
    /// TOML configuration file; the built-in demo routes are used when absent.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override `listener.bind_address`.
    #[arg(short, long)]
    bind: Option<String>,

    /// Override `dispatch.workers`.
    #[arg(short, long)]
    workers: Option<usize>,
}

fn resolve_config(args: &Args) -> Result<GatewayConfig, ConfigError> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => GatewayConfig::demo(),
    };

    if let Some(bind) = &args.bind {
        config.listener.bind_address = bind.clone();
    }
    if let Some(workers) = args.workers {
        config.dispatch.workers = workers;
    }

    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = resolve_config(&args)?;

    logging::init(&config.observability);

    tracing::info!("api-gateway v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        workers = config.dispatch.workers,
        queue_capacity = config.dispatch.queue_capacity,
        forward_ms = config.timeouts.forward_ms,
        request_timeout_secs = config.timeouts.request_secs,
        routes = config.routes.len(),
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let gateway = Gateway::from_config(config);
    let served = gateway.server().run(listener, shutdown_signal()).await;

    gateway.shutdown().await;
    served?;

    tracing::info!("Shutdown complete");
    Ok(())
}
