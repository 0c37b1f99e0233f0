//! Service orchestrator gateway.
//!
//! ```text
//!     Client ──▶ /api/{service}/...
//!                  │
//!                  ▼
//!        ┌──────────────────┐    ┌──────────────┐    ┌────────────┐
//!        │   PathRouter     │───▶│  Forwarder   │───▶│  backend   │
//!        │ (registry lookup)│    │ (pooled, 30s)│    │  service   │
//!        └──────────────────┘    └──────┬───────┘    └────────────┘
//!                                       ▼
//!                            ┌────────────────────┐
//!     Client ◀───────────────│ ResponseTransformer│
//!                            └────────────────────┘
//! ```

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use orchestrator::config::load_or_default;
use orchestrator::http::HttpServer;
use orchestrator::lifecycle::{wait_for_shutdown_signal, Shutdown};
use orchestrator::observability::{init_logging, init_metrics};

#[derive(Parser)]
#[command(name = "orchestrator")]
#[command(about = "Single HTTP entry point for a set of backend services", long_about = None)]
struct Args {
    /// Path to a TOML config file; built-in defaults are used when absent.
    #[arg(short, long, env = "ORCHESTRATOR_CONFIG")]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = load_or_default(args.config.as_deref())?;
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "orchestrator starting");

    tracing::info!(
        bind_address = %config.listener.bind_address,
        services = ?config.services.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
        upstream_timeout_secs = config.timeouts.upstream_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let bind_address = config.listener.bind_address.clone();
    let server = HttpServer::new(config)?;

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let signal_shutdown = shutdown.clone();
    tokio::spawn(async move {
        wait_for_shutdown_signal().await;
        signal_shutdown.trigger();
    });

    server.run(listener, shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
