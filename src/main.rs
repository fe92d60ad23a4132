//! service-balancer
//!
//! Path-routed HTTP load balancer built with Tokio and Axum.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ routing registry ──▶ server pool ──▶ forwarder ──▶ Server
//!                                     (longest prefix)    (strategy)
//!
//!     health checkers ──(set liveness)──▶ servers of each pool
//!     lifecycle ──(shutdown)──▶ http server, health checkers
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use service_balancer::config::load_config;
use service_balancer::lifecycle::{signals, startup, Shutdown};
use service_balancer::observability::{init_logging, init_metrics};

#[derive(Debug, Parser)]
#[command(name = "service-balancer", version, about = "Path-routed HTTP load balancer")]
struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "config.toml")]
    config: PathBuf,

    /// Override the listener port from the configuration file.
    #[arg(short, long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let mut config = load_config(&cli.config)?;
    if let Some(port) = cli.port {
        config.listener.port = port;
    }

    init_logging(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "service-balancer starting");
    tracing::info!(
        config = %cli.config.display(),
        services = config.services.len(),
        strategy = %config.strategy,
        health_checks = config.health_check.enabled,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(config.listener.bind_address()).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Arc::new(Shutdown::new());
    signals::spawn_signal_handler(shutdown.clone());

    startup::run(config, listener, shutdown).await?;
    Ok(())
}
