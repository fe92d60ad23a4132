//! Startup orchestration.
//!
//! # Responsibilities
//! - Build every service pool from validated configuration
//! - Start background tasks (health checks)
//! - Serve traffic on an already bound listener until shutdown
//! - Join background tasks before returning

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use crate::config::BalancerConfig;
use crate::http::{forward::HttpForwarder, HttpServer};
use crate::lifecycle::Shutdown;
use crate::load_balancer::PoolError;
use crate::routing::ServiceRegistry;

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to build service pools: {0}")]
    Pool(#[from] PoolError),

    #[error("server error: {0}")]
    Io(#[from] std::io::Error),
}

/// Run the balancer until `shutdown` is triggered.
pub async fn run(
    config: BalancerConfig,
    listener: TcpListener,
    shutdown: Arc<Shutdown>,
) -> Result<(), StartupError> {
    let registry = Arc::new(ServiceRegistry::from_config(&config)?);
    tracing::info!(services = registry.len(), "Service registry built");

    let health_tasks = registry.spawn_health_checks(&config.health_check, &shutdown);

    let forwarder = HttpForwarder::new(&config.timeouts);
    let server = HttpServer::new(registry, forwarder, &config.timeouts);
    let served = server.run(listener, shutdown.subscribe()).await;

    // The server may also stop on its own (e.g. an accept error).
    shutdown.trigger();
    for task in health_tasks {
        if let Err(e) = task.await {
            tracing::error!(error = %e, "Health checker task failed");
        }
    }

    served?;
    tracing::info!("Shutdown complete");
    Ok(())
}
