//! Server pool management.
//!
//! # Responsibilities
//! - Own the fixed, ordered server list of one service
//! - Own the single strategy instance bound to that list
//! - Record whether the pool is health checked

use std::sync::Arc;

use thiserror::Error;

use crate::config::ServiceConfig;
use crate::load_balancer::{
    load_strategy,
    server::{Server, ServerError},
    BalancingStrategy, NoServersAvailable,
};

/// Errors raised while building a pool from a service definition.
#[derive(Debug, Error)]
pub enum PoolError {
    #[error("service '{0}' has no replicas")]
    Empty(String),

    #[error("service '{service}': {source}")]
    Replica {
        service: String,
        #[source]
        source: ServerError,
    },
}

/// A service's replicas together with the strategy that balances them.
///
/// Membership never changes after construction, which is what lets
/// strategies keep per-index state.
#[derive(Debug)]
pub struct ServerPool {
    name: String,
    servers: Vec<Arc<Server>>,
    strategy: Box<dyn BalancingStrategy>,
    health_checked: bool,
}

impl ServerPool {
    /// Create a pool. Fails if `servers` is empty.
    pub fn new(
        name: impl Into<String>,
        servers: Vec<Arc<Server>>,
        strategy: Box<dyn BalancingStrategy>,
    ) -> Result<Self, PoolError> {
        let name = name.into();
        if servers.is_empty() {
            return Err(PoolError::Empty(name));
        }
        Ok(Self {
            name,
            servers,
            strategy,
            health_checked: true,
        })
    }

    /// Build a pool from its service descriptor.
    ///
    /// `default_strategy` is used when the service does not name one.
    pub fn from_config(config: &ServiceConfig, default_strategy: &str) -> Result<Self, PoolError> {
        let servers = config
            .replicas
            .iter()
            .map(|replica| {
                Server::new(&replica.url, replica.metadata.clone())
                    .map(Arc::new)
                    .map_err(|source| PoolError::Replica {
                        service: config.name.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let strategy = load_strategy(config.strategy_name(default_strategy));
        let pool = Self::new(config.name.clone(), servers, strategy)?
            .with_health_check(config.health_check);

        tracing::info!(
            service = %pool.name,
            strategy = pool.strategy.name(),
            replicas = pool.servers.len(),
            health_checked = pool.health_checked,
            "Server pool ready"
        );
        Ok(pool)
    }

    /// Enable or disable active health checking for this pool.
    pub fn with_health_check(mut self, enabled: bool) -> Self {
        self.health_checked = enabled;
        self
    }

    /// Select the server for the next request.
    pub fn next(&self) -> Result<Arc<Server>, NoServersAvailable> {
        self.strategy.next(&self.servers)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn servers(&self) -> &[Arc<Server>] {
        &self.servers
    }

    pub fn strategy_name(&self) -> &'static str {
        self.strategy.name()
    }

    /// Whether a health checker should be bound to this pool.
    pub fn is_health_checked(&self) -> bool {
        self.health_checked
    }
}
