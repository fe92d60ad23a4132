//! Load balancing subsystem.
//!
//! # Data Flow
//! ```text
//! Service matched → ServerPool identified
//!     → pool.rs (fixed, ordered server list)
//!     → Apply the pool's strategy:
//!         - round_robin.rs (rotate through alive servers)
//!         - weighted.rs (serve each server `weight` times in a row)
//!     → Return selected server or NoServersAvailable
//! ```
//!
//! # Design Decisions
//! - One strategy instance per pool; counters are never shared across pools
//! - Strategy state is guarded by a mutex held only for in-memory updates
//! - Dead servers are skipped; a call fails only when every candidate is dead
//! - Strategies are built through an explicit factory (strategy.rs)

pub mod pool;
pub mod round_robin;
pub mod server;
pub mod strategy;
pub mod weighted;

use std::sync::Arc;

use thiserror::Error;

pub use pool::{PoolError, ServerPool};
pub use server::{Server, ServerError};
pub use strategy::{load_strategy, StrategyKind};

/// Every server examined by a strategy call was dead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no servers available")]
pub struct NoServersAvailable;

/// Selection policy over an ordered, fixed-membership list of servers.
pub trait BalancingStrategy: Send + Sync + std::fmt::Debug {
    /// Pick the server for the next request.
    fn next(&self, servers: &[Arc<Server>]) -> Result<Arc<Server>, NoServersAvailable>;

    /// Canonical strategy name, as accepted by [`load_strategy`].
    fn name(&self) -> &'static str;
}
