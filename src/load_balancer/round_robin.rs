//! Round-robin load balancing strategies.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use crate::load_balancer::{server::Server, BalancingStrategy, NoServersAvailable};

/// Liveness-aware round-robin.
///
/// The cursor advances on every examined slot, picked or not, so concurrent
/// callers never observe the same slot.
#[derive(Debug, Default)]
pub struct RoundRobin {
    cursor: Mutex<usize>,
}

impl RoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalancingStrategy for RoundRobin {
    fn next(&self, servers: &[Arc<Server>]) -> Result<Arc<Server>, NoServersAvailable> {
        let len = servers.len();
        if len == 0 {
            return Err(NoServersAvailable);
        }

        let mut cursor = self.cursor.lock().unwrap_or_else(PoisonError::into_inner);
        for _ in 0..len {
            let candidate = &servers[*cursor % len];
            *cursor = (*cursor + 1) % len;
            if candidate.is_alive() {
                return Ok(candidate.clone());
            }
        }

        Err(NoServersAvailable)
    }

    fn name(&self) -> &'static str {
        "RoundRobin"
    }
}

/// Lock-free round-robin that ignores liveness.
///
/// Deprecated: kept only as an explicit opt-in mode. Prefer [`RoundRobin`],
/// which skips dead servers.
#[derive(Debug, Default)]
pub struct UncheckedRoundRobin {
    counter: AtomicUsize,
}

impl UncheckedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalancingStrategy for UncheckedRoundRobin {
    fn next(&self, servers: &[Arc<Server>]) -> Result<Arc<Server>, NoServersAvailable> {
        if servers.is_empty() {
            return Err(NoServersAvailable);
        }
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % servers.len();
        Ok(servers[index].clone())
    }

    fn name(&self) -> &'static str {
        "UncheckedRoundRobin"
    }
}
