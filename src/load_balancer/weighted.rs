//! Weighted round-robin load balancing strategy.

use std::sync::{Arc, Mutex, PoisonError};

use crate::load_balancer::{server::Server, BalancingStrategy, NoServersAvailable};

/// Weighted round-robin selector.
///
/// A server with weight `w` is returned on `w` consecutive calls before the
/// cursor moves on. Dead servers are skipped and their quota is reset, so a
/// server coming back to life starts from zero.
///
/// The strategy assumes it always sees the same server list; `ServerPool`
/// guarantees this by owning both.
#[derive(Debug, Default)]
pub struct WeightedRoundRobin {
    state: Mutex<WeightedState>,
}

#[derive(Debug, Default)]
struct WeightedState {
    /// Requests served by each index since its quota was last reset.
    counts: Vec<u32>,
    cursor: usize,
}

impl WeightedState {
    fn reset_and_advance(&mut self, len: usize) {
        self.counts[self.cursor] = 0;
        self.cursor = (self.cursor + 1) % len;
    }
}

impl WeightedRoundRobin {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BalancingStrategy for WeightedRoundRobin {
    fn next(&self, servers: &[Arc<Server>]) -> Result<Arc<Server>, NoServersAvailable> {
        let len = servers.len();
        if len == 0 {
            return Err(NoServersAvailable);
        }

        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.counts.len() != len {
            debug_assert!(state.counts.is_empty(), "server list resized under a weighted strategy");
            state.counts = vec![0; len];
            state.cursor = 0;
        }

        // A saturated slot is revisited at most once with a fresh quota, so
        // 2 * len steps always reach an alive server if one exists.
        let mut dead_seen = 0;
        for _ in 0..2 * len {
            let index = state.cursor;
            let candidate = &servers[index];

            if !candidate.is_alive() {
                dead_seen += 1;
                state.reset_and_advance(len);
                if dead_seen == len {
                    break;
                }
                continue;
            }

            if state.counts[index] < candidate.weight() {
                state.counts[index] += 1;
                return Ok(candidate.clone());
            }

            state.reset_and_advance(len);
        }

        Err(NoServersAvailable)
    }

    fn name(&self) -> &'static str {
        "WeightedRoundRobin"
    }
}
