//! Service lookup and pool ownership.
//!
//! # Responsibilities
//! - Store (matcher, pool) pairs in declaration order
//! - Resolve a request path to exactly one pool
//! - Start one health checker per health-checked pool
//!
//! # Design Decisions
//! - Immutable after construction (shared via Arc, no locks)
//! - O(n) prefix scan (acceptable for typical service counts)
//! - Longest matching prefix wins; ties go to the first declared service
//! - Explicit NoMatchingService rather than silent default

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::{BalancerConfig, HealthCheckConfig};
use crate::health::active::HealthChecker;
use crate::health::probe::ProbeKind;
use crate::lifecycle::Shutdown;
use crate::load_balancer::{PoolError, ServerPool};
use crate::routing::matcher::PathPrefixMatcher;
use crate::routing::DispatchError;

/// All routable services, built once at startup.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    entries: Vec<(PathPrefixMatcher, Arc<ServerPool>)>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build every service pool from configuration.
    ///
    /// Any malformed replica aborts the whole build.
    pub fn from_config(config: &BalancerConfig) -> Result<Self, PoolError> {
        let mut registry = Self::new();
        for service in &config.services {
            let pool = ServerPool::from_config(service, &config.strategy)?;
            registry.register(service.matcher.clone(), pool);
        }
        Ok(registry)
    }

    /// Add a pool under `matcher`. Later registrations lose ties.
    pub fn register(&mut self, matcher: impl Into<String>, pool: ServerPool) {
        let matcher = PathPrefixMatcher::new(matcher);
        if let Some((_, existing)) = self.entries.iter().find(|(m, _)| *m == matcher) {
            tracing::warn!(
                matcher = %matcher.prefix(),
                service = %pool.name(),
                shadowed_by = %existing.name(),
                "Duplicate matcher; this service will never be selected"
            );
        }
        self.entries.push((matcher, Arc::new(pool)));
    }

    /// Resolve `path` to the pool with the longest matching prefix.
    pub fn match_path(&self, path: &str) -> Result<&Arc<ServerPool>, DispatchError> {
        let mut best: Option<&(PathPrefixMatcher, Arc<ServerPool>)> = None;
        for entry in self.entries.iter().filter(|(m, _)| m.matches(path)) {
            match best {
                Some((current, _)) if current.specificity() >= entry.0.specificity() => {}
                _ => best = Some(entry),
            }
        }

        best.map(|(_, pool)| pool)
            .ok_or_else(|| DispatchError::NoMatchingService(path.to_string()))
    }

    /// All pools in declaration order.
    pub fn pools(&self) -> impl Iterator<Item = &Arc<ServerPool>> {
        self.entries.iter().map(|(_, pool)| pool)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Spawn one health checker per health-checked pool.
    ///
    /// Every checker stops when `shutdown` is triggered; join the returned
    /// handles to wait for them.
    pub fn spawn_health_checks(
        &self,
        config: &HealthCheckConfig,
        shutdown: &Shutdown,
    ) -> Vec<JoinHandle<()>> {
        if !config.enabled {
            tracing::info!("Active health checks disabled");
            return Vec::new();
        }

        let interval = Duration::from_secs(config.interval_secs);
        self.pools()
            .filter(|pool| pool.is_health_checked())
            .filter_map(|pool| {
                match HealthChecker::new(
                    pool.name(),
                    pool.servers().to_vec(),
                    interval,
                    ProbeKind::from_config(config),
                ) {
                    Ok(checker) => Some(checker.spawn(shutdown.subscribe())),
                    Err(e) => {
                        tracing::error!(
                            service = %pool.name(),
                            error = %e,
                            "Health checker not started"
                        );
                        None
                    }
                }
            })
            .collect()
    }
}
