//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe every server of one pool, each on its own schedule
//! - Update server liveness from each probe outcome
//! - Log liveness transitions only when they happen
//!
//! # Design Decisions
//! - Every tick starts one probe task per server; rounds never wait for each other
//! - A server whose previous probe is still running is skipped for that tick
//! - In-flight probes are aborted and joined on shutdown

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use futures_util::future::join_all;
use thiserror::Error;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{self, MissedTickBehavior};

use crate::health::probe::Probe;
use crate::lifecycle::ShutdownSignal;
use crate::load_balancer::Server;
use crate::observability::metrics;

#[derive(Debug, Error)]
pub enum HealthCheckError {
    #[error("expected at least one server for '{0}', got an empty list")]
    NoServers(String),
}

/// Background prober bound to the servers of one pool.
pub struct HealthChecker<P> {
    service: Arc<str>,
    servers: Vec<Arc<Server>>,
    interval: Duration,
    probe: Arc<P>,
}

/// Clears a server's in-flight flag when its probe task ends, even if aborted.
struct InFlight(Arc<AtomicBool>);

impl Drop for InFlight {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P: Probe> HealthChecker<P> {
    pub fn new(
        service: impl Into<String>,
        servers: Vec<Arc<Server>>,
        interval: Duration,
        probe: P,
    ) -> Result<Self, HealthCheckError> {
        let service = service.into();
        if servers.is_empty() {
            return Err(HealthCheckError::NoServers(service));
        }
        Ok(Self {
            service: service.into(),
            servers,
            interval,
            probe: Arc::new(probe),
        })
    }

    /// Run the checker on the current runtime until `shutdown` fires.
    pub fn spawn(self, shutdown: ShutdownSignal) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// Probe loop. The first tick fires immediately.
    pub async fn run(self, mut shutdown: ShutdownSignal) {
        tracing::info!(
            service = %self.service,
            servers = self.servers.len(),
            interval_secs = self.interval.as_secs_f64(),
            "Health checker starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let in_flight: Vec<Arc<AtomicBool>> = self
            .servers
            .iter()
            .map(|_| Arc::new(AtomicBool::new(false)))
            .collect();
        let mut probes = JoinSet::new();

        loop {
            tokio::select! {
                _ = shutdown.recv() => break,
                _ = ticker.tick() => {
                    for (server, busy) in self.servers.iter().zip(&in_flight) {
                        if busy.swap(true, Ordering::AcqRel) {
                            tracing::debug!(
                                service = %self.service,
                                server = %server.url(),
                                "Previous health check still running, skipping tick"
                            );
                            continue;
                        }
                        let guard = InFlight(busy.clone());
                        let service = self.service.clone();
                        let probe = self.probe.clone();
                        let server = server.clone();
                        probes.spawn(async move {
                            let _guard = guard;
                            check_server(&service, probe.as_ref(), &server).await;
                        });
                    }
                }
                Some(result) = probes.join_next() => {
                    if let Err(e) = result {
                        tracing::error!(
                            service = %self.service,
                            error = %e,
                            "Health check task failed"
                        );
                    }
                }
            }
        }

        probes.shutdown().await;
        tracing::info!(service = %self.service, "Health checker stopped");
    }

    /// Probe every server once, concurrently, and wait for all of them.
    pub async fn check_all(&self) {
        join_all(
            self.servers
                .iter()
                .map(|server| check_server(&self.service, self.probe.as_ref(), server)),
        )
        .await;
    }
}

async fn check_server<P: Probe>(service: &str, probe: &P, server: &Server) {
    let alive = match probe.check(server).await {
        Ok(()) => {
            if !server.set_liveness(true) {
                tracing::info!(
                    service = %service,
                    server = %server.url(),
                    "Health check succeeded, marking server alive"
                );
            }
            true
        }
        Err(e) => {
            tracing::debug!(
                service = %service,
                server = %server.url(),
                error = %e,
                "Health check failed"
            );
            if server.set_liveness(false) {
                tracing::warn!(
                    service = %service,
                    server = %server.url(),
                    error = %e,
                    "Health check failed, marking server unavailable"
                );
            }
            false
        }
    };

    metrics::record_server_liveness(service, server.authority(), alive);
}
