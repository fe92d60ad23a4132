//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with the dispatch handler
//! - Wire up middleware (tracing, request ID, timeout)
//! - Dispatch requests through the service registry
//! - Hand the selected server to the forwarder
//! - Serve until the shutdown signal fires

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::State,
    http::Request,
    response::{IntoResponse, Response},
    Router,
};
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::TimeoutConfig;
use crate::http::forward::Forwarder;
use crate::http::request::{request_id, MakeRequestUuidV4};
use crate::lifecycle::ShutdownSignal;
use crate::observability::metrics;
use crate::routing::{DispatchError, ServiceRegistry};

/// Application state injected into handlers.
pub struct AppState<F> {
    pub registry: Arc<ServiceRegistry>,
    pub forwarder: Arc<F>,
}

impl<F> Clone for AppState<F> {
    fn clone(&self) -> Self {
        Self {
            registry: self.registry.clone(),
            forwarder: self.forwarder.clone(),
        }
    }
}

/// HTTP front door of the balancer.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    /// Create a new HTTP server dispatching through `registry`.
    pub fn new<F: Forwarder>(
        registry: Arc<ServiceRegistry>,
        forwarder: F,
        timeouts: &TimeoutConfig,
    ) -> Self {
        let state = AppState {
            registry,
            forwarder: Arc::new(forwarder),
        };
        Self {
            router: Self::build_router(state, timeouts),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router<F: Forwarder>(state: AppState<F>, timeouts: &TimeoutConfig) -> Router {
        Router::new()
            .fallback(dispatch_handler::<F>)
            .with_state(state)
            .layer(
                ServiceBuilder::new()
                    .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV4))
                    .layer(TraceLayer::new_for_http())
                    .layer(PropagateRequestIdLayer::x_request_id())
                    .layer(TimeoutLayer::new(Duration::from_secs(timeouts.request_secs))),
            )
    }

    /// The router, for in-process testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: ShutdownSignal,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        let app = self.router.into_make_service_with_connect_info::<SocketAddr>();
        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.recv().await })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}

/// Resolve the service, pick a server, and forward the request.
async fn dispatch_handler<F: Forwarder>(
    State(state): State<AppState<F>>,
    request: Request<Body>,
) -> Response {
    let start_time = Instant::now();
    let request_id = request_id(&request).to_string();
    let path = request.uri().path().to_string();

    let pool = match state.registry.match_path(&path) {
        Ok(pool) => pool,
        Err(e) => {
            tracing::warn!(request_id = %request_id, path = %path, "No service matched");
            metrics::record_request("none", e.status().as_u16(), start_time);
            return e.into_response();
        }
    };

    let server = match pool.next() {
        Ok(server) => server,
        Err(_) => {
            let e = DispatchError::NoServersAvailable(pool.name().to_string());
            tracing::warn!(
                request_id = %request_id,
                service = %pool.name(),
                "No servers available"
            );
            metrics::record_request(pool.name(), e.status().as_u16(), start_time);
            return e.into_response();
        }
    };

    tracing::debug!(
        request_id = %request_id,
        service = %pool.name(),
        server = %server.url(),
        path = %path,
        "Forwarding request"
    );

    let response = state.forwarder.forward(&server, request).await;
    metrics::record_request(pool.name(), response.status().as_u16(), start_time);
    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::load_balancer::{
        round_robin::RoundRobin, weighted::WeightedRoundRobin, Server, ServerPool,
    };
    use axum::http::StatusCode;
    use std::collections::HashMap;
    use tower::ServiceExt;

    /// Answers with the authority of the server it was handed.
    struct EchoForwarder;

    impl Forwarder for EchoForwarder {
        async fn forward(&self, server: &Server, _request: Request<Body>) -> Response {
            server.authority().to_string().into_response()
        }
    }

    fn pool(name: &str, weights: &[u32], weighted: bool) -> ServerPool {
        let servers = weights
            .iter()
            .enumerate()
            .map(|(i, w)| {
                let mut metadata = HashMap::new();
                metadata.insert("weight".to_string(), w.to_string());
                Arc::new(Server::new(&format!("http://10.0.0.{}:80", i + 1), metadata).unwrap())
            })
            .collect();
        let strategy: Box<dyn crate::load_balancer::BalancingStrategy> = if weighted {
            Box::new(WeightedRoundRobin::new())
        } else {
            Box::new(RoundRobin::new())
        };
        ServerPool::new(name, servers, strategy).unwrap()
    }

    async fn send(router: &Router, path: &str) -> (StatusCode, String) {
        let request = Request::builder().uri(path).body(Body::empty()).unwrap();
        let response = router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, String::from_utf8(body.to_vec()).unwrap())
    }

    fn server_with(registry: ServiceRegistry) -> HttpServer {
        HttpServer::new(Arc::new(registry), EchoForwarder, &TimeoutConfig::default())
    }

    #[tokio::test]
    async fn test_round_robin_sequence() {
        let mut registry = ServiceRegistry::new();
        registry.register("/api", pool("api", &[1, 1, 1], false));
        let router = server_with(registry).router();

        let mut seen = Vec::new();
        for _ in 0..6 {
            let (status, body) = send(&router, "/api/items").await;
            assert_eq!(status, StatusCode::OK);
            seen.push(body);
        }
        assert_eq!(
            seen,
            [
                "10.0.0.1:80",
                "10.0.0.2:80",
                "10.0.0.3:80",
                "10.0.0.1:80",
                "10.0.0.2:80",
                "10.0.0.3:80"
            ]
        );
    }

    #[tokio::test]
    async fn test_weighted_sequence() {
        let mut registry = ServiceRegistry::new();
        registry.register("/", pool("web", &[1, 2, 1], true));
        let router = server_with(registry).router();

        let mut seen = Vec::new();
        for _ in 0..4 {
            seen.push(send(&router, "/").await.1);
        }
        assert_eq!(seen, ["10.0.0.1:80", "10.0.0.2:80", "10.0.0.2:80", "10.0.0.3:80"]);
    }

    #[tokio::test]
    async fn test_unmatched_path_is_not_found() {
        let mut registry = ServiceRegistry::new();
        registry.register("/api", pool("api", &[1], false));
        let router = server_with(registry).router();

        let (status, _) = send(&router, "/images/logo.png").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_all_dead_is_unavailable_for_that_pool_only() {
        let dead = pool("dead", &[1, 1], false);
        for server in dead.servers() {
            server.set_liveness(false);
        }
        let mut registry = ServiceRegistry::new();
        registry.register("/dead", dead);
        registry.register("/live", pool("live", &[1], false));
        let router = server_with(registry).router();

        for _ in 0..3 {
            assert_eq!(send(&router, "/dead/x").await.0, StatusCode::SERVICE_UNAVAILABLE);
        }
        assert_eq!(send(&router, "/live/x").await.0, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_request_id_is_set() {
        let mut registry = ServiceRegistry::new();
        registry.register("/", pool("web", &[1], false));
        let router = server_with(registry).router();

        let request = Request::builder().uri("/").body(Body::empty()).unwrap();
        let response = router.oneshot(request).await.unwrap();
        assert!(response.headers().contains_key("x-request-id"));
    }
}
