//! Request forwarding to a selected server.
//!
//! # Responsibilities
//! - Rewrite the inbound request URI onto the server's URL
//! - Record the client address in `X-Forwarded-For`
//! - Stream the upstream response back unchanged
//!
//! # Design Decisions
//! - Single-host reverse proxy semantics: server path + request path
//! - No retries; an upstream error is a 502 for this request only
//! - Requests always leave as HTTP/1.1

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header::HeaderValue, Request, StatusCode, Uri, Version},
    response::{IntoResponse, Response},
};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use url::Url;

use crate::config::TimeoutConfig;
use crate::load_balancer::Server;

pub const X_FORWARDED_FOR: &str = "x-forwarded-for";

/// Proxies one request to one server.
pub trait Forwarder: Send + Sync + 'static {
    fn forward(
        &self,
        server: &Server,
        request: Request<Body>,
    ) -> impl Future<Output = Response> + Send;
}

/// Forwarder backed by a pooled hyper client.
#[derive(Debug, Clone)]
pub struct HttpForwarder {
    client: Client<HttpConnector, Body>,
}

impl HttpForwarder {
    pub fn new(timeouts: &TimeoutConfig) -> Self {
        let mut connector = HttpConnector::new();
        connector.set_connect_timeout(Some(Duration::from_secs(timeouts.connect_secs)));
        let client = Client::builder(TokioExecutor::new()).build(connector);
        Self { client }
    }
}

impl Forwarder for HttpForwarder {
    async fn forward(&self, server: &Server, request: Request<Body>) -> Response {
        let request = match rewrite_request(server, request) {
            Ok(req) => req,
            Err(e) => {
                tracing::error!(
                    server = %server.url(),
                    error = %e,
                    "Failed to build upstream request"
                );
                return (StatusCode::BAD_GATEWAY, "Invalid upstream request").into_response();
            }
        };

        match self.client.request(request).await {
            Ok(response) => response.map(Body::new),
            Err(e) => {
                tracing::warn!(server = %server.url(), error = %e, "Upstream request failed");
                (StatusCode::BAD_GATEWAY, "Upstream request failed").into_response()
            }
        }
    }
}

/// Point `request` at `server`, keeping method, headers and body.
pub fn rewrite_request(
    server: &Server,
    request: Request<Body>,
) -> Result<Request<Body>, axum::http::Error> {
    let (mut parts, body) = request.into_parts();

    parts.uri = upstream_uri(server.url(), server.authority(), &parts.uri)?;
    parts.version = Version::HTTP_11;

    if let Some(ConnectInfo(peer)) = parts.extensions.get::<ConnectInfo<SocketAddr>>().copied() {
        let client_ip = peer.ip().to_string();
        let value = match parts.headers.get(X_FORWARDED_FOR).and_then(|v| v.to_str().ok()) {
            Some(prior) => format!("{}, {}", prior, client_ip),
            None => client_ip,
        };
        if let Ok(value) = HeaderValue::from_str(&value) {
            parts.headers.insert(X_FORWARDED_FOR, value);
        }
    }

    Ok(Request::from_parts(parts, body))
}

fn upstream_uri(target: &Url, authority: &str, inbound: &Uri) -> Result<Uri, axum::http::Error> {
    let path = join_paths(target.path(), inbound.path());
    let path_and_query = match (target.query(), inbound.query()) {
        (Some(a), Some(b)) if !a.is_empty() => format!("{}?{}&{}", path, a, b),
        (Some(a), None) if !a.is_empty() => format!("{}?{}", path, a),
        (_, Some(b)) => format!("{}?{}", path, b),
        _ => path,
    };

    Uri::builder()
        .scheme(target.scheme())
        .authority(authority)
        .path_and_query(path_and_query.as_str())
        .build()
}

/// Join two URL paths with exactly one slash between them.
fn join_paths(base: &str, path: &str) -> String {
    match (base.ends_with('/'), path.starts_with('/')) {
        (true, true) => format!("{}{}", base, &path[1..]),
        (false, false) => format!("{}/{}", base, path),
        _ => format!("{}{}", base, path),
    }
}
