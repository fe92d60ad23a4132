//! Reachability probes.
//!
//! # Responsibilities
//! - Answer "is this server reachable right now?" within a bounded time
//! - TCP connect probe (default) and HTTP GET probe (when a path is configured)

use std::future::Future;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use hyper_util::{
    client::legacy::{connect::HttpConnector, Client},
    rt::TokioExecutor,
};
use thiserror::Error;
use tokio::net::TcpStream;
use tokio::time;

use crate::config::HealthCheckConfig;
use crate::load_balancer::Server;

/// Why a probe considered a server unreachable.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(#[from] std::io::Error),

    #[error("request failed: {0}")]
    Request(String),

    #[error("unhealthy status {0}")]
    Status(StatusCode),
}

/// A single reachability check against one server.
pub trait Probe: Send + Sync + 'static {
    fn check(&self, server: &Server) -> impl Future<Output = Result<(), ProbeError>> + Send;
}

/// Succeeds when a TCP connection to the server can be opened.
#[derive(Debug, Clone)]
pub struct TcpProbe {
    timeout: Duration,
}

impl TcpProbe {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }
}

impl Probe for TcpProbe {
    async fn check(&self, server: &Server) -> Result<(), ProbeError> {
        match time::timeout(self.timeout, TcpStream::connect(server.authority())).await {
            Ok(Ok(_stream)) => Ok(()),
            Ok(Err(e)) => Err(ProbeError::Connect(e)),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

/// Succeeds when `GET <path>` on the server answers with a 2xx status.
#[derive(Debug, Clone)]
pub struct HttpProbe {
    client: Client<HttpConnector, Body>,
    path: String,
    timeout: Duration,
}

impl HttpProbe {
    pub fn new(path: impl Into<String>, timeout: Duration) -> Self {
        let client = Client::builder(TokioExecutor::new()).build(HttpConnector::new());
        Self {
            client,
            path: path.into(),
            timeout,
        }
    }
}

impl Probe for HttpProbe {
    async fn check(&self, server: &Server) -> Result<(), ProbeError> {
        let uri = format!("http://{}{}", server.authority(), self.path);
        let request = Request::builder()
            .method("GET")
            .uri(uri)
            .header("user-agent", "service-balancer-health-check")
            .body(Body::empty())
            .map_err(|e| ProbeError::Request(e.to_string()))?;

        match time::timeout(self.timeout, self.client.request(request)).await {
            Ok(Ok(response)) if response.status().is_success() => Ok(()),
            Ok(Ok(response)) => Err(ProbeError::Status(response.status())),
            Ok(Err(e)) => Err(ProbeError::Request(e.to_string())),
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        }
    }
}

/// The probe selected by configuration.
#[derive(Debug, Clone)]
pub enum ProbeKind {
    Tcp(TcpProbe),
    Http(HttpProbe),
}

impl ProbeKind {
    pub fn from_config(config: &HealthCheckConfig) -> Self {
        let timeout = Duration::from_secs(config.timeout_secs);
        match &config.path {
            Some(path) => Self::Http(HttpProbe::new(path.clone(), timeout)),
            None => Self::Tcp(TcpProbe::new(timeout)),
        }
    }
}

impl Probe for ProbeKind {
    async fn check(&self, server: &Server) -> Result<(), ProbeError> {
        match self {
            Self::Tcp(probe) => probe.check(server).await,
            Self::Http(probe) => probe.check(server).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    fn server_at(addr: std::net::SocketAddr) -> Server {
        Server::new(&format!("http://{}", addr), HashMap::new()).unwrap()
    }

    async fn closed_port() -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        addr
    }

    async fn http_backend(status_line: &'static str) -> std::net::SocketAddr {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            while let Ok((mut socket, _)) = listener.accept().await {
                tokio::spawn(async move {
                    let mut buf = [0u8; 1024];
                    let _ = socket.read(&mut buf).await;
                    let response = format!(
                        "HTTP/1.1 {}\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                        status_line
                    );
                    let _ = socket.write_all(response.as_bytes()).await;
                    let _ = socket.shutdown().await;
                });
            }
        });
        addr
    }

    #[tokio::test]
    async fn test_tcp_probe_success() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let server = server_at(listener.local_addr().unwrap());

        let probe = TcpProbe::new(Duration::from_secs(1));
        assert!(probe.check(&server).await.is_ok());
    }

    #[tokio::test]
    async fn test_tcp_probe_refused() {
        let server = server_at(closed_port().await);

        let probe = TcpProbe::new(Duration::from_secs(1));
        assert!(matches!(probe.check(&server).await, Err(ProbeError::Connect(_))));
    }

    #[tokio::test]
    async fn test_http_probe_status() {
        let healthy = server_at(http_backend("200 OK").await);
        let failing = server_at(http_backend("503 Service Unavailable").await);

        let probe = HttpProbe::new("/health", Duration::from_secs(2));
        assert!(probe.check(&healthy).await.is_ok());
        assert!(matches!(
            probe.check(&failing).await,
            Err(ProbeError::Status(StatusCode::SERVICE_UNAVAILABLE))
        ));
    }

    #[test]
    fn test_probe_kind_from_config() {
        let mut config = HealthCheckConfig::default();
        assert!(matches!(ProbeKind::from_config(&config), ProbeKind::Tcp(_)));

        config.path = Some("/health".into());
        assert!(matches!(ProbeKind::from_config(&config), ProbeKind::Http(_)));
    }
}
