//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use service_balancer::config::{parse_config, BalancerConfig};
use service_balancer::lifecycle::{startup, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

/// Start a mock backend that answers every request with `body`.
pub async fn start_mock_backend(body: &'static str) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            tokio::spawn(async move {
                let mut buf = [0u8; 4096];
                let _ = socket.read(&mut buf).await;
                let response = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    body.len(),
                    body
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    addr
}

/// An address nothing listens on.
pub async fn closed_port() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap()
}

/// A running balancer and the handle to stop it.
pub struct Balancer {
    pub addr: SocketAddr,
    pub shutdown: Arc<Shutdown>,
    pub task: JoinHandle<Result<(), startup::StartupError>>,
}

impl Balancer {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Trigger shutdown and wait for the balancer to return.
    pub async fn stop(self) {
        self.shutdown.trigger();
        let result = tokio::time::timeout(Duration::from_secs(5), self.task)
            .await
            .expect("balancer did not stop in time")
            .expect("balancer task panicked");
        assert!(result.is_ok(), "balancer returned an error: {:?}", result);
    }
}

/// Start a balancer from a TOML document on an ephemeral port.
pub async fn start_balancer(toml: &str) -> Balancer {
    let config: BalancerConfig = parse_config(toml).unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let shutdown = Arc::new(Shutdown::new());

    let task = tokio::spawn(startup::run(config, listener, shutdown.clone()));
    Balancer { addr, shutdown, task }
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// GET `url` and return the status and body.
pub async fn get(client: &reqwest::Client, url: &str) -> (u16, String) {
    let res = client.get(url).send().await.expect("balancer unreachable");
    let status = res.status().as_u16();
    (status, res.text().await.unwrap())
}
