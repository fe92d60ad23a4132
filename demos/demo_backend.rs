//! Demo backend for exercising the balancer by hand.
//!
//! Start one per replica in `config.toml`:
//!
//! ```text
//! cargo run --example demo_backend -- --port 8001 --name api
//! cargo run --example demo_backend -- --port 8003 --name web
//! ```

use std::net::SocketAddr;

use axum::{extract::State, routing::get, Router};
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "demo_backend", about = "Answers every request with its own name and port")]
struct Cli {
    /// Port to listen on.
    #[arg(short, long, default_value_t = 8001)]
    port: u16,

    /// Service name included in every response.
    #[arg(short, long, default_value = "api")]
    name: String,
}

/// Response body naming this backend.
fn greeting(name: &str, port: u16) -> String {
    format!("Hello from {} service at {}", name, port)
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt().with_env_filter("info").init();
    let cli = Cli::parse();

    let body = greeting(&cli.name, cli.port);
    let app = Router::new()
        .route("/health", get(|| async { "ok" }))
        .fallback(|State(body): State<String>| async move { body })
        .with_state(body);

    let addr = SocketAddr::from(([127, 0, 0, 1], cli.port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(address = %addr, service = %cli.name, "Demo backend listening");

    axum::serve(listener, app).await?;
    Ok(())
}
