//! Path-routed HTTP load balancer library.

pub mod config;
pub mod health;
pub mod http;
pub mod lifecycle;
pub mod load_balancer;
pub mod observability;
pub mod routing;

pub use config::BalancerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
pub use load_balancer::{BalancingStrategy, Server, ServerPool};
pub use routing::ServiceRegistry;
