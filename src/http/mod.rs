//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, middleware)
//!     → request.rs (request ID)
//!     → [registry matches a service, pool picks a server]
//!     → forward.rs (rewrite URI, proxy to the server)
//!     → response.rs (dispatch failures as 404 / 503)
//!     → Send to client
//! ```

pub mod forward;
pub mod request;
pub mod response;
pub mod server;

pub use forward::{Forwarder, HttpForwarder, X_FORWARDED_FOR};
pub use request::{MakeRequestUuidV4, X_REQUEST_ID};
pub use server::HttpServer;
