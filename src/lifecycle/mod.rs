//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (startup.rs):
//!     Build registry → Start health checkers → Serve requests
//!
//! Shutdown (shutdown.rs):
//!     Trigger → Stop accepting → Drain requests → Join health checkers
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Ordered startup: registry first, then background tasks, then traffic
//! - Fail fast: a malformed replica aborts startup
//! - Every background task observes the same shutdown signal

pub mod shutdown;
pub mod signals;
pub mod startup;

pub use shutdown::{Shutdown, ShutdownSignal};
