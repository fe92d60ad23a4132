//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (one task per pool)
//!     → Probe each server concurrently (probe.rs)
//!     → Server::set_liveness(outcome)
//!     → Log only when the previous value differs
//!
//! Liveness per server:
//!     Unknown (starts alive) → Alive ⇄ Dead
//! ```
//!
//! # Design Decisions
//! - One probe outcome flips liveness; there is no hysteresis
//! - Probe failures are logged, never surfaced to request handling
//! - Checkers stop on the shared shutdown signal and can be joined

pub mod active;
pub mod probe;

pub use active::{HealthCheckError, HealthChecker};
pub use probe::{HttpProbe, Probe, ProbeError, ProbeKind, TcpProbe};
