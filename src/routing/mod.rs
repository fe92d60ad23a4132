//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming Request (path)
//!     → registry.rs (service lookup)
//!     → matcher.rs (evaluate path prefixes)
//!     → Return: matched ServerPool or NoMatchingService
//!
//! Registry construction (at startup):
//!     ServiceConfig[]
//!     → Build one ServerPool per service
//!     → Keep (matcher, pool) in declaration order
//!     → Freeze as immutable, Arc-shared registry
//! ```
//!
//! # Design Decisions
//! - Registry built at startup, immutable at runtime
//! - No regex in hot path (prefix matching only)
//! - Deterministic: longest prefix wins, then declaration order

pub mod matcher;
pub mod registry;

use thiserror::Error;

pub use matcher::PathPrefixMatcher;
pub use registry::ServiceRegistry;

/// Per-request dispatch failures. Each one only fails the request it came from.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    /// No configured matcher is a prefix of the request path.
    #[error("no service matches path '{0}'")]
    NoMatchingService(String),

    /// Every replica of the matched service is dead.
    #[error("no servers available for service '{0}'")]
    NoServersAvailable(String),
}
