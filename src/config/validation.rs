//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Reject services that cannot be routed (no matcher, no replicas)
//! - Reject malformed replica addresses before any pool is built
//! - Reject health probe paths that cannot form a request URI
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: BalancerConfig → Result<(), Vec<ValidationError>>
//! - Unknown strategy names are not errors; they fall back at pool build time

use axum::http::uri::PathAndQuery;
use thiserror::Error;

use crate::config::schema::BalancerConfig;
use crate::load_balancer::server::{Server, ServerError};

/// A single semantic problem in the configuration.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("no services configured")]
    NoServices,

    #[error("service #{0} has an empty name")]
    EmptyName(usize),

    #[error("service '{0}' has an empty matcher")]
    EmptyMatcher(String),

    #[error("service '{service}': matcher '{matcher}' must start with '/'")]
    RelativeMatcher { service: String, matcher: String },

    #[error("service '{0}' has no replicas")]
    NoReplicas(String),

    #[error("service '{service}': {source}")]
    Replica {
        service: String,
        #[source]
        source: ServerError,
    },

    #[error("health_check.{0} must be greater than zero")]
    ZeroHealthSetting(&'static str),

    #[error("health_check.path '{0}' must be an absolute request path")]
    InvalidHealthPath(String),
}

/// Check a parsed configuration for semantic problems.
pub fn validate_config(config: &BalancerConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.services.is_empty() {
        errors.push(ValidationError::NoServices);
    }

    for (i, service) in config.services.iter().enumerate() {
        if service.name.trim().is_empty() {
            errors.push(ValidationError::EmptyName(i));
        }

        if service.matcher.is_empty() {
            errors.push(ValidationError::EmptyMatcher(service.name.clone()));
        } else if !service.matcher.starts_with('/') {
            errors.push(ValidationError::RelativeMatcher {
                service: service.name.clone(),
                matcher: service.matcher.clone(),
            });
        }

        if service.replicas.is_empty() {
            errors.push(ValidationError::NoReplicas(service.name.clone()));
        }

        for replica in &service.replicas {
            if let Err(source) = Server::new(&replica.url, replica.metadata.clone()) {
                errors.push(ValidationError::Replica {
                    service: service.name.clone(),
                    source,
                });
            }
        }
    }

    if config.health_check.enabled {
        if config.health_check.interval_secs == 0 {
            errors.push(ValidationError::ZeroHealthSetting("interval_secs"));
        }
        if config.health_check.timeout_secs == 0 {
            errors.push(ValidationError::ZeroHealthSetting("timeout_secs"));
        }
        if let Some(path) = &config.health_check.path {
            if !path.starts_with('/') || PathAndQuery::try_from(path.as_str()).is_err() {
                errors.push(ValidationError::InvalidHealthPath(path.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
