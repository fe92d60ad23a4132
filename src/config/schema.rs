//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the balancer.
//! All types derive Serde traits for deserialization from config files.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Strategy used by services that do not name one.
pub const DEFAULT_STRATEGY: &str = "RoundRobin";

/// Root configuration for the balancer.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct BalancerConfig {
    /// Default balancing strategy name.
    pub strategy: String,

    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Health check settings shared by all pools.
    pub health_check: HealthCheckConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,

    /// Services, in declaration order.
    pub services: Vec<ServiceConfig>,
}

impl Default for BalancerConfig {
    fn default() -> Self {
        Self {
            strategy: DEFAULT_STRATEGY.to_string(),
            listener: ListenerConfig::default(),
            timeouts: TimeoutConfig::default(),
            health_check: HealthCheckConfig::default(),
            observability: ObservabilityConfig::default(),
            services: Vec::new(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind.
    pub host: String,

    /// Port to accept requests on.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
        }
    }
}

/// A routed service and its replicas.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServiceConfig {
    /// Service identifier for logging/metrics.
    pub name: String,

    /// Path prefix selecting this service.
    pub matcher: String,

    /// Balancing strategy; the top-level default applies when omitted.
    #[serde(default)]
    pub strategy: Option<String>,

    /// Whether replicas of this service are actively probed.
    #[serde(default = "default_true")]
    pub health_check: bool,

    /// Backend replicas, in balancing order.
    #[serde(default)]
    pub replicas: Vec<ReplicaConfig>,
}

impl ServiceConfig {
    /// The strategy name this service resolves to.
    pub fn strategy_name<'a>(&'a self, default: &'a str) -> &'a str {
        self.strategy.as_deref().unwrap_or(default)
    }
}

/// A single backend replica.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ReplicaConfig {
    /// Replica URL (e.g., "http://127.0.0.1:8001").
    pub url: String,

    /// Free-form tunables, e.g. `weight = "3"`.
    #[serde(default)]
    pub metadata: HashMap<String, String>,
}

fn default_true() -> bool {
    true
}

/// Health check configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct HealthCheckConfig {
    /// Enable active health checks.
    pub enabled: bool,

    /// Probe interval in seconds.
    pub interval_secs: u64,

    /// Probe timeout in seconds.
    pub timeout_secs: u64,

    /// HTTP path to probe. TCP connect probes are used when unset.
    pub path: Option<String>,
}

impl Default for HealthCheckConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 1,
            timeout_secs: 5,
            path: None,
        }
    }
}

/// Timeout configuration for forwarding.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Upstream connection establishment timeout in seconds.
    pub connect_secs: u64,

    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            connect_secs: 5,
            request_secs: 30,
        }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log line format.
    pub log_format: LogFormat,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Text,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
