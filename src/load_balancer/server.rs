//! Backend replica abstraction.
//!
//! # Responsibilities
//! - Represent a single backend replica (target URL + metadata)
//! - Track liveness as a lock-free flag written by health probes
//! - Expose typed metadata accessors (e.g. the `weight` tunable)

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use thiserror::Error;
use url::Url;

/// Metadata key read by weighted strategies.
pub const WEIGHT_KEY: &str = "weight";

/// Errors raised while constructing a [`Server`] from a replica definition.
#[derive(Debug, Error)]
pub enum ServerError {
    /// The replica URL could not be parsed.
    #[error("invalid replica url '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    /// Only plain HTTP upstreams are supported.
    #[error("unsupported scheme '{scheme}' in replica url '{url}'")]
    UnsupportedScheme { url: String, scheme: String },

    /// The URL has no host to connect to.
    #[error("replica url '{0}' has no host")]
    MissingHost(String),
}

/// A single backend replica.
#[derive(Debug)]
pub struct Server {
    url: Url,
    /// `host:port`, with the scheme's default port filled in.
    authority: String,
    metadata: HashMap<String, String>,
    weight: u32,
    alive: AtomicBool,
}

impl Server {
    /// Create a server from a replica URL and its metadata.
    ///
    /// Servers start out alive so traffic flows before the first probe round.
    pub fn new(url: &str, metadata: HashMap<String, String>) -> Result<Self, ServerError> {
        let parsed = Url::parse(url).map_err(|source| ServerError::InvalidUrl {
            url: url.to_string(),
            source,
        })?;

        if parsed.scheme() != "http" {
            return Err(ServerError::UnsupportedScheme {
                url: url.to_string(),
                scheme: parsed.scheme().to_string(),
            });
        }

        let host = parsed
            .host_str()
            .filter(|h| !h.is_empty())
            .ok_or_else(|| ServerError::MissingHost(url.to_string()))?;
        let port = parsed.port_or_known_default().unwrap_or(80);
        let authority = format!("{}:{}", host, port);

        let mut server = Self {
            url: parsed,
            authority,
            metadata,
            weight: 1,
            alive: AtomicBool::new(true),
        };
        server.weight = server
            .metadata_int_or_default(WEIGHT_KEY, 1)
            .clamp(1, i64::from(u32::MAX)) as u32;
        Ok(server)
    }

    /// The target URL of this replica.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// `host:port` used for connectivity probes and request forwarding.
    pub fn authority(&self) -> &str {
        &self.authority
    }

    /// Set liveness and return the value it replaced.
    pub fn set_liveness(&self, alive: bool) -> bool {
        self.alive.swap(alive, Ordering::AcqRel)
    }

    /// Whether the last probe found this replica reachable.
    pub fn is_alive(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Metadata value for `key`, or `default` when the key is absent.
    pub fn metadata_or_default<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.metadata.get(key).map(String::as_str).unwrap_or(default)
    }

    /// Integer metadata value for `key`, or `default` when absent or unparsable.
    pub fn metadata_int_or_default(&self, key: &str, default: i64) -> i64 {
        self.metadata
            .get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Relative capacity used by weighted round-robin. Always >= 1.
    pub fn weight(&self) -> u32 {
        self.weight
    }
}
