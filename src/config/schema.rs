//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the daemon.
//! All types derive Serde traits for deserialization from config files.
//!
//! A minimal config file:
//!
//! ```toml
//! [knock]
//! sequence = [45010, 45030, 45020]
//! port_range = { start = 45000, end = 45099 }
//! grant_secs = 3600
//!
//! [service]
//! port = 8080
//! ```

use serde::{Deserialize, Serialize};

/// Root configuration for the port-knocking daemon.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct PortcullisConfig {
    /// Knock sequence, monitored port range, grant duration.
    pub knock: KnockConfig,

    /// Protected service settings.
    pub service: ServiceConfig,

    /// Listener configuration (bind host, connection cap).
    pub listener: ListenerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Knock protocol configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KnockConfig {
    /// Ordered list of distinct ports a client must hit in sequence.
    /// Every port must lie inside `port_range`.
    pub sequence: Vec<u16>,

    /// Inclusive range of ports to monitor for knocks.
    pub port_range: PortRange,

    /// How long a completed sequence grants access, in seconds.
    pub grant_secs: u64,
}

impl Default for KnockConfig {
    fn default() -> Self {
        Self {
            sequence: vec![45010, 45030, 45020],
            port_range: PortRange { start: 45000, end: 45099 },
            grant_secs: 3600,
        }
    }
}

/// An inclusive range of TCP ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
pub struct PortRange {
    pub start: u16,
    pub end: u16,
}

impl PortRange {
    /// Whether `port` falls inside the range.
    pub fn contains(&self, port: u16) -> bool {
        port >= self.start && port <= self.end
    }

    /// Number of ports in the range (0 when start > end).
    pub fn len(&self) -> usize {
        if self.start > self.end {
            0
        } else {
            usize::from(self.end - self.start) + 1
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterate the ports in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = u16> {
        self.start..=self.end
    }
}

/// Protected service configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Port the protected service listens on. Must be outside the knock
    /// port range.
    pub port: u16,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self { port: 8080 }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host to bind every listener on (e.g. "0.0.0.0").
    pub bind_host: String,

    /// Maximum concurrent protected-service connections (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_host: "0.0.0.0".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
