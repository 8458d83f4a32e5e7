//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Identity advertised in the `X-Gateway` header.
    pub gateway: IdentityConfig,

    /// Queue and worker pool sizing.
    pub dispatch: DispatchConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Admission throttles.
    pub rate_limit: RateLimitConfig,

    /// Inbound endpoints, one per topic.
    pub routes: Vec<RouteConfig>,

    /// Routing table: topic → backend base address.
    pub backends: BTreeMap<String, String>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// The four demo endpoints served by the `internal-service` binary.
    pub fn demo() -> Self {
        let routes = vec![
            RouteConfig::new("auth/login", "/auth/login").public(),
            RouteConfig::new("auth/register", "/auth/register").public(),
            RouteConfig::new("profile/get", "/profile/get"),
            RouteConfig::new("profile/update", "/profile/update"),
        ];

        let backends = [
            ("auth/login", "http://127.0.0.1:9090"),
            ("auth/register", "http://127.0.0.1:9090"),
            ("profile/get", "http://127.0.0.1:9091"),
            ("profile/update", "http://127.0.0.1:9092"),
        ]
        .into_iter()
        .map(|(topic, addr)| (topic.to_string(), addr.to_string()))
        .collect();

        Self {
            routes,
            backends,
            ..Self::default()
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct IdentityConfig {
    /// Value of the `X-Gateway` response header.
    pub name: String,
}

impl Default for IdentityConfig {
    fn default() -> Self {
        Self {
            name: "api-gateway".to_string(),
        }
    }
}

/// Dispatch queue and worker pool.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// Number of worker tasks.
    pub workers: usize,

    /// Maximum jobs waiting for a worker.
    pub queue_capacity: usize,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 1024,
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Deadline for one outbound call, in milliseconds.
    pub forward_ms: u64,

    /// How long a caller waits for enqueue + reply before getting 408.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            forward_ms: 3_000,
            request_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 2 * 1024 * 1024, // 2MB
        }
    }
}

/// Admission throttles, one per key kind.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Keyed by caller IP.
    pub ip: ThrottleConfig,

    /// Keyed by topic.
    pub topic: ThrottleConfig,
}

/// Token bucket settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ThrottleConfig {
    /// Disabled throttles admit everything.
    pub enabled: bool,

    /// Refill rate.
    pub requests_per_second: u32,

    /// Bucket capacity.
    pub burst_size: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            requests_per_second: 100,
            burst_size: 50,
        }
    }
}

/// One inbound endpoint.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RouteConfig {
    /// Logical endpoint name used for routing and throttling.
    pub topic: String,

    /// HTTP method; any method when absent.
    #[serde(default)]
    pub method: Option<String>,

    /// Path template, e.g. `/users/{id}`.
    pub path: String,

    /// Whether the identity check runs for this topic.
    #[serde(default = "default_requires_auth")]
    pub requires_auth: bool,
}

fn default_requires_auth() -> bool {
    true
}

impl RouteConfig {
    pub fn new(topic: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            method: None,
            path: path.into(),
            requires_auth: default_requires_auth(),
        }
    }

    /// Restrict to a single method.
    pub fn method(mut self, method: impl Into<String>) -> Self {
        self.method = Some(method.into());
        self
    }

    /// Skip the identity check.
    pub fn public(mut self) -> Self {
        self.requires_auth = false;
        self
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit JSON log lines instead of human-readable ones.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9100".to_string(),
        }
    }
}
