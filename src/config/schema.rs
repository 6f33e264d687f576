//! Configuration schema definitions.
//!
//! These are the raw, serde-facing settings as they appear in a config file or
//! the environment. They are resolved into the typed [`MirrorConfig`] by
//! `validation.rs` before any traffic is served.
//!
//! [`MirrorConfig`]: crate::config::MirrorConfig

use serde::{Deserialize, Serialize};

/// Root settings for the mirroring proxy.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct Settings {
    /// Listener configuration for the reference proxy host.
    pub listener: ListenerSettings,

    /// Mirror decision and delivery settings.
    pub mirror: MirrorSettings,

    /// Observability settings.
    pub observability: ObservabilitySettings,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ListenerSettings {
    /// Interface to bind on.
    pub host: String,

    /// Port to listen on.
    pub port: u16,

    /// Largest request body the proxy host will buffer.
    pub max_body_bytes: usize,

    /// Upstream forwarding timeout in seconds.
    pub upstream_timeout_secs: u64,
}

impl ListenerSettings {
    /// `host:port` string suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            max_body_bytes: 10 * 1024 * 1024, // 10MB
            upstream_timeout_secs: 60,
        }
    }
}

/// Mirror settings, unresolved.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct MirrorSettings {
    /// Sink base URL. Empty disables mirroring.
    pub base: String,

    /// Path appended to `base`.
    pub path: String,

    /// Plain substring, or `regex:<pattern>`. Empty matches every URL.
    #[serde(rename = "match")]
    pub match_rule: String,

    /// Comma-separated methods to mirror.
    pub methods: String,

    /// Only mirror requests whose Content-Type mentions `json`.
    pub json_only: bool,

    /// Tag the original request and the mirror with a correlation header.
    pub add_header: bool,

    /// Correlation header name.
    pub header_name: String,

    /// Delivery timeout in seconds.
    pub timeout_secs: f64,

    /// Deliver on a background task instead of blocking the hook.
    #[serde(rename = "async")]
    pub async_delivery: bool,

    /// Cap on concurrently running background deliveries.
    pub max_in_flight: usize,
}

impl Default for MirrorSettings {
    fn default() -> Self {
        Self {
            base: String::new(),
            path: "/".to_string(),
            match_rule: String::new(),
            methods: "POST,PUT,PATCH".to_string(),
            json_only: true,
            add_header: true,
            header_name: "X-Mirror-Correlation-Id".to_string(),
            timeout_secs: 5.0,
            async_delivery: true,
            max_in_flight: 1024,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilitySettings {
    /// Default log filter when `RUST_LOG` is unset.
    pub log_level: String,

    /// Enable the Prometheus metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilitySettings {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
