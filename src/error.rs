//! Error types for configuration and mirror delivery.

use std::time::Duration;
use thiserror::Error;

/// Startup-time configuration errors. Always fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration file is not valid TOML for the schema.
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),

    /// An environment variable held a value of the wrong shape.
    #[error("Invalid value {value:?} for {key}: expected {expected}")]
    InvalidEnv {
        key: &'static str,
        value: String,
        expected: &'static str,
    },

    /// Mirror base URL is not an absolute http(s) URL.
    #[error("Invalid mirror base URL {url:?}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },

    /// `regex:` match rule does not compile.
    #[error("Invalid regex in mirror match rule: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// A method token in the method list is not a valid HTTP method.
    #[error("Invalid HTTP method in mirror method list: {0:?}")]
    InvalidMethod(String),

    /// A match rule was configured but no method can ever be mirrored.
    #[error("Mirror match rule {0:?} is set but the method list is empty")]
    EmptyMethods(String),

    /// Correlation header name is not a valid HTTP header name.
    #[error("Invalid correlation header name: {0:?}")]
    InvalidHeaderName(String),

    /// Timeout must be a positive, finite number of seconds.
    #[error("Invalid mirror timeout: {0} seconds")]
    InvalidTimeout(f64),

    /// Async admission cap must be at least one.
    #[error("mirror max_in_flight must be greater than zero")]
    InvalidMaxInFlight,

    /// The outbound HTTP client could not be initialized.
    #[error("Failed to build mirror HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

/// A failed mirror delivery attempt.
///
/// Never surfaced to the proxy engine; only logged and counted.
#[derive(Debug, Error)]
pub enum MirrorDeliveryError {
    /// The sink did not answer within the configured timeout.
    #[error("Mirror delivery timed out after {0:?}")]
    Timeout(Duration),

    /// Connection or protocol failure talking to the sink.
    #[error("Mirror transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// The sink answered with a non-2xx status.
    #[error("Mirror sink returned status {0}")]
    Status(reqwest::StatusCode),

    /// The envelope could not be turned into an HTTP request.
    #[error("Mirror request could not be built: {0}")]
    Request(String),

    /// Delivery panicked; the panic was caught at the dispatcher boundary.
    #[error("Mirror delivery panicked: {0}")]
    Panicked(String),
}

impl MirrorDeliveryError {
    /// Short label used for metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            MirrorDeliveryError::Timeout(_) => "timeout",
            MirrorDeliveryError::Transport(_) => "transport",
            MirrorDeliveryError::Status(_) => "status",
            MirrorDeliveryError::Request(_) => "request",
            MirrorDeliveryError::Panicked(_) => "panic",
        }
    }
}
