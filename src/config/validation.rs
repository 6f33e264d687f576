//! Configuration validation.
//!
//! Turns raw [`MirrorSettings`] into the immutable, fully-typed
//! [`MirrorConfig`]. Every invalid combination is rejected here, before any
//! traffic is served; nothing downstream re-checks configuration per request.

use std::time::Duration;

use axum::http::{HeaderName, Method};
use url::Url;

use crate::config::schema::MirrorSettings;
use crate::error::ConfigError;
use crate::mirror::matcher::MatchRule;

/// Resolved mirror configuration. Read-only after startup.
#[derive(Debug, Clone)]
pub struct MirrorConfig {
    /// Sink base URL as configured.
    pub base_url: Url,
    /// Sub-path at the sink.
    pub path: String,
    /// `base_url` and `path` joined with exactly one slash.
    pub target_url: Url,
    /// URL filter.
    pub match_rule: MatchRule,
    /// Upper-cased, de-duplicated methods eligible for mirroring.
    pub methods: Vec<Method>,
    /// Require a JSON Content-Type.
    pub json_only: bool,
    /// Correlation header to inject, when injection is enabled.
    pub correlation_header: Option<HeaderName>,
    /// Per-attempt delivery timeout.
    pub timeout: Duration,
    /// Deliver on a background task.
    pub async_delivery: bool,
    /// Cap on concurrently running background deliveries.
    pub max_in_flight: usize,
}

impl MirrorConfig {
    /// Validate settings. Returns `Ok(None)` when mirroring is disabled
    /// (empty base URL).
    pub fn from_settings(settings: &MirrorSettings) -> Result<Option<Self>, ConfigError> {
        let base = settings.base.trim();
        if base.is_empty() {
            return Ok(None);
        }

        let base_url = parse_base_url(base)?;
        let path = if settings.path.is_empty() {
            "/".to_string()
        } else {
            settings.path.clone()
        };
        let target_url = join_target(base, &path)?;

        let match_rule = MatchRule::parse(&settings.match_rule)?;
        let methods = parse_methods(&settings.methods)?;
        if methods.is_empty() && !settings.match_rule.is_empty() {
            return Err(ConfigError::EmptyMethods(settings.match_rule.clone()));
        }

        let correlation_header = if settings.add_header {
            let name = HeaderName::from_bytes(settings.header_name.trim().as_bytes())
                .map_err(|_| ConfigError::InvalidHeaderName(settings.header_name.clone()))?;
            Some(name)
        } else {
            None
        };

        if !settings.timeout_secs.is_finite() || settings.timeout_secs <= 0.0 {
            return Err(ConfigError::InvalidTimeout(settings.timeout_secs));
        }
        let timeout = Duration::try_from_secs_f64(settings.timeout_secs)
            .map_err(|_| ConfigError::InvalidTimeout(settings.timeout_secs))?;

        if settings.max_in_flight == 0 {
            return Err(ConfigError::InvalidMaxInFlight);
        }

        Ok(Some(Self {
            base_url,
            path,
            target_url,
            match_rule,
            methods,
            json_only: settings.json_only,
            correlation_header,
            timeout,
            async_delivery: settings.async_delivery,
            max_in_flight: settings.max_in_flight,
        }))
    }

    /// Log the resolved configuration once at startup.
    pub fn log_summary(&self) {
        let methods: Vec<&str> = self.methods.iter().map(Method::as_str).collect();
        tracing::info!(
            target_url = %self.target_url,
            match_rule = %self.match_rule,
            methods = ?methods,
            json_only = self.json_only,
            correlation_header = ?self.correlation_header,
            timeout = ?self.timeout,
            async_delivery = self.async_delivery,
            max_in_flight = self.max_in_flight,
            "Mirroring enabled"
        );
        if matches!(self.match_rule, MatchRule::MatchAll) {
            tracing::warn!("No mirror match rule configured; every URL is eligible (method and content-type filters still apply)");
        }
        if self.methods.is_empty() {
            tracing::warn!("Mirror method list is empty; no request will be mirrored");
        }
    }
}

fn parse_base_url(base: &str) -> Result<Url, ConfigError> {
    let url = Url::parse(base).map_err(|e| ConfigError::InvalidBaseUrl {
        url: base.to_string(),
        reason: e.to_string(),
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidBaseUrl {
            url: base.to_string(),
            reason: format!("unsupported scheme {:?}", url.scheme()),
        });
    }
    if url.host_str().is_none() {
        return Err(ConfigError::InvalidBaseUrl {
            url: base.to_string(),
            reason: "missing host".to_string(),
        });
    }
    Ok(url)
}

/// Join base and path with exactly one separating slash.
fn join_target(base: &str, path: &str) -> Result<Url, ConfigError> {
    let joined = format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    );
    Url::parse(&joined).map_err(|e| ConfigError::InvalidBaseUrl {
        url: joined,
        reason: e.to_string(),
    })
}

fn parse_methods(list: &str) -> Result<Vec<Method>, ConfigError> {
    let mut methods: Vec<Method> = Vec::new();
    for token in list.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let upper = token.to_ascii_uppercase();
        let method = Method::from_bytes(upper.as_bytes())
            .map_err(|_| ConfigError::InvalidMethod(token.to_string()))?;
        if !methods.contains(&method) {
            methods.push(method);
        }
    }
    Ok(methods)
}
