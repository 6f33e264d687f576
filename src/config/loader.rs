//! Configuration loading from disk and the process environment.

use std::fs;
use std::path::Path;

use crate::config::schema::Settings;
use crate::error::ConfigError;

/// Load settings from an optional TOML file, then apply environment overrides.
pub fn load_settings(path: Option<&Path>) -> Result<Settings, ConfigError> {
    let settings = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            let settings: Settings = toml::from_str(&content)?;
            tracing::debug!(path = %path.display(), "Config file loaded");
            settings
        }
        None => Settings::default(),
    };

    apply_env(settings, |key| std::env::var(key).ok())
}

/// Apply environment overrides using the given lookup.
///
/// Variables that are unset leave the current value in place. A set but empty
/// variable is taken literally (e.g. `MIRROR_MATCH=` means match-all).
pub fn apply_env<F>(mut settings: Settings, lookup: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("LISTEN_PORT") {
        settings.listener.port = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: "LISTEN_PORT",
            value: v.clone(),
            expected: "a port number",
        })?;
    }

    let mirror = &mut settings.mirror;
    if let Some(v) = lookup("MIRROR_BASE") {
        mirror.base = v.trim().to_string();
    }
    if let Some(v) = lookup("MIRROR_PATH") {
        mirror.path = v;
    }
    if let Some(v) = lookup("MIRROR_MATCH") {
        mirror.match_rule = v;
    }
    if let Some(v) = lookup("MIRROR_METHODS") {
        mirror.methods = v;
    }
    if let Some(v) = lookup("MIRROR_JSON_ONLY") {
        mirror.json_only = parse_bool("MIRROR_JSON_ONLY", &v)?;
    }
    if let Some(v) = lookup("MIRROR_ADD_HEADER") {
        mirror.add_header = parse_bool("MIRROR_ADD_HEADER", &v)?;
    }
    if let Some(v) = lookup("MIRROR_HEADER_NAME") {
        mirror.header_name = v.trim().to_string();
    }
    if let Some(v) = lookup("MIRROR_TIMEOUT_SECS") {
        mirror.timeout_secs = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: "MIRROR_TIMEOUT_SECS",
            value: v.clone(),
            expected: "a number of seconds",
        })?;
    }
    if let Some(v) = lookup("MIRROR_ASYNC") {
        mirror.async_delivery = parse_bool("MIRROR_ASYNC", &v)?;
    }
    if let Some(v) = lookup("MIRROR_MAX_IN_FLIGHT") {
        mirror.max_in_flight = v.trim().parse().map_err(|_| ConfigError::InvalidEnv {
            key: "MIRROR_MAX_IN_FLIGHT",
            value: v.clone(),
            expected: "a positive integer",
        })?;
    }

    Ok(settings)
}

fn parse_bool(key: &'static str, value: &str) -> Result<bool, ConfigError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnv {
            key,
            value: value.to_string(),
            expected: "a boolean (true/false, 1/0, yes/no, on/off)",
        }),
    }
}
