//! Mirror eligibility matching.
//!
//! # Responsibilities
//! - Match request method against the configured set (case-insensitive)
//! - Match the absolute URL against the [`MatchRule`]
//! - Optionally require a JSON Content-Type
//! - Combine conditions with AND semantics
//!
//! # Design Decisions
//! - The rule is resolved once at startup; no type inspection per request
//! - Substring matching is literal against the exact URL string
//! - Pattern matching uses search semantics, not full match
//! - Pure functions of (request, config): safe to call concurrently

use std::fmt;

use axum::http::{header, HeaderMap};
use regex::Regex;
use url::Url;

use crate::config::MirrorConfig;
use crate::error::ConfigError;
use crate::mirror::descriptor::RequestDescriptor;

const REGEX_PREFIX: &str = "regex:";

/// URL filter.
#[derive(Debug, Clone)]
pub enum MatchRule {
    /// No rule configured: every URL matches.
    MatchAll,
    /// URL contains the literal text.
    Substring(String),
    /// Pattern finds a match anywhere in the URL.
    Pattern(Regex),
}

impl MatchRule {
    /// Parse a configured rule: empty → `MatchAll`, `regex:<p>` → `Pattern`,
    /// anything else → `Substring`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        if raw.is_empty() {
            Ok(MatchRule::MatchAll)
        } else if let Some(pattern) = raw.strip_prefix(REGEX_PREFIX) {
            Ok(MatchRule::Pattern(Regex::new(pattern)?))
        } else {
            Ok(MatchRule::Substring(raw.to_string()))
        }
    }

    /// Returns true if `url` satisfies the rule.
    pub fn matches(&self, url: &str) -> bool {
        match self {
            MatchRule::MatchAll => true,
            MatchRule::Substring(text) => url.contains(text.as_str()),
            MatchRule::Pattern(re) => re.is_match(url),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MatchRule::MatchAll => write!(f, "*"),
            MatchRule::Substring(text) => write!(f, "substring:{}", text),
            MatchRule::Pattern(re) => write!(f, "{}{}", REGEX_PREFIX, re.as_str()),
        }
    }
}

/// Outcome of evaluating a request against the mirror filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Mirror,
    MethodNotAllowed,
    NotJson,
    UrlMismatch,
    UnparsableUrl,
}

impl Decision {
    pub fn is_mirror(self) -> bool {
        self == Decision::Mirror
    }

    /// Short label used for logs and metrics.
    pub fn as_str(self) -> &'static str {
        match self {
            Decision::Mirror => "mirror",
            Decision::MethodNotAllowed => "method",
            Decision::NotJson => "content_type",
            Decision::UrlMismatch => "url",
            Decision::UnparsableUrl => "unparsable_url",
        }
    }
}

/// Evaluate every filter and report the first one that rejects.
pub fn evaluate(request: &RequestDescriptor, config: &MirrorConfig) -> Decision {
    let method = request.method().as_str();
    if !config
        .methods
        .iter()
        .any(|m| m.as_str().eq_ignore_ascii_case(method))
    {
        return Decision::MethodNotAllowed;
    }

    if config.json_only && !is_json(request.headers()) {
        return Decision::NotJson;
    }

    if Url::parse(request.url()).is_err() {
        return Decision::UnparsableUrl;
    }
    if !config.match_rule.matches(request.url()) {
        return Decision::UrlMismatch;
    }

    Decision::Mirror
}

/// Returns true if the request should be mirrored.
pub fn should_mirror(request: &RequestDescriptor, config: &MirrorConfig) -> bool {
    evaluate(request, config).is_mirror()
}

/// True if any Content-Type value mentions `json` (case-insensitive).
fn is_json(headers: &HeaderMap) -> bool {
    headers
        .get_all(header::CONTENT_TYPE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.to_ascii_lowercase().contains("json"))
}
