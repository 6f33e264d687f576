//! Read-only view of an intercepted request.
//!
//! # Responsibilities
//! - Carry method, absolute URL, headers and raw body bytes
//! - Reconstruct the absolute URL from absolute-form or origin-form requests
//! - Allow exactly one kind of mutation: setting the correlation header

use axum::http::{header, request::Parts, HeaderMap, HeaderName, HeaderValue, Method};
use bytes::Bytes;

/// Connection-scoped headers that must not be forwarded by an intermediary.
pub const HOP_BY_HOP: [HeaderName; 8] = [
    header::CONNECTION,
    HeaderName::from_static("keep-alive"),
    HeaderName::from_static("proxy-connection"),
    header::PROXY_AUTHENTICATE,
    header::PROXY_AUTHORIZATION,
    header::TE,
    header::TRANSFER_ENCODING,
    header::UPGRADE,
];

/// Returns true for hop-by-hop header names (including `Trailer`).
pub fn is_hop_by_hop(name: &HeaderName) -> bool {
    *name == header::TRAILER || HOP_BY_HOP.contains(name)
}

/// An intercepted request as seen by the mirror hook.
///
/// The body is held as [`Bytes`], so copying it into a mirror envelope shares
/// the buffer instead of consuming it; the proxy engine can still forward it.
#[derive(Debug, Clone)]
pub struct RequestDescriptor {
    method: Method,
    url: String,
    headers: HeaderMap,
    body: Bytes,
}

impl RequestDescriptor {
    /// Create a descriptor from its parts.
    pub fn new(method: Method, url: impl Into<String>, headers: HeaderMap, body: Bytes) -> Self {
        Self {
            method,
            url: url.into(),
            headers,
            body,
        }
    }

    /// Build a descriptor from HTTP request parts.
    ///
    /// Absolute-form URIs (`GET http://host/path`) are used as-is. For
    /// origin-form URIs the authority is taken from the `Host` header and
    /// `default_scheme` is assumed. Returns `None` when no authority can be
    /// determined.
    pub fn from_parts(parts: &Parts, body: Bytes, default_scheme: &str) -> Option<Self> {
        let url = if parts.uri.scheme().is_some() && parts.uri.authority().is_some() {
            parts.uri.to_string()
        } else {
            let host = parts
                .headers
                .get(header::HOST)
                .and_then(|h| h.to_str().ok())
                .filter(|h| !h.is_empty())?;
            let path_and_query = parts
                .uri
                .path_and_query()
                .map(|pq| pq.as_str())
                .unwrap_or("/");
            format!("{}://{}{}", default_scheme, host, path_and_query)
        };

        Some(Self::new(parts.method.clone(), url, parts.headers.clone(), body))
    }

    /// Request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Absolute URL (scheme, host, port, path, query) exactly as intercepted.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Raw body bytes.
    pub fn body(&self) -> &Bytes {
        &self.body
    }

    /// Set `name` to `value`, replacing any existing instances so the request
    /// carries it exactly once.
    pub fn set_header(&mut self, name: HeaderName, value: HeaderValue) {
        self.headers.insert(name, value);
    }

    /// Decompose into `(method, url, headers, body)` for forwarding.
    pub fn into_parts(self) -> (Method, String, HeaderMap, Bytes) {
        (self.method, self.url, self.headers, self.body)
    }
}
