//! Mirror envelope construction.
//!
//! # Responsibilities
//! - Copy the original body byte-for-byte (never parsed or re-encoded)
//! - Copy the original header fields, plus the correlation header if enabled
//! - Address the envelope to the configured sink with method POST
//!
//! Pure; no I/O.

use axum::http::{header, HeaderMap, Method};
use bytes::Bytes;
use url::Url;

use crate::config::MirrorConfig;
use crate::mirror::correlation::CorrelationId;
use crate::mirror::descriptor::{is_hop_by_hop, RequestDescriptor};

/// The outbound duplicate of an intercepted request.
#[derive(Debug, Clone)]
pub struct MirrorEnvelope {
    pub method: Method,
    pub target: Url,
    pub headers: HeaderMap,
    pub body: Bytes,
    pub correlation_id: Option<CorrelationId>,
}

impl MirrorEnvelope {
    /// Headers to put on the wire.
    ///
    /// Hop-by-hop fields, `Host` and `Content-Length` belong to the original
    /// connection; the HTTP client derives them for the sink.
    pub fn wire_headers(&self) -> HeaderMap {
        let mut out = HeaderMap::with_capacity(self.headers.len());
        for (name, value) in self.headers.iter() {
            if is_hop_by_hop(name) || *name == header::HOST || *name == header::CONTENT_LENGTH {
                continue;
            }
            out.append(name.clone(), value.clone());
        }
        out
    }
}

/// Build the mirror envelope for `request`.
///
/// When the config enables header injection and `correlation_id` is given,
/// the envelope carries `config.correlation_header: correlation_id` exactly once.
pub fn build_envelope(
    request: &RequestDescriptor,
    config: &MirrorConfig,
    correlation_id: Option<CorrelationId>,
) -> MirrorEnvelope {
    let mut headers = request.headers().clone();
    let correlation_id = match (&config.correlation_header, correlation_id) {
        (Some(name), Some(id)) => {
            headers.insert(name.clone(), id.to_header_value());
            Some(id)
        }
        _ => None,
    };

    MirrorEnvelope {
        method: Method::POST,
        target: config.target_url.clone(),
        headers,
        body: request.body().clone(),
        correlation_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MirrorSettings;
    use axum::http::{HeaderName, HeaderValue};

    fn config(add_header: bool) -> MirrorConfig {
        MirrorConfig::from_settings(&MirrorSettings {
            base: "http://sink:9000/".to_string(),
            path: "/ingest".to_string(),
            add_header,
            ..MirrorSettings::default()
        })
        .unwrap()
        .unwrap()
    }

    fn request(method: Method, body: Bytes) -> RequestDescriptor {
        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/x-ndjson"));
        headers.insert(header::HOST, HeaderValue::from_static("api.example.com"));
        headers.append("x-trace", HeaderValue::from_static("1"));
        headers.append("x-trace", HeaderValue::from_static("2"));
        RequestDescriptor::new(method, "http://api.example.com/orders?a=1", headers, body)
    }

    #[test]
    fn test_target_and_method() {
        let env = build_envelope(&request(Method::PUT, Bytes::new()), &config(false), None);
        assert_eq!(env.method, Method::POST);
        assert_eq!(env.target.as_str(), "http://sink:9000/ingest");
    }

    #[test]
    fn test_body_is_byte_identical() {
        let payloads: [&[u8]; 3] = [b"", b"{\"a\":1}", &[0x00, 0xff, 0xfe, 0x80, 0x0a, 0x00]];
        for payload in payloads {
            let body = Bytes::copy_from_slice(payload);
            let env = build_envelope(&request(Method::POST, body.clone()), &config(false), None);
            assert_eq!(env.body, body);
        }
    }

    #[test]
    fn test_headers_copied() {
        let env = build_envelope(&request(Method::POST, Bytes::new()), &config(false), None);
        assert_eq!(env.headers[header::CONTENT_TYPE], "application/x-ndjson");
        assert_eq!(env.headers.get_all("x-trace").iter().count(), 2);
        assert!(env.correlation_id.is_none());
        assert!(!env.headers.contains_key("x-mirror-correlation-id"));
    }

    #[test]
    fn test_correlation_header_added_once() {
        let cfg = config(true);
        let mut req = request(Method::POST, Bytes::new());
        req.set_header(
            HeaderName::from_static("x-mirror-correlation-id"),
            HeaderValue::from_static("stale"),
        );
        let id = CorrelationId::generate();

        let env = build_envelope(&req, &cfg, Some(id));

        let values: Vec<_> = env.headers.get_all("x-mirror-correlation-id").iter().collect();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].to_str().unwrap(), id.to_string());
        assert_eq!(env.correlation_id, Some(id));
    }

    #[test]
    fn test_correlation_ignored_when_disabled() {
        let env = build_envelope(
            &request(Method::POST, Bytes::new()),
            &config(false),
            Some(CorrelationId::generate()),
        );
        assert!(env.correlation_id.is_none());
    }

    #[test]
    fn test_wire_headers_strip_connection_scoped() {
        let mut req = request(Method::POST, Bytes::from_static(b"xyz"));
        req.set_header(header::CONTENT_LENGTH, HeaderValue::from_static("3"));
        req.set_header(header::CONNECTION, HeaderValue::from_static("keep-alive"));
        req.set_header(
            HeaderName::from_static("proxy-connection"),
            HeaderValue::from_static("keep-alive"),
        );

        let wire = build_envelope(&req, &config(false), None).wire_headers();

        assert!(!wire.contains_key(header::HOST));
        assert!(!wire.contains_key(header::CONTENT_LENGTH));
        assert!(!wire.contains_key(header::CONNECTION));
        assert!(!wire.contains_key("proxy-connection"));
        assert_eq!(wire[header::CONTENT_TYPE], "application/x-ndjson");
        assert_eq!(wire.get_all("x-trace").iter().count(), 2);
    }
}
