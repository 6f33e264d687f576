//! Correlation identifiers linking an original request to its mirror.

use std::fmt;

use axum::http::HeaderValue;
use uuid::Uuid;

/// Opaque per-request token (UUID v4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CorrelationId(Uuid);

impl CorrelationId {
    /// Generate a new random id.
    pub fn generate() -> Self {
        Self(Uuid::new_v4())
    }

    /// The underlying UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }

    /// Header value form (lower-case hyphenated UUID).
    pub fn to_header_value(&self) -> HeaderValue {
        let mut buf = Uuid::encode_buffer();
        let encoded = self.0.hyphenated().encode_lower(&mut buf);
        HeaderValue::from_str(encoded).expect("hyphenated UUID is a valid header value")
    }
}

impl fmt::Display for CorrelationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}
