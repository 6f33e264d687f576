//! Request mirroring for intercepting HTTP proxies.
//!
//! For each intercepted request the [`MirrorHook`] decides, from method, URL
//! and content type, whether to POST an exact copy of the body to a separate
//! sink, optionally tagging the original with a correlation header. Mirror
//! delivery never fails or alters the primary request.

pub mod config;
pub mod error;
pub mod lifecycle;
pub mod mirror;
pub mod observability;
pub mod proxy;

pub use config::{MirrorConfig, Settings};
pub use error::{ConfigError, MirrorDeliveryError};
pub use lifecycle::Shutdown;
pub use mirror::{MirrorHook, RequestDescriptor, RequestHook};
pub use proxy::ProxyServer;
