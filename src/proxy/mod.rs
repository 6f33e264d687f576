//! Reference proxy host.
//!
//! A minimal plain-HTTP forward proxy that owns one [`RequestHook`] and calls
//! it for every request before forwarding. It exists so the mirror pipeline
//! can run standalone and be exercised end to end; production deployments
//! embed the hook in their own intercepting proxy.
//!
//! [`RequestHook`]: crate::mirror::RequestHook

pub mod server;

pub use server::ProxyServer;
