//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! hook / dispatcher / proxy host produce:
//!     → logging.rs (structured log events via tracing)
//!     → metrics.rs (decision and delivery counters, latency histogram)
//!
//! Consumers:
//!     → stdout
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Mirror failures are only ever visible here
//! - Correlation ids are attached to delivery log events
//! - Metrics are cheap (facade is a no-op without a recorder)

pub mod logging;
pub mod metrics;
