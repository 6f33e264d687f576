//! Mirroring subsystem.
//!
//! # Data Flow
//! ```text
//! proxy engine
//!     → hook.rs (per-request entry point)
//!     → matcher.rs (method / URL / content-type filters)
//!     → envelope.rs (duplicate body + headers, address the sink)
//!     → dispatcher.rs (POST with timeout, sync or on a Tokio task)
//!     → mirror sink
//! ```
//!
//! # Design Decisions
//! - Matcher and envelope builder are pure; the only shared state is the
//!   read-only `MirrorConfig`
//! - Mirror failures never reach the proxy engine
//! - The original request gains at most one header and is otherwise untouched

pub mod correlation;
pub mod descriptor;
pub mod dispatcher;
pub mod envelope;
pub mod hook;
pub mod matcher;

pub use correlation::CorrelationId;
pub use descriptor::RequestDescriptor;
pub use dispatcher::{DispatchOutcome, Dispatcher, HttpTransport, MirrorTransport};
pub use envelope::{build_envelope, MirrorEnvelope};
pub use hook::{HookOutcome, MirrorHook, RequestHook};
pub use matcher::{should_mirror, Decision, MatchRule};
