//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! optional config file (TOML)
//!     → loader.rs (parse & deserialize)
//!     → environment overrides (LISTEN_PORT, MIRROR_*)
//!     → validation.rs (semantic checks)
//!     → MirrorConfig (validated, immutable)
//!     → shared via Arc with the hook and dispatcher
//! ```
//!
//! # Design Decisions
//! - Resolved once at startup; there is no reload
//! - All fields have defaults to allow an empty environment
//! - Validation separates syntactic (serde/env parsing) from semantic checks

pub mod loader;
pub mod schema;
pub mod validation;

pub use schema::{ListenerSettings, MirrorSettings, ObservabilitySettings, Settings};
pub use validation::MirrorConfig;
