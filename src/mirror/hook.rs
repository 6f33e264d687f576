//! Interception hook adapter.
//!
//! The proxy engine holds one hook (as `Arc<dyn RequestHook>`) and calls it
//! once per intercepted request, before forwarding to the real destination.
//!
//! ```text
//! RequestDescriptor
//!     → matcher::evaluate (allow/deny)
//!     → [allow] CorrelationId + header on the original request
//!     → envelope::build_envelope
//!     → Dispatcher::dispatch (sync or async)
//!     → return to the engine, unconditionally
//! ```

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures_util::future::BoxFuture;

use crate::config::{MirrorConfig, MirrorSettings};
use crate::error::ConfigError;
use crate::mirror::correlation::CorrelationId;
use crate::mirror::descriptor::RequestDescriptor;
use crate::mirror::dispatcher::{DispatchOutcome, Dispatcher};
use crate::mirror::envelope::build_envelope;
use crate::mirror::matcher::{self, Decision};
use crate::observability::metrics;

/// Request-lifecycle hook invoked by the proxy engine.
pub trait RequestHook: Send + Sync {
    /// Inspect (and possibly tag) the request. Must never fail.
    fn on_request<'a>(&'a self, request: &'a mut RequestDescriptor) -> BoxFuture<'a, ()>;
}

/// What the hook did with one request.
#[derive(Debug)]
pub enum HookOutcome {
    /// Mirroring is disabled.
    Disabled,
    /// Filters rejected the request.
    Skipped(Decision),
    /// A mirror was handed to the dispatcher.
    Mirrored {
        correlation_id: Option<CorrelationId>,
        dispatch: DispatchOutcome,
    },
}

#[derive(Debug)]
struct ActiveMirror {
    config: Arc<MirrorConfig>,
    dispatcher: Dispatcher,
}

/// The mirror hook.
#[derive(Debug)]
pub struct MirrorHook {
    active: Option<ActiveMirror>,
}

impl MirrorHook {
    /// A hook that never mirrors.
    pub fn disabled() -> Self {
        Self { active: None }
    }

    /// A hook delivering through the HTTP dispatcher.
    pub fn new(config: Arc<MirrorConfig>) -> Result<Self, ConfigError> {
        let dispatcher = Dispatcher::new(&config)?;
        Ok(Self::with_dispatcher(config, dispatcher))
    }

    /// A hook delivering through the given dispatcher.
    pub fn with_dispatcher(config: Arc<MirrorConfig>, dispatcher: Dispatcher) -> Self {
        Self {
            active: Some(ActiveMirror { config, dispatcher }),
        }
    }

    /// Resolve settings into a hook; an empty base URL yields a disabled hook.
    pub fn from_settings(settings: &MirrorSettings) -> Result<Self, ConfigError> {
        match MirrorConfig::from_settings(settings)? {
            Some(config) => {
                config.log_summary();
                Self::new(Arc::new(config))
            }
            None => {
                tracing::info!("Mirror base URL not set; mirroring disabled");
                Ok(Self::disabled())
            }
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.active.is_some()
    }

    /// The dispatcher, if mirroring is enabled.
    pub fn dispatcher(&self) -> Option<&Dispatcher> {
        self.active.as_ref().map(|a| &a.dispatcher)
    }

    /// Run the mirror pipeline for one request.
    ///
    /// The only change ever made to `request` is setting the correlation
    /// header; method, URL and body are left untouched.
    pub async fn handle(&self, request: &mut RequestDescriptor) -> HookOutcome {
        let Some(active) = &self.active else {
            return HookOutcome::Disabled;
        };
        let config = &active.config;

        let decision = matcher::evaluate(request, config);
        metrics::record_decision(decision.as_str());
        if !decision.is_mirror() {
            tracing::trace!(
                method = %request.method(),
                url = %request.url(),
                reason = decision.as_str(),
                "Request not mirrored"
            );
            return HookOutcome::Skipped(decision);
        }

        let correlation_id = config.correlation_header.as_ref().map(|name| {
            let id = CorrelationId::generate();
            request.set_header(name.clone(), id.to_header_value());
            id
        });

        let envelope = match std::panic::catch_unwind(AssertUnwindSafe(|| {
            build_envelope(request, config, correlation_id)
        })) {
            Ok(envelope) => envelope,
            Err(_) => {
                tracing::error!(url = %request.url(), "Mirror envelope construction panicked");
                return HookOutcome::Mirrored {
                    correlation_id,
                    dispatch: DispatchOutcome::Dropped,
                };
            }
        };

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            sink = %envelope.target,
            body_bytes = envelope.body.len(),
            correlation_id = ?correlation_id.map(|id| id.to_string()),
            "Mirroring request"
        );

        let dispatch = active.dispatcher.dispatch(envelope).await;
        HookOutcome::Mirrored {
            correlation_id,
            dispatch,
        }
    }
}

impl RequestHook for MirrorHook {
    fn on_request<'a>(&'a self, request: &'a mut RequestDescriptor) -> BoxFuture<'a, ()> {
        Box::pin(async move {
            self.handle(request).await;
        })
    }
}
