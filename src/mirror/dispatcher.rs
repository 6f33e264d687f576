//! Mirror delivery.
//!
//! # Responsibilities
//! - POST the envelope to the sink with a per-attempt timeout
//! - Synchronous mode: the caller awaits the attempt
//! - Asynchronous mode: the attempt runs on its own Tokio task
//! - Contain every failure, panics included, at this boundary
//!
//! # Design Decisions
//! - At-most-once: failed deliveries are logged and counted, never retried
//! - Background deliveries are capped by a semaphore; when saturated the
//!   mirror is dropped instead of making the caller wait
//! - One pooled HTTP client shared by all deliveries

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::StatusCode;
use futures_util::future::{BoxFuture, FutureExt};
use tokio::sync::Semaphore;

use crate::config::MirrorConfig;
use crate::error::{ConfigError, MirrorDeliveryError};
use crate::mirror::envelope::MirrorEnvelope;
use crate::observability::metrics;

/// Sends one envelope to the sink.
pub trait MirrorTransport: Send + Sync + 'static {
    /// Resolves to the sink's 2xx status, or the reason delivery failed.
    fn send(&self, envelope: MirrorEnvelope) -> BoxFuture<'static, Result<StatusCode, MirrorDeliveryError>>;
}

/// HTTP transport backed by a pooled `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    timeout: Duration,
}

impl HttpTransport {
    /// Build a client with a request-level timeout.
    ///
    /// Proxy environment variables are ignored so mirrors never loop back
    /// through the intercepting proxy.
    pub fn new(timeout: Duration) -> Result<Self, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .no_proxy()
            .build()
            .map_err(ConfigError::HttpClient)?;
        Ok(Self { client, timeout })
    }
}

impl MirrorTransport for HttpTransport {
    fn send(&self, envelope: MirrorEnvelope) -> BoxFuture<'static, Result<StatusCode, MirrorDeliveryError>> {
        let timeout = self.timeout;
        let request = self
            .client
            .request(envelope.method.clone(), envelope.target.clone())
            .headers(envelope.wire_headers())
            .body(envelope.body);

        Box::pin(async move {
            let response = request.send().await.map_err(|e| {
                if e.is_timeout() {
                    MirrorDeliveryError::Timeout(timeout)
                } else if e.is_builder() {
                    MirrorDeliveryError::Request(e.to_string())
                } else {
                    MirrorDeliveryError::Transport(e)
                }
            })?;

            let status = response.status();
            if status.is_success() {
                Ok(status)
            } else {
                Err(MirrorDeliveryError::Status(status))
            }
        })
    }
}

/// Result of handing an envelope to the dispatcher.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Synchronous attempt reached the sink.
    Delivered(StatusCode),
    /// Synchronous attempt failed.
    Failed(MirrorDeliveryError),
    /// Background attempt started; its result is only logged.
    Spawned,
    /// Background attempt was not started.
    Dropped,
}

/// Delivers mirror envelopes. Cheap to clone; clones share the transport and
/// the in-flight budget.
#[derive(Clone)]
pub struct Dispatcher {
    transport: Arc<dyn MirrorTransport>,
    timeout: Duration,
    async_delivery: bool,
    in_flight: Arc<Semaphore>,
    max_in_flight: usize,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("timeout", &self.timeout)
            .field("async_delivery", &self.async_delivery)
            .field("max_in_flight", &self.max_in_flight)
            .field("in_flight", &self.in_flight())
            .finish()
    }
}

impl Dispatcher {
    /// Create a dispatcher using the HTTP transport.
    pub fn new(config: &MirrorConfig) -> Result<Self, ConfigError> {
        let transport = HttpTransport::new(config.timeout)?;
        Ok(Self::with_transport(config, Arc::new(transport)))
    }

    /// Create a dispatcher with a custom transport.
    pub fn with_transport(config: &MirrorConfig, transport: Arc<dyn MirrorTransport>) -> Self {
        let max_in_flight = config.max_in_flight.min(Semaphore::MAX_PERMITS);
        Self {
            transport,
            timeout: config.timeout,
            async_delivery: config.async_delivery,
            in_flight: Arc::new(Semaphore::new(max_in_flight)),
            max_in_flight,
        }
    }

    /// Number of background deliveries currently running.
    pub fn in_flight(&self) -> usize {
        self.max_in_flight - self.in_flight.available_permits()
    }

    /// Hand an envelope over for delivery. Never fails.
    ///
    /// In synchronous mode this awaits the attempt (bounded by the timeout);
    /// in asynchronous mode it returns as soon as the task is spawned.
    pub async fn dispatch(&self, envelope: MirrorEnvelope) -> DispatchOutcome {
        if !self.async_delivery {
            return match self.deliver(envelope).await {
                Ok(status) => DispatchOutcome::Delivered(status),
                Err(e) => DispatchOutcome::Failed(e),
            };
        }

        let permit = match self.in_flight.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => {
                tracing::warn!(
                    sink = %envelope.target,
                    max_in_flight = self.max_in_flight,
                    "Mirror dropped: too many deliveries in flight"
                );
                metrics::record_dropped("saturated");
                return DispatchOutcome::Dropped;
            }
        };

        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            tracing::warn!(sink = %envelope.target, "Mirror dropped: no async runtime available");
            metrics::record_dropped("no_runtime");
            return DispatchOutcome::Dropped;
        };

        let this = self.clone();
        runtime.spawn(async move {
            let _ = this.deliver(envelope).await;
            drop(permit);
        });
        DispatchOutcome::Spawned
    }

    /// Perform one guarded delivery attempt and record its outcome.
    ///
    /// Panics raised while creating or polling the transport future are
    /// caught and reported as [`MirrorDeliveryError::Panicked`].
    pub async fn deliver(&self, envelope: MirrorEnvelope) -> Result<StatusCode, MirrorDeliveryError> {
        let started = Instant::now();
        let sink = envelope.target.clone();
        let correlation_id = envelope.correlation_id;

        let result = match std::panic::catch_unwind(AssertUnwindSafe(|| self.transport.send(envelope))) {
            Ok(send) => {
                let guarded = AssertUnwindSafe(send).catch_unwind();
                match tokio::time::timeout(self.timeout, guarded).await {
                    Ok(Ok(result)) => result,
                    Ok(Err(panic)) => Err(MirrorDeliveryError::Panicked(panic_message(panic))),
                    Err(_) => Err(MirrorDeliveryError::Timeout(self.timeout)),
                }
            }
            Err(panic) => Err(MirrorDeliveryError::Panicked(panic_message(panic))),
        };

        match &result {
            Ok(status) => {
                tracing::info!(
                    sink = %sink,
                    status = %status,
                    correlation_id = ?correlation_id.map(|id| id.to_string()),
                    elapsed = ?started.elapsed(),
                    "Mirror delivered"
                );
                metrics::record_delivery("delivered", started);
            }
            Err(e) => {
                tracing::warn!(
                    sink = %sink,
                    error = %e,
                    correlation_id = ?correlation_id.map(|id| id.to_string()),
                    elapsed = ?started.elapsed(),
                    "Mirror delivery failed"
                );
                metrics::record_delivery(e.kind(), started);
            }
        }

        result
    }

    /// Wait for background deliveries to finish, up to `deadline`.
    ///
    /// Returns true if nothing is left in flight.
    pub async fn drain(&self, deadline: Duration) -> bool {
        let permits = u32::try_from(self.max_in_flight).unwrap_or(u32::MAX);
        match tokio::time::timeout(deadline, self.in_flight.acquire_many(permits)).await {
            Ok(Ok(_all)) => true,
            _ => {
                tracing::warn!(in_flight = self.in_flight(), "Mirror drain deadline reached");
                false
            }
        }
    }
}

fn panic_message(panic: Box<dyn Any + Send + 'static>) -> String {
    if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    }
}
