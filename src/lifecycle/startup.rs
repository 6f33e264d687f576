//! Startup orchestration.
//!
//! # Responsibilities
//! - Resolve and validate mirror configuration
//! - Build the hook and its dispatcher
//! - Start the metrics endpoint (optional)
//! - Bind the proxy listener and serve until a shutdown signal
//! - Drain in-flight mirror deliveries on the way out

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use tokio::net::TcpListener;

use crate::config::Settings;
use crate::lifecycle::{signals, Shutdown};
use crate::mirror::MirrorHook;
use crate::observability::metrics;
use crate::proxy::ProxyServer;

/// How long shutdown waits for background mirror deliveries.
pub const DRAIN_DEADLINE: Duration = Duration::from_secs(5);

/// Run the proxy host until SIGINT/SIGTERM.
pub async fn run(settings: Settings) -> Result<(), Box<dyn std::error::Error>> {
    let hook = Arc::new(MirrorHook::from_settings(&settings.mirror)?);

    if settings.observability.metrics_enabled {
        match settings.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics endpoint");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %settings.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(settings.listener.bind_address()).await?;

    let shutdown = Shutdown::new();
    let server = ProxyServer::new(&settings.listener, hook.clone());
    let server_task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    signals::wait_for_shutdown_signal().await;
    shutdown.trigger();
    server_task.await??;

    if let Some(dispatcher) = hook.dispatcher() {
        if dispatcher.drain(DRAIN_DEADLINE).await {
            tracing::info!("Mirror deliveries drained");
        }
    }

    Ok(())
}
