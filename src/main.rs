//! request-mirror
//!
//! A forward proxy that duplicates selected requests to a mirror sink.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client ──▶ proxy host ──▶ MirrorHook ──▶ forward ──▶ Origin
//!                                   │
//!                                   ├─ matcher (method / URL / content-type)
//!                                   ├─ correlation header on the original
//!                                   ├─ envelope (same body, same headers)
//!                                   └─ dispatcher ──POST──▶ Mirror sink
//!                                        (sync, or Tokio task)
//! ```
//!
//! Configuration comes from an optional TOML file and `LISTEN_PORT` /
//! `MIRROR_*` environment variables, resolved once at startup.

use std::path::PathBuf;

use clap::Parser;

use request_mirror::config::{loader, MirrorConfig};
use request_mirror::lifecycle::startup;
use request_mirror::observability::logging;

#[derive(Parser)]
#[command(name = "request-mirror")]
#[command(about = "Forward proxy that mirrors selected requests to a sink", long_about = None)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Validate configuration, print the resolved settings as JSON and exit.
    #[arg(long)]
    check: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let settings = loader::load_settings(cli.config.as_deref())?;
    logging::init(&settings.observability.log_level);

    tracing::info!("request-mirror v{} starting", env!("CARGO_PKG_VERSION"));

    if cli.check {
        let enabled = MirrorConfig::from_settings(&settings.mirror)?.is_some();
        println!("{}", serde_json::to_string_pretty(&settings)?);
        tracing::info!(mirroring_enabled = enabled, "Configuration valid");
        return Ok(());
    }

    tracing::info!(
        bind_address = %settings.listener.bind_address(),
        mirror_base = %settings.mirror.base,
        "Configuration loaded"
    );

    startup::run(settings).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
