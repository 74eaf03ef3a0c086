//! Home server.
//!
//! # Architecture Overview
//!
//! ```text
//!     Client Request
//!     ──────────────▶ http server ──▶ session ──▶ dispatcher ──▶ mount table
//!                     (request id,    (identity)      │
//!                      timeout,                       ├─ mirrored && !principal → 302 remote web UI
//!                      tracing)                       ├─ bare prefix            → 301 prefix/
//!                                                     └─ rewrite → sub-application (recorder)
//!                                                                      │
//!                                                    issues / changes / blog routers
//!                                                                      │
//!                                                           Mirrored service facade
//!                                                            ├─ local store
//!                                                            └─ remote mirror (principal only)
//!     Client Response
//!     ◀────────────── finalize (replay, or 302 login for anonymous 403)
//! ```

use clap::Parser;
use std::path::PathBuf;
use tokio::net::TcpListener;

use home_router::config::{load_config, AppConfig};
use home_router::lifecycle::{build_server, signals, Backends, Shutdown};
use home_router::observability::{logging, metrics};

#[derive(Debug, Parser)]
#[command(name = "home-router", version, about = "Multi-tenant home server")]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override the listener bind address.
    #[arg(short, long)]
    bind: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => AppConfig::default(),
    };
    if let Some(bind) = args.bind {
        config.listener.bind_address = bind;
    }

    logging::init(&config.observability);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "home-router starting");
    tracing::info!(
        bind_address = %config.listener.bind_address,
        mounts = config.mounts.len(),
        mirror_host = %config.mirror.host,
        request_timeout_secs = config.timeouts.request_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = build_server(&config, Backends::in_memory())?;

    let listener = TcpListener::bind(&config.listener.bind_address).await?;
    tracing::info!(address = %listener.local_addr()?, "Listening for connections");

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server_task = tokio::spawn(server.run(listener, server_shutdown));

    signals::shutdown_on_signal(&shutdown).await;
    server_task.await??;

    tracing::info!("Shutdown complete");
    Ok(())
}
