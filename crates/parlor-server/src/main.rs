//! parlor-server: WebSocket coordination server for the parlor chat room.
//!
//! Accepts WebSocket connections, registers each under a unique name, and
//! routes pairing requests, chat messages and presence notifications
//! through a shared `Coordinator`.

mod connection;
mod handle;
mod server;

use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use parlor_common::ParlorError;

use crate::server::{serve, ServerContext};

#[derive(Parser)]
#[command(name = "parlor-server", about = "Coordination server for the parlor chat room")]
struct Args {
    /// Path to a config file. Defaults to the platform config directory.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Port to listen on (overrides `server.port`).
    #[arg(short, long)]
    port: Option<u16>,

    /// Address to bind (overrides `server.bind_address`).
    #[arg(long)]
    bind: Option<String>,

    /// Log level (overrides `logging.level`; `RUST_LOG` wins over both).
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<(), ParlorError> {
    let args = Args::parse();

    let mut config = parlor_config::load_config_from(args.config.as_deref())?;
    if let Some(port) = args.port {
        config.server.port = u32::from(port);
    }
    if let Some(bind) = args.bind {
        config.server.bind_address = bind;
    }

    let level = args
        .log_level
        .unwrap_or_else(|| config.logging.level.as_filter().to_string());
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("parlor_server={level},parlor_core={level}").into()),
        )
        .init();

    let ctx = ServerContext::from_config(&config)?;
    let addr = config.server.listen_addr();
    let listener = TcpListener::bind(&addr).await?;

    tracing::info!(
        addr = %addr,
        delivery_timeout = ?config.delivery.timeout(),
        unreachable_threshold = config.delivery.unreachable_threshold,
        "parlor-server listening"
    );

    tokio::select! {
        _ = serve(listener, ctx) => {}
        signal = tokio::signal::ctrl_c() => {
            signal?;
            tracing::info!("Shutting down");
        }
    }
    Ok(())
}
