//! Shared server context and the TCP accept loop.

use std::time::Duration;

use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;
use tracing::warn;

use parlor_common::{ConfigError, ParlorError};
use parlor_config::ParlorConfig;
use parlor_core::{Coordinator, CoordinatorConfig, NameRules};

use crate::connection::handle_connection;

/// Everything a connection task needs. Cheap to clone.
#[derive(Clone)]
pub struct ServerContext {
    pub coordinator: Coordinator,
    pub join_timeout: Duration,
    pub queue_capacity: usize,
}

impl ServerContext {
    pub fn from_config(config: &ParlorConfig) -> Result<Self, ParlorError> {
        let names = NameRules::new(
            config.nickname.min_length as usize,
            config.nickname.max_length as usize,
            &config.nickname.pattern,
        )
        .map_err(|e| ConfigError::ValidationError(format!("nickname.pattern: {e}")))?;

        let coordinator = Coordinator::new(CoordinatorConfig {
            delivery_timeout: config.delivery.timeout(),
            unreachable_threshold: config.delivery.unreachable_threshold,
            names,
        });

        Ok(Self {
            coordinator,
            join_timeout: Duration::from_secs(u64::from(config.server.join_timeout_secs)),
            queue_capacity: config.server.queue_capacity as usize,
        })
    }
}

/// Accept connections forever, one task per connection.
pub async fn serve(listener: TcpListener, ctx: ServerContext) {
    loop {
        match listener.accept().await {
            Ok((stream, addr)) => {
                let ctx = ctx.clone();
                tokio::spawn(async move {
                    match accept_async(stream).await {
                        Ok(ws) => handle_connection(ws, addr, ctx).await,
                        Err(e) => {
                            warn!(peer = %addr, error = %e, "WS handshake failed");
                        }
                    }
                });
            }
            Err(e) => {
                warn!(error = %e, "TCP accept error");
            }
        }
    }
}
