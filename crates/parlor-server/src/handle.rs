//! `ClientHandle` backed by a connection's outbound queue.

use async_trait::async_trait;
use tokio::sync::mpsc;

use parlor_core::{ClientHandle, DeliveryError, Notification, ServerMessage};

/// Pushes notifications onto the bounded queue drained by the connection's
/// WebSocket writer. A full queue applies backpressure until the notifier's
/// timeout; a closed queue means the connection is gone.
pub struct ChannelHandle {
    tx: mpsc::Sender<ServerMessage>,
}

impl ChannelHandle {
    pub fn new(tx: mpsc::Sender<ServerMessage>) -> Self {
        Self { tx }
    }
}

#[async_trait]
impl ClientHandle for ChannelHandle {
    async fn deliver(&self, notification: Notification) -> Result<(), DeliveryError> {
        self.tx
            .send(notification.into())
            .await
            .map_err(|_| DeliveryError::Unreachable("connection closed".into()))
    }
}
