//! `ClientHandle` doubles shared by the unit tests.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;

use crate::handle::{ClientHandle, DeliveryError, SharedHandle};
use crate::protocol::Notification;

/// Records every notification it receives.
#[derive(Clone, Default)]
pub(crate) struct RecordingHandle {
    inbox: Arc<Mutex<Vec<Notification>>>,
}

impl RecordingHandle {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn shared(&self) -> SharedHandle {
        Arc::new(self.clone())
    }

    pub(crate) fn received(&self) -> Vec<Notification> {
        self.inbox.lock().unwrap().clone()
    }

    pub(crate) fn clear(&self) {
        self.inbox.lock().unwrap().clear();
    }
}

#[async_trait]
impl ClientHandle for RecordingHandle {
    async fn deliver(&self, notification: Notification) -> Result<(), DeliveryError> {
        self.inbox.lock().unwrap().push(notification);
        Ok(())
    }
}

/// A participant whose process is gone.
pub(crate) struct FailingHandle;

impl FailingHandle {
    pub(crate) fn shared() -> SharedHandle {
        Arc::new(Self)
    }
}

#[async_trait]
impl ClientHandle for FailingHandle {
    async fn deliver(&self, _notification: Notification) -> Result<(), DeliveryError> {
        Err(DeliveryError::Unreachable("connection reset".into()))
    }
}

/// A participant that never acknowledges a delivery.
pub(crate) struct StallingHandle;

impl StallingHandle {
    pub(crate) fn shared() -> SharedHandle {
        Arc::new(Self)
    }
}

#[async_trait]
impl ClientHandle for StallingHandle {
    async fn deliver(&self, _notification: Notification) -> Result<(), DeliveryError> {
        tokio::time::sleep(Duration::from_secs(3600)).await;
        Ok(())
    }
}
