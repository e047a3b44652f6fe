//! The seam between coordination logic and the transport.

use std::sync::Arc;

use async_trait::async_trait;

use crate::protocol::Notification;

/// A reference usable to deliver a notification to one remote participant.
///
/// Implementations report an unreachable participant as an error rather
/// than panicking; the notifier bounds every call with a timeout, so a
/// handle may block while its peer applies backpressure.
#[async_trait]
pub trait ClientHandle: Send + Sync {
    async fn deliver(&self, notification: Notification) -> Result<(), DeliveryError>;
}

pub type SharedHandle = Arc<dyn ClientHandle>;

/// A communication fault reaching one recipient.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeliveryError {
    #[error("recipient unreachable: {0}")]
    Unreachable(String),

    #[error("delivery timed out")]
    TimedOut,
}
