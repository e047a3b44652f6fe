//! Best-effort delivery of presence broadcasts and chat relays.
//!
//! Every delivery is isolated: a fault or timeout reaching one recipient is
//! logged and reported, never propagated, and never stops delivery to the
//! rest. Callers hand in a recipient snapshot taken under the coordinator
//! lock; nothing here touches shared state.

use std::fmt;
use std::time::Duration;

use chrono::{DateTime, Local};
use futures_util::future::join_all;
use tracing::{debug, warn};

use crate::handle::{DeliveryError, SharedHandle};
use crate::protocol::Notification;

/// One delivery target captured from the directory.
#[derive(Clone)]
pub struct Recipient {
    pub name: String,
    pub handle: SharedHandle,
}

impl fmt::Debug for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Recipient")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

/// Outcome of a fan-out, per recipient session.
#[derive(Debug, Clone, Default)]
pub struct FanoutReport {
    pub delivered: Vec<Recipient>,
    pub unreachable: Vec<Recipient>,
}

impl FanoutReport {
    pub fn merge(&mut self, other: FanoutReport) {
        self.delivered.extend(other.delivered);
        self.unreachable.extend(other.unreachable);
    }

    pub fn record(&mut self, recipient: &Recipient, result: &Result<(), DeliveryError>) {
        match result {
            Ok(()) => self.delivered.push(recipient.clone()),
            Err(_) => self.unreachable.push(recipient.clone()),
        }
    }

    /// Keep only the outcomes whose session satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&Recipient) -> bool) {
        self.delivered.retain(|r| keep(r));
        self.unreachable.retain(|r| keep(r));
    }

    pub fn is_empty(&self) -> bool {
        self.delivered.is_empty() && self.unreachable.is_empty()
    }

    pub fn is_clean(&self) -> bool {
        self.unreachable.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Notifier {
    timeout: Duration,
}

impl Notifier {
    pub fn new(timeout: Duration) -> Self {
        Self { timeout }
    }

    /// Deliver to a single recipient, bounded by the delivery timeout.
    pub async fn deliver(
        &self,
        recipient: &Recipient,
        notification: Notification,
    ) -> Result<(), DeliveryError> {
        let result = match tokio::time::timeout(self.timeout, recipient.handle.deliver(notification))
            .await
        {
            Ok(result) => result,
            Err(_) => Err(DeliveryError::TimedOut),
        };
        if let Err(ref e) = result {
            warn!(recipient = %recipient.name, error = %e, "Delivery failed");
        }
        result
    }

    /// Deliver `notification` to every recipient concurrently.
    pub async fn broadcast(
        &self,
        recipients: Vec<Recipient>,
        notification: Notification,
    ) -> FanoutReport {
        let mut report = FanoutReport::default();
        if recipients.is_empty() {
            return report;
        }

        debug!(
            recipients = recipients.len(),
            event = ?notification,
            "Broadcasting"
        );

        let deliveries = recipients.iter().map(|recipient| {
            let notification = notification.clone();
            async move {
                let result = self.deliver(recipient, notification).await;
                (recipient, result)
            }
        });

        for (recipient, result) in join_all(deliveries).await {
            report.record(recipient, &result);
        }
        report
    }

    /// Format a chat line from `from` and deliver it to both endpoints of
    /// the conversation.
    pub async fn relay(&self, from: &str, endpoints: Vec<Recipient>, text: &str) -> FanoutReport {
        let line = format_chat_line(Local::now(), from, text);
        self.broadcast(endpoints, Notification::Message { text: line })
            .await
    }
}

/// `"<timestamp> - <from>: <text>"`.
pub fn format_chat_line(at: DateTime<Local>, from: &str, text: &str) -> String {
    format!("{} - {}: {}", at.format("%a %b %e %H:%M:%S %Y"), from, text)
}
