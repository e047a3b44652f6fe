//! Notification delivery settings.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Bounds on fan-out delivery to remote handles.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DeliveryConfig {
    /// Per-recipient delivery timeout in milliseconds (valid range: 50-60000).
    pub timeout_ms: u32,
    /// Consecutive failed deliveries before a user is implicitly
    /// disconnected (valid range: 1-100).
    pub unreachable_threshold: u32,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            timeout_ms: 2000,
            unreachable_threshold: 3,
        }
    }
}

impl DeliveryConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.timeout_ms))
    }
}
