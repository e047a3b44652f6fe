//! Consecutive-failure accounting for implicit disconnects.

use std::collections::HashMap;

use crate::directory::NameKey;
use crate::notifier::{FanoutReport, Recipient};

/// Counts consecutive failed deliveries per user. A successful delivery
/// clears the count; reaching the threshold marks the user for eviction.
#[derive(Debug)]
pub struct FaultTracker {
    threshold: u32,
    strikes: HashMap<NameKey, u32>,
}

impl FaultTracker {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            strikes: HashMap::new(),
        }
    }

    /// Apply a fan-out outcome. Returns the sessions that just crossed the
    /// threshold; their counts are reset.
    ///
    /// Counts are keyed by name, so callers must drop outcomes for sessions
    /// that no longer own their name before recording.
    pub fn record(&mut self, report: &FanoutReport) -> Vec<Recipient> {
        for recipient in &report.delivered {
            self.strikes.remove(&NameKey::new(&recipient.name));
        }

        let mut evict = Vec::new();
        for recipient in &report.unreachable {
            let key = NameKey::new(&recipient.name);
            let count = self.strikes.entry(key.clone()).or_insert(0);
            *count += 1;
            if *count >= self.threshold {
                self.strikes.remove(&key);
                evict.push(recipient.clone());
            }
        }
        evict
    }

    pub fn forget(&mut self, name: &str) {
        self.strikes.remove(&NameKey::new(name));
    }

    pub fn strikes(&self, name: &str) -> u32 {
        self.strikes.get(&NameKey::new(name)).copied().unwrap_or(0)
    }
}
