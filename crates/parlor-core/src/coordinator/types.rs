//! Configuration and outcome types for the coordinator.

use std::time::Duration;

use regex::Regex;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Rules a name must satisfy before it can join.
#[derive(Debug, Clone)]
pub struct NameRules {
    pub min_length: usize,
    pub max_length: usize,
    pattern: Regex,
}

impl NameRules {
    pub fn new(min_length: usize, max_length: usize, pattern: &str) -> Result<Self, regex::Error> {
        Ok(Self {
            min_length,
            max_length,
            pattern: Regex::new(pattern)?,
        })
    }

    /// Check `name`, returning a human-readable reason on failure.
    pub fn check(&self, name: &str) -> Result<(), String> {
        let len = name.chars().count();
        if len < self.min_length {
            return Err(format!(
                "name must be at least {} characters",
                self.min_length
            ));
        }
        if len > self.max_length {
            return Err(format!(
                "name must be at most {} characters",
                self.max_length
            ));
        }
        if !self.pattern.is_match(name) {
            return Err(format!("name must match {}", self.pattern.as_str()));
        }
        Ok(())
    }
}

impl Default for NameRules {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 20,
            pattern: Regex::new(r"^[a-zA-Z0-9_\-]+$").expect("default name pattern is valid"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    /// Upper bound on a single delivery to one recipient.
    pub delivery_timeout: Duration,
    /// Consecutive failed deliveries before a user is implicitly disconnected.
    pub unreachable_threshold: u32,
    pub names: NameRules,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            delivery_timeout: Duration::from_millis(2000),
            unreachable_threshold: 3,
            names: NameRules::default(),
        }
    }
}

// ---------------------------------------------------------------------------
// Rejections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum JoinRejection {
    #[error("that name is already taken")]
    NameTaken,

    #[error("invalid name: {0}")]
    InvalidName(String),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PairRejection {
    #[error("no such user")]
    UnknownTarget,

    #[error("that user is busy")]
    TargetBusy,

    #[error("you cannot pair with yourself")]
    SelfPair,

    #[error("you have not joined")]
    NotJoined,

    #[error("you are already in a conversation")]
    AlreadyPaired,
}

/// The caller has no active conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("not in a conversation")]
pub struct NotPaired;
