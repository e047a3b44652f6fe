//! Nickname rules applied when a user joins.

use serde::{Deserialize, Serialize};

/// Nickname validation rules.
///
/// Names are compared case-insensitively for uniqueness; these rules only
/// constrain their shape.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NicknameConfig {
    pub min_length: u32,
    pub max_length: u32,
    pub pattern: String,
}

impl Default for NicknameConfig {
    fn default() -> Self {
        Self {
            min_length: 1,
            max_length: 20,
            pattern: r"^[a-zA-Z0-9_\-]+$".into(),
        }
    }
}
