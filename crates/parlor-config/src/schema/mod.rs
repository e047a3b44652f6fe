//! Configuration schema types for Parlor.
//!
//! All structs use `serde(default)` so partial configs work correctly.
//! Missing fields are filled with sensible defaults.

mod client;
mod delivery;
mod nickname;
mod server;
mod system;

pub use client::*;
pub use delivery::*;
pub use nickname::*;
pub use server::*;
pub use system::*;

use serde::{Deserialize, Serialize};

/// Current config schema version.
pub const CONFIG_SCHEMA_VERSION: u32 = 1;

/// Root configuration for Parlor.
///
/// The server reads `server`, `delivery`, `nickname` and `logging`; the
/// terminal client reads `client` and `logging`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
#[derive(Default)]
pub struct ParlorConfig {
    pub server: ServerConfig,
    pub delivery: DeliveryConfig,
    pub nickname: NicknameConfig,
    pub client: ClientConfig,
    pub logging: LoggingConfig,
}
