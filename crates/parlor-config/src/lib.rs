//! Parlor configuration system.
//!
//! Provides TOML-based configuration for the coordination server and the
//! terminal client. All config sections use sensible defaults so partial
//! configs work out of the box.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! let config = parlor_config::load_config_from(None).expect("failed to load config");
//! println!("listening on {}", config.server.listen_addr());
//! ```

pub mod schema;
pub mod toml_loader;
pub mod validation;

pub use schema::{ParlorConfig, CONFIG_SCHEMA_VERSION};
pub use toml_loader::ConfigSource;

use parlor_common::ConfigError;
use std::path::Path;

/// Load and validate config from an explicit path, or from the per-user
/// location when `None`. Only the per-user file is created on first run.
pub fn load_config_from(path: Option<&Path>) -> Result<ParlorConfig, ConfigError> {
    ConfigSource::resolve(path)?.load()
}
