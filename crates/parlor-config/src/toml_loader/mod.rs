//! TOML config file loading and first-run template creation.

mod loader;
mod paths;
mod template;


pub use loader::{parse, ConfigSource};
pub use paths::{seed_template, user_config_path};
