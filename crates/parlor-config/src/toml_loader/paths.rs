//! The per-user config location and first-run seeding.

use std::path::{Path, PathBuf};

use parlor_common::ConfigError;

use super::template::default_config_toml;

const APP_DIR: &str = "parlor";
const FILE_NAME: &str = "config.toml";

/// `<platform config dir>/parlor/config.toml`.
pub fn user_config_path() -> Result<PathBuf, ConfigError> {
    dirs::config_dir()
        .map(|base| config_path_in(&base))
        .ok_or_else(|| ConfigError::ParseError("no config directory on this platform".into()))
}

pub(crate) fn config_path_in(base: &Path) -> PathBuf {
    base.join(APP_DIR).join(FILE_NAME)
}

/// Write the commented template to `path`, creating parent directories.
/// An existing file is left alone.
pub fn seed_template(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Ok(());
    }
    let write = || -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(path, default_config_toml())
    };
    write().map_err(|e| {
        ConfigError::ParseError(format!("failed to write template to {}: {e}", path.display()))
    })
}
