//! Reading a config file: where it comes from decides how a missing file is
//! treated.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use parlor_common::ConfigError;
use tracing::{debug, info};

use crate::schema::ParlorConfig;
use crate::validation;

use super::paths::{seed_template, user_config_path};

/// Where a config file is looked for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigSource {
    /// Named on the command line. It must exist.
    Explicit(PathBuf),
    /// The per-user location. A missing file is seeded with the commented
    /// template and defaults are used.
    User(PathBuf),
}

impl ConfigSource {
    /// The explicit path when given, else the per-user location.
    pub fn resolve(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) => Ok(Self::Explicit(path.to_path_buf())),
            None => Ok(Self::User(user_config_path()?)),
        }
    }

    pub fn path(&self) -> &Path {
        match self {
            Self::Explicit(path) | Self::User(path) => path,
        }
    }

    /// Read, parse and validate the config this source points at.
    pub fn load(&self) -> Result<ParlorConfig, ConfigError> {
        let path = self.path();
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return match self {
                    Self::Explicit(_) => Err(ConfigError::FileNotFound(path.to_path_buf())),
                    Self::User(_) => {
                        seed_template(path)?;
                        info!(path = %path.display(), "No config found, wrote template and using defaults");
                        Ok(ParlorConfig::default())
                    }
                };
            }
            Err(e) => {
                return Err(ConfigError::ParseError(format!(
                    "failed to read {}: {e}",
                    path.display()
                )))
            }
        };

        let config = parse(&text)
            .map_err(|e| ConfigError::ParseError(format!("{}: {e}", path.display())))?;
        validation::validate(&config)?;
        debug!(path = %path.display(), "Loaded config");
        Ok(config)
    }
}

/// Parse TOML text. Missing sections and fields take their defaults.
pub fn parse(text: &str) -> Result<ParlorConfig, toml::de::Error> {
    toml::from_str(text)
}
