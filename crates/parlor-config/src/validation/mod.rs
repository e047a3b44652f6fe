//! Full configuration validation.
//!
//! Validates numeric ranges and the nickname pattern. Each domain has its
//! own submodule; this orchestrator calls them all and collects errors
//! into a single `ConfigError`.

mod helpers;
mod network;
mod nickname;


use crate::schema::ParlorConfig;
use parlor_common::ConfigError;

/// Run all validations on a config, collecting all errors.
pub fn validate(config: &ParlorConfig) -> Result<(), ConfigError> {
    let mut errors: Vec<String> = Vec::new();

    network::validate_server(&mut errors, config);
    network::validate_delivery(&mut errors, config);
    nickname::validate_nickname(&mut errors, config);

    if errors.is_empty() {
        Ok(())
    } else {
        Err(ConfigError::ValidationError(errors.join("; ")))
    }
}
