//! Validation for the server listener and delivery sections.

use crate::schema::ParlorConfig;

use super::helpers::validate_range;

/// Validate server listener constraints.
pub(crate) fn validate_server(errors: &mut Vec<String>, config: &ParlorConfig) {
    validate_range(errors, "server.port", config.server.port, 1024, 65535);
    validate_range(
        errors,
        "server.join_timeout_secs",
        config.server.join_timeout_secs,
        5,
        300,
    );
    validate_range(
        errors,
        "server.queue_capacity",
        config.server.queue_capacity,
        16,
        4096,
    );
    if config.server.bind_address.trim().is_empty() {
        errors.push("server.bind_address must not be empty".into());
    }
}

/// Validate delivery constraints.
pub(crate) fn validate_delivery(errors: &mut Vec<String>, config: &ParlorConfig) {
    validate_range(
        errors,
        "delivery.timeout_ms",
        config.delivery.timeout_ms,
        50,
        60000,
    );
    validate_range(
        errors,
        "delivery.unreachable_threshold",
        config.delivery.unreachable_threshold,
        1,
        100,
    );
}
