//! Default TOML config template with inline documentation comments.

/// Generate the default TOML config content with comments.
pub(crate) fn default_config_toml() -> String {
    r##"# Parlor Configuration
# Schema version 1
# Only override what you want to change -- missing fields use defaults.

[server]
# bind_address = "127.0.0.1"
# port = 2222              # 1024-65535
# join_timeout_secs = 30   # 5-300, time a new connection has to pick a name
# queue_capacity = 256     # 16-4096, buffered notifications per connection

[delivery]
# timeout_ms = 2000        # 50-60000, per-recipient delivery bound
# unreachable_threshold = 3  # 1-100, consecutive failures before implicit disconnect

[nickname]
# min_length = 1
# max_length = 20
# pattern = "^[a-zA-Z0-9_\\-]+$"

[client]
# server_url = "ws://127.0.0.1:2222"

[logging]
# level = "INFO"           # TRACE, DEBUG, INFO, WARNING, ERROR
"##
    .to_string()
}
