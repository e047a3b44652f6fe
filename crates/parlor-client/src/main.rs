mod cli;
mod commands;
mod session;

use tracing_subscriber::EnvFilter;

use parlor_common::ParlorError;

#[tokio::main]
async fn main() -> Result<(), ParlorError> {
    let args = cli::parse();
    let config = parlor_config::load_config_from(args.config.as_deref())?;

    // Logs go to stderr so they do not interleave with the conversation on stdout.
    let level = args
        .log_level
        .unwrap_or_else(|| config.logging.level.as_filter().to_string());
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("parlor={level},parlor_core={level}").into()),
        )
        .init();

    let url = args.server.unwrap_or(config.client.server_url);
    session::run(&url, args.name).await
}
