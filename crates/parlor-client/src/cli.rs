use std::path::PathBuf;

use clap::Parser;

/// Terminal client for the parlor chat room.
#[derive(Parser, Debug)]
#[command(name = "parlor", version, about)]
pub struct Args {
    /// Server URL (overrides `client.server_url`), e.g. ws://127.0.0.1:2222.
    #[arg(short, long)]
    pub server: Option<String>,

    /// Name to join with. Prompted for when omitted or taken.
    #[arg(short, long)]
    pub name: Option<String>,

    /// Config file path override.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log level override (debug, info, warn, error).
    #[arg(long)]
    pub log_level: Option<String>,
}

pub fn parse() -> Args {
    Args::parse()
}
