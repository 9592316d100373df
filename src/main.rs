// src/main.rs

use anyhow::Result;
use clap::Parser;

mod cli;
mod commands;

use cli::Cli;

fn main() -> Result<()> {
    // Logs go to stderr so the preview on stdout stays clean
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    commands::cmd_run(&cli)
}
