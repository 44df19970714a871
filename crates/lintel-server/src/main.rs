//! Lintel host binary — HTTP and CLI entry points over the kernel.

mod bootstrap;
mod cli;
mod components;
mod http;

use clap::Parser;
use cli::{Cli, Command};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialise structured logging; RUST_LOG wins over the verbose flag.
    let fallback = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback)),
        )
        .init();

    match cli.command {
        Command::Serve { bind } => http::serve(&bind, cli.config.as_deref()).await,
        Command::Call { path, args } => cli::call(&path, &args, cli.config.as_deref()).await,
    }
}
