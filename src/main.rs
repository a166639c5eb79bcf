use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod config;
mod core;
mod error;
mod export;
mod progress;

use crate::cli::Cli;
use crate::core::Engine;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("Starting Spec Recon v{}", env!("CARGO_PKG_VERSION"));

    let engine = Engine::new(cli.config.as_deref())?;

    cli.execute(engine)
}
