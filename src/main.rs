use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use staking_pools::application::{Cli, CommandExecutor};
use staking_pools::config::Config;

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr, stdout carries the JSON report
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();
    let args = Cli::parse();

    // Priority: CLI args > Config file > Defaults
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(pools_file) = args.pools_file {
        config.source.pools_file = Some(pools_file);
        config.source.pools_url = None;
    }
    if let Some(pools_url) = args.pools_url {
        config.source.pools_url = Some(pools_url);
    }

    let output = CommandExecutor::execute(args.command, config)
        .await
        .context("staking command failed")?;
    println!("{}", output);
    Ok(())
}
