mod cli;

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use ubex_contracts::{ContractRegistry, Wallet};
use ubex_core::config::UbexConfig;
use ubex_core::logging;

use crate::cli::Cli;

fn load_config(path: Option<&std::path::Path>) -> Result<UbexConfig> {
    let mut config = match path {
        Some(path) => UbexConfig::load_from_path(path)?,
        None => UbexConfig::load()?,
    };
    config.apply_env_overrides()?;
    config.validate()?;
    Ok(config)
}

async fn execute(cli: Cli) -> Result<()> {
    let config = load_config(cli.config.as_deref())?;
    let _log_guard = match &cli.log_dir {
        Some(dir) => logging::init_logging_to_dir(dir, &config.log_level)?,
        None => logging::init_logging(&config.log_level)?,
    };
    info!("Starting ubex v{}", env!("CARGO_PKG_VERSION"));

    let wallet = Arc::new(Wallet::from_config(&config).context("Failed to set up the wallet")?);
    let registry = ContractRegistry::from_config(&config, wallet)
        .context("Failed to bind the contracts")?;

    let value = cli::run(&registry, cli.command).await?;
    println!("{}", cli::render(&value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    match execute(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::from(cli::exit_code(&e))
        }
    }
}
