use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde_json::{json, Value};
use ubex_contracts::{ContractError, ContractRegistry, CrowdsaleDeployParams, ErrorCategory};

/// Deploy and query the Ubex token and crowdsale contracts.
#[derive(Debug, Parser)]
#[command(name = "ubex", author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of ~/.ubex/config.json
    #[arg(short, long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Write log files here instead of ~/.ubex/logs
    #[arg(long, value_name = "DIR", global = true)]
    pub log_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Token contract operations
    #[command(subcommand)]
    Token(TokenCommand),

    /// Crowdsale contract operations
    #[command(subcommand)]
    Crowdsale(CrowdsaleCommand),
}

#[derive(Debug, Subcommand)]
pub enum TokenCommand {
    /// Deploy a new token minting the total supply to the signer
    Deploy {
        /// Total supply (decimal, or 0x / 0o / 0b prefixed)
        supply: String,
    },

    /// Token balance of an address
    Balance { address: String },
}

#[derive(Debug, Subcommand)]
pub enum CrowdsaleCommand {
    /// Deploy a crowdsale for the configured token
    Deploy {
        /// Tokens per wei
        #[arg(long)]
        rate: String,

        /// Address that receives the raised funds
        #[arg(long)]
        wallet: String,
    },

    /// Amount contributed by an address
    Balance { address: String },

    /// Raised wei, rate and issued tokens
    Status,

    /// Purchase events, optionally limited to the given purchasers
    Events {
        addresses: Vec<String>,

        /// Tag unknown events instead of failing the whole query
        #[arg(long)]
        lenient: bool,
    },
}

/// Execute `command` against the registered contracts and return its result
/// as JSON.
pub async fn run(registry: &ContractRegistry, command: Command) -> Result<Value> {
    let value = match command {
        Command::Token(TokenCommand::Deploy { supply }) => {
            let deployment = registry.token()?.deploy(&supply).await?;
            serde_json::to_value(deployment)?
        }
        Command::Token(TokenCommand::Balance { address }) => {
            let balance = registry.token()?.balance(&address).await?;
            json!({ "address": address, "balance": balance.to_string() })
        }
        Command::Crowdsale(CrowdsaleCommand::Deploy { rate, wallet }) => {
            let params = CrowdsaleDeployParams {
                token_rate: rate,
                wallet_address: wallet,
            };
            let deployment = registry.deploy_crowdsale(&params).await?;
            serde_json::to_value(deployment)?
        }
        Command::Crowdsale(CrowdsaleCommand::Balance { address }) => {
            let balance = registry.crowdsale()?.balance(&address).await?;
            json!({ "address": address, "balance": balance.to_string() })
        }
        Command::Crowdsale(CrowdsaleCommand::Status) => {
            serde_json::to_value(registry.crowdsale()?.status().await?)?
        }
        Command::Crowdsale(CrowdsaleCommand::Events { addresses, lenient }) => {
            let crowdsale = registry.crowdsale()?;
            if lenient {
                serde_json::to_value(crowdsale.classify_events(&addresses).await?)?
            } else {
                serde_json::to_value(crowdsale.events(&addresses).await?)?
            }
        }
    };
    Ok(value)
}

/// Render a command result for stdout.
pub fn render(value: &Value) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to render result")
}

/// Process exit code for a failed command: 2 for bad input, 3 when the chain
/// or contract failed, 4 for configuration and setup problems, 1 otherwise.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ContractError>().map(ContractError::category) {
        Some(ErrorCategory::UserError) => 2,
        Some(ErrorCategory::ChainError) => 3,
        Some(ErrorCategory::ConfigError) => 4,
        None => 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("ubex").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_token_deploy_keeps_supply_verbatim() {
        let cli = parse(&["token", "deploy", "0xf4240"]);
        assert!(matches!(
            cli.command,
            Command::Token(TokenCommand::Deploy { ref supply }) if supply == "0xf4240"
        ));
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_crowdsale_deploy_needs_rate_and_wallet() {
        let cli = parse(&["crowdsale", "deploy", "--rate", "1000", "--wallet", "0xabc"]);
        assert!(matches!(
            cli.command,
            Command::Crowdsale(CrowdsaleCommand::Deploy { ref rate, ref wallet })
                if rate == "1000" && wallet == "0xabc"
        ));

        let missing = Cli::try_parse_from(["ubex", "crowdsale", "deploy", "--rate", "1"]);
        assert!(missing.is_err());
    }

    #[test]
    fn test_events_collects_addresses_and_flag() {
        let cli = parse(&["crowdsale", "events", "0x01", "0x02", "--lenient"]);
        let Command::Crowdsale(CrowdsaleCommand::Events { addresses, lenient }) = cli.command
        else {
            panic!("expected events command");
        };
        assert_eq!(addresses, vec!["0x01", "0x02"]);
        assert!(lenient);

        let cli = parse(&["crowdsale", "events"]);
        assert!(matches!(
            cli.command,
            Command::Crowdsale(CrowdsaleCommand::Events { ref addresses, lenient: false })
                if addresses.is_empty()
        ));
    }

    #[test]
    fn test_global_config_flag_after_subcommand() {
        let cli = parse(&["crowdsale", "status", "--config", "/tmp/ubex.json"]);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/ubex.json")));
        assert!(matches!(cli.command, Command::Crowdsale(CrowdsaleCommand::Status)));
    }

    #[tokio::test]
    async fn test_run_without_contracts_reports_not_initialized() {
        let registry = ContractRegistry::new();
        let err = run(&registry, Command::Crowdsale(CrowdsaleCommand::Status))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "crowdsale is not initialized");
    }

    #[test]
    fn test_global_log_dir_flag() {
        let cli = parse(&["--log-dir", "/tmp/ubex-logs", "token", "balance", "0x01"]);
        assert_eq!(cli.log_dir, Some(PathBuf::from("/tmp/ubex-logs")));
        assert!(parse(&["crowdsale", "status"]).log_dir.is_none());
    }

    #[tokio::test]
    async fn test_exit_code_follows_error_category() {
        let registry = ContractRegistry::new();
        let err = run(&registry, Command::Crowdsale(CrowdsaleCommand::Status))
            .await
            .unwrap_err();
        assert_eq!(exit_code(&err), 4);

        let err = anyhow::Error::from(ContractError::InvalidArgument("wrong number".into()))
            .context("token deploy");
        assert_eq!(exit_code(&err), 2);

        let err = anyhow::Error::from(ContractError::UnknownEvent("Finalized".into()));
        assert_eq!(exit_code(&err), 3);

        assert_eq!(exit_code(&anyhow::anyhow!("config file unreadable")), 1);
    }

    #[test]
    fn test_cli_definition_is_consistent() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
