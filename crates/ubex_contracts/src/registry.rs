use std::sync::Arc;

use ethers::types::Address;
use once_cell::sync::OnceCell;
use tracing::{info, warn};
use ubex_core::config::UbexConfig;

use crate::crowdsale::Crowdsale;
use crate::error::{ContractError, Result};
use crate::ethereum::Wallet;
use crate::models::{CrowdsaleDeployParams, Deployment};
use crate::numeric::parse_address;
use crate::token::Token;

/// The process's contract facades, each set at most once.
///
/// Pass it (or an `Arc` of it) to whatever needs the contracts instead of
/// reaching for globals.
#[derive(Default)]
pub struct ContractRegistry {
    token: OnceCell<Token>,
    crowdsale: OnceCell<Crowdsale>,
}

impl ContractRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind both contracts from `config`, sharing one wallet.
    pub fn from_config(config: &UbexConfig, wallet: Arc<Wallet>) -> Result<Self> {
        let registry = Self::new();
        registry.init_token(Token::init(&config.contracts.token, wallet.clone())?)?;
        registry.init_crowdsale(Crowdsale::init(&config.contracts.crowdsale, wallet)?)?;
        Ok(registry)
    }

    pub fn init_token(&self, token: Token) -> Result<&Token> {
        let address = token.address();
        self.token
            .set(token)
            .map_err(|_| ContractError::AlreadyInitialized("token"))?;
        info!(?address, "token registered");
        self.token()
    }

    pub fn init_crowdsale(&self, crowdsale: Crowdsale) -> Result<&Crowdsale> {
        let address = crowdsale.address();
        self.crowdsale
            .set(crowdsale)
            .map_err(|_| ContractError::AlreadyInitialized("crowdsale"))?;
        info!(?address, "crowdsale registered");
        self.crowdsale()
    }

    pub fn token(&self) -> Result<&Token> {
        self.token.get().ok_or(ContractError::NotInitialized("token"))
    }

    pub fn crowdsale(&self) -> Result<&Crowdsale> {
        self.crowdsale
            .get()
            .ok_or(ContractError::NotInitialized("crowdsale"))
    }

    /// Deploy a crowdsale for the registered token.
    pub async fn deploy_crowdsale(&self, params: &CrowdsaleDeployParams) -> Result<Deployment> {
        let token = self.token()?;
        self.crowdsale()?.deploy(token, params).await
    }
}

/// Address of a configured contract. An empty setting binds the zero address,
/// which is only useful for deploying.
pub(crate) fn configured_address(contract: &'static str, value: &str) -> Result<Address> {
    if value.trim().is_empty() {
        warn!(contract, "no address configured, using the zero address");
        return Ok(Address::zero());
    }
    parse_address(value)
        .map_err(|_| ContractError::Config(format!("invalid {contract} address: {value}")))
}
