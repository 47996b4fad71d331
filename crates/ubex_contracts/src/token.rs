use std::sync::Arc;

use ethers::types::{Address, U256};
use tracing::{debug, info};
use ubex_core::config::ContractSettings;

use crate::artifacts::ContractArtifact;
use crate::bindings::{EthersToken, TokenBinding};
use crate::error::Result;
use crate::ethereum::Wallet;
use crate::models::Deployment;
use crate::numeric::{parse_address, parse_amount};
use crate::registry::configured_address;

/// The token contract.
pub struct Token {
    address: Address,
    binding: Arc<dyn TokenBinding>,
}

impl Token {
    pub fn new(address: Address, binding: Arc<dyn TokenBinding>) -> Self {
        Self { address, binding }
    }

    /// Bind to the configured token address over `wallet`'s connection.
    pub fn init(settings: &ContractSettings, wallet: Arc<Wallet>) -> Result<Self> {
        let address = configured_address("token", &settings.address)?;
        let artifact = settings
            .artifact
            .as_deref()
            .map(ContractArtifact::load)
            .transpose()?;
        let binding = EthersToken::new(address, wallet, artifact)?;
        info!(?address, "token contract initialized");
        Ok(Self::new(address, Arc::new(binding)))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// Deploy a new token minting `total_supply` (any radix accepted by
    /// [`parse_amount`]) to the deploying account.
    pub async fn deploy(&self, total_supply: &str) -> Result<Deployment> {
        let total_supply = parse_amount(total_supply)?;
        debug!(%total_supply, "deploying token");
        self.binding.deploy(total_supply).await
    }

    /// Token balance of `address`.
    pub async fn balance(&self, address: &str) -> Result<U256> {
        let owner = parse_address(address)?;
        self.binding.balance_of(owner).await
    }
}
