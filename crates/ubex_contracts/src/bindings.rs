//! Typed contract bindings and the traits the facades call them through.

use std::sync::Arc;

use async_trait::async_trait;
use ethers::abi::{Abi, Tokenize};
use ethers::contract::{abigen, ContractFactory};
use ethers::providers::Middleware;
use ethers::types::{Address, U256};
use ethers::utils::get_contract_address;
use tracing::{debug, info};

use crate::artifacts::ContractArtifact;
use crate::error::{ContractError, Result};
use crate::ethereum::{ChainClient, Wallet};
use crate::models::Deployment;

abigen!(
    UbexToken,
    r#"[
        function totalSupply() external view returns (uint256)
        function balanceOf(address owner) external view returns (uint256)
        event Transfer(address indexed from, address indexed to, uint256 value)
        event Approval(address indexed owner, address indexed spender, uint256 value)
    ]"#
);

abigen!(
    UbexCrowdsale,
    r#"[
        function rate() external view returns (uint256)
        function weiRaised() external view returns (uint256)
        function tokensIssued() external view returns (uint256)
        function balances(address contributor) external view returns (uint256)
        event TokenPurchase(address indexed purchaser, address indexed beneficiary, uint256 value, uint256 amount)
        event TokenPaid(address indexed purchaser, address indexed beneficiary, uint256 value, uint256 created)
        event OwnershipTransferred(address indexed previousOwner, address indexed newOwner)
    ]"#
);

/// Constructor arity of `UbexToken(uint256 totalSupply)`.
const TOKEN_CONSTRUCTOR_ARGS: usize = 1;
/// Constructor arity of `UbexCrowdsale(uint256 rate, address wallet, address token)`.
const CROWDSALE_CONSTRUCTOR_ARGS: usize = 3;

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

#[async_trait]
pub trait TokenBinding: Send + Sync {
    async fn deploy(&self, total_supply: U256) -> Result<Deployment>;
    async fn balance_of(&self, owner: Address) -> Result<U256>;
}

#[async_trait]
pub trait CrowdsaleBinding: Send + Sync {
    async fn deploy(&self, rate: U256, wallet: Address, token: Address) -> Result<Deployment>;
    async fn balances(&self, contributor: Address) -> Result<U256>;
    async fn wei_raised(&self) -> Result<U256>;
    async fn rate(&self) -> Result<U256>;
    async fn tokens_issued(&self) -> Result<U256>;
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

/// Make sure an artifact's constructor matches what the binding will pass.
fn check_artifact(
    contract: &'static str,
    artifact: Option<ContractArtifact>,
    expected_args: usize,
) -> Result<Option<ContractArtifact>> {
    if let Some(artifact) = &artifact {
        let arity = artifact.constructor_arity();
        if arity != expected_args {
            return Err(ContractError::Binding {
                contract,
                reason: format!(
                    "artifact constructor takes {arity} arguments, expected {expected_args}"
                ),
            });
        }
    }
    Ok(artifact)
}

fn deploy_failed(contract: &str, err: impl std::fmt::Display) -> ContractError {
    ContractError::Chain(format!("failed to deploy {contract} contract: {err}"))
}

/// Sign and submit a contract-creation transaction without waiting for it to
/// be mined. The address follows from the sender and the nonce used.
async fn submit_deployment<T: Tokenize>(
    contract: &'static str,
    wallet: &Wallet,
    artifact: Option<&ContractArtifact>,
    constructor_args: T,
) -> Result<Deployment> {
    let artifact = artifact.ok_or_else(|| {
        ContractError::Artifact(format!("no compiled artifact configured for {contract}"))
    })?;
    let client = wallet.connection.clone();

    let factory = ContractFactory::new(
        artifact.abi.clone(),
        artifact.bytecode.clone(),
        client.clone(),
    );
    let mut tx = factory
        .deploy(constructor_args)
        .map_err(|e| deploy_failed(contract, e))?
        .tx;

    client
        .fill_transaction(&mut tx, None)
        .await
        .map_err(|e| deploy_failed(contract, e))?;
    let nonce = tx
        .nonce()
        .copied()
        .ok_or_else(|| deploy_failed(contract, "nonce was not filled in"))?;

    let pending = client
        .send_transaction(tx, None)
        .await
        .map_err(|e| deploy_failed(contract, e))?;

    let deployment = Deployment {
        address: get_contract_address(wallet.address(), nonce),
        tx_hash: pending.tx_hash(),
    };
    info!(
        contract,
        address = ?deployment.address,
        tx_hash = ?deployment.tx_hash,
        "deployment submitted"
    );
    Ok(deployment)
}

// ---------------------------------------------------------------------------
// Token
// ---------------------------------------------------------------------------

/// `UbexToken` over a live node.
pub struct EthersToken {
    contract: UbexToken<ChainClient>,
    wallet: Arc<Wallet>,
    artifact: Option<ContractArtifact>,
}

impl EthersToken {
    pub fn new(
        address: Address,
        wallet: Arc<Wallet>,
        artifact: Option<ContractArtifact>,
    ) -> Result<Self> {
        let artifact = check_artifact("Token", artifact, TOKEN_CONSTRUCTOR_ARGS)?;
        Ok(Self {
            contract: UbexToken::new(address, wallet.connection.clone()),
            wallet,
            artifact,
        })
    }
}

#[async_trait]
impl TokenBinding for EthersToken {
    async fn deploy(&self, total_supply: U256) -> Result<Deployment> {
        submit_deployment("UbexToken", &self.wallet, self.artifact.as_ref(), total_supply).await
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        debug!(token = ?self.contract.address(), ?owner, "balanceOf");
        self.contract
            .balance_of(owner)
            .call()
            .await
            .map_err(ContractError::chain)
    }
}

// ---------------------------------------------------------------------------
// Crowdsale
// ---------------------------------------------------------------------------

/// `UbexCrowdsale` over a live node.
pub struct EthersCrowdsale {
    contract: UbexCrowdsale<ChainClient>,
    wallet: Arc<Wallet>,
    artifact: Option<ContractArtifact>,
}

impl EthersCrowdsale {
    pub fn new(
        address: Address,
        wallet: Arc<Wallet>,
        artifact: Option<ContractArtifact>,
    ) -> Result<Self> {
        let artifact = check_artifact("Crowdsale", artifact, CROWDSALE_CONSTRUCTOR_ARGS)?;
        Ok(Self {
            contract: UbexCrowdsale::new(address, wallet.connection.clone()),
            wallet,
            artifact,
        })
    }

    /// ABI of the call surface above.
    pub fn abi(&self) -> Abi {
        self.contract.abi().clone()
    }

    /// ABI used to name this contract's logs: the configured artifact's full
    /// ABI when there is one, otherwise the call surface above.
    pub fn events_abi(&self) -> Abi {
        match &self.artifact {
            Some(artifact) => artifact.abi.clone(),
            None => self.abi(),
        }
    }
}

#[async_trait]
impl CrowdsaleBinding for EthersCrowdsale {
    async fn deploy(&self, rate: U256, wallet: Address, token: Address) -> Result<Deployment> {
        submit_deployment(
            "UbexCrowdsale",
            &self.wallet,
            self.artifact.as_ref(),
            (rate, wallet, token),
        )
        .await
    }

    async fn balances(&self, contributor: Address) -> Result<U256> {
        debug!(crowdsale = ?self.contract.address(), ?contributor, "balances");
        self.contract
            .balances(contributor)
            .call()
            .await
            .map_err(ContractError::chain)
    }

    async fn wei_raised(&self) -> Result<U256> {
        debug!(crowdsale = ?self.contract.address(), "weiRaised");
        self.contract
            .wei_raised()
            .call()
            .await
            .map_err(ContractError::chain)
    }

    async fn rate(&self) -> Result<U256> {
        debug!(crowdsale = ?self.contract.address(), "rate");
        self.contract
            .rate()
            .call()
            .await
            .map_err(ContractError::chain)
    }

    async fn tokens_issued(&self) -> Result<U256> {
        debug!(crowdsale = ?self.contract.address(), "tokensIssued");
        self.contract
            .tokens_issued()
            .call()
            .await
            .map_err(ContractError::chain)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ethers::signers::LocalWallet;
    use ubex_core::config::RpcSettings;

    const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

    fn wallet() -> Arc<Wallet> {
        let account: LocalWallet = DEV_KEY.parse().unwrap();
        Arc::new(Wallet::connect(&RpcSettings::default(), account).unwrap())
    }

    fn artifact(constructor_inputs: &str) -> ContractArtifact {
        ContractArtifact::from_json(&format!(
            r#"{{
                "abi": [{{ "type": "constructor", "inputs": [{constructor_inputs}], "stateMutability": "nonpayable" }}],
                "bytecode": "0x6080"
            }}"#
        ))
        .unwrap()
    }

    #[test]
    fn crowdsale_abi_knows_both_purchase_events() {
        let crowdsale = EthersCrowdsale::new(Address::zero(), wallet(), None).unwrap();
        let abi = crowdsale.abi();
        assert!(abi.event("TokenPurchase").is_ok());
        assert!(abi.event("TokenPaid").is_ok());
        assert!(abi.function("tokensIssued").is_ok());
    }

    #[test]
    fn crowdsale_events_abi_prefers_artifact() {
        let inputs = r#"{ "name": "rate", "type": "uint256" },
            { "name": "wallet", "type": "address" },
            { "name": "token", "type": "address" }"#;
        let json = format!(
            r#"{{
                "abi": [
                    {{ "type": "constructor", "inputs": [{inputs}], "stateMutability": "nonpayable" }},
                    {{ "type": "event", "name": "Finalized", "inputs": [], "anonymous": false }}
                ],
                "bytecode": "0x6080"
            }}"#
        );
        let artifact = ContractArtifact::from_json(&json).unwrap();

        let with_artifact = EthersCrowdsale::new(Address::zero(), wallet(), Some(artifact)).unwrap();
        assert!(with_artifact.events_abi().event("Finalized").is_ok());

        let bare = EthersCrowdsale::new(Address::zero(), wallet(), None).unwrap();
        assert!(bare.events_abi().event("TokenPaid").is_ok());
        assert!(bare.events_abi().event("Finalized").is_err());
    }

    #[test]
    fn mismatched_constructor_is_a_binding_error() {
        let two_args = r#"{ "name": "a", "type": "uint256" }, { "name": "b", "type": "address" }"#;
        let err = EthersCrowdsale::new(Address::zero(), wallet(), Some(artifact(two_args)))
            .err()
            .unwrap();
        assert!(matches!(err, ContractError::Binding { contract: "Crowdsale", .. }));

        let one_arg = r#"{ "name": "totalSupply", "type": "uint256" }"#;
        assert!(EthersToken::new(Address::zero(), wallet(), Some(artifact(one_arg))).is_ok());
    }

    #[tokio::test]
    async fn deploy_without_artifact_fails_before_any_rpc() {
        let token = EthersToken::new(Address::zero(), wallet(), None).unwrap();
        let err = token.deploy(U256::from(1u64)).await.unwrap_err();
        assert!(matches!(err, ContractError::Artifact(_)));
    }
}
