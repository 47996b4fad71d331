//! Chain connection, signing wallet and raw log retrieval shared by the
//! contract facades.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use ethers::abi::{Abi, RawLog};
use ethers::middleware::SignerMiddleware;
use ethers::providers::{Http, Middleware, Provider};
use ethers::signers::{LocalWallet, Signer};
use ethers::types::{Address, Bytes, Filter, Log, ValueOrArray, H256};
use tracing::{debug, info};
use ubex_core::config::{RpcSettings, UbexConfig};

use crate::error::{ContractError, Result};
use crate::models::ContractEvent;

/// Provider with a local signer in front of it.
pub type ChainClient = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Highest topic position an `eth_getLogs` filter accepts.
const MAX_TOPICS: usize = 4;

// ---------------------------------------------------------------------------
// Wallet
// ---------------------------------------------------------------------------

/// A signing account and the connection transactions are sent through.
#[derive(Debug)]
pub struct Wallet {
    pub account: LocalWallet,
    pub connection: Arc<ChainClient>,
}

impl Wallet {
    /// Connect `account` to the node described by `rpc`. No request is made
    /// until the first call.
    pub fn connect(rpc: &RpcSettings, account: LocalWallet) -> Result<Self> {
        let url = url::Url::parse(&rpc.url)
            .map_err(|e| ContractError::Config(format!("invalid RPC URL {}: {e}", rpc.url)))?;
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(rpc.timeout_secs))
            .build()
            .map_err(|e| ContractError::Config(format!("failed to build HTTP client: {e}")))?;

        let provider = Provider::new(Http::new_with_client(url, http))
            .interval(Duration::from_millis(rpc.poll_interval_ms));
        let account = account.with_chain_id(rpc.chain_id);
        let connection = Arc::new(SignerMiddleware::new(provider, account.clone()));

        info!(address = ?account.address(), chain_id = rpc.chain_id, "wallet connected");
        Ok(Self {
            account,
            connection,
        })
    }

    /// Build the wallet from the configured raw key or keystore.
    ///
    /// A raw key (`UBEX_PRIVATE_KEY`) wins over `wallet.keystore_path`.
    pub fn from_config(config: &UbexConfig) -> Result<Self> {
        let account = match (&config.private_key, &config.wallet.keystore_path) {
            (Some(key), _) => key
                .trim()
                .parse::<LocalWallet>()
                .map_err(|e| ContractError::Config(format!("invalid private key: {e}")))?,
            (None, Some(path)) => {
                let password = config.keystore_password.as_deref().unwrap_or_default();
                LocalWallet::decrypt_keystore(path, password).map_err(|e| {
                    ContractError::Config(format!(
                        "failed to decrypt keystore {}: {e}",
                        path.display()
                    ))
                })?
            }
            (None, None) => {
                return Err(ContractError::Config(
                    "no signing key: set UBEX_PRIVATE_KEY or wallet.keystore_path".into(),
                ));
            }
        };
        Self::connect(&config.rpc, account)
    }

    pub fn address(&self) -> Address {
        self.account.address()
    }
}

// ---------------------------------------------------------------------------
// Contract handle
// ---------------------------------------------------------------------------

/// Source of decoded contract logs.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Logs of the contract matching `topics` (one set per position, an empty
    /// set matches anything) from `from_block` onwards, in chain order.
    async fn events_by_topics(
        &self,
        topics: Vec<Vec<H256>>,
        from_block: u64,
    ) -> Result<Vec<ContractEvent>>;
}

/// Address + wallet of one deployed contract, plus the ABI its logs are
/// decoded with.
#[derive(Debug)]
pub struct ContractHandle {
    pub address: Address,
    pub wallet: Arc<Wallet>,
    events_abi: Option<Abi>,
}

impl ContractHandle {
    pub fn new(address: Address, wallet: Arc<Wallet>) -> Self {
        Self {
            address,
            wallet,
            events_abi: None,
        }
    }

    /// Register the ABI used to name and split this contract's logs.
    pub fn init_events(&mut self, abi: Abi) {
        self.events_abi = Some(abi);
    }

    fn events_abi(&self) -> Result<&Abi> {
        self.events_abi
            .as_ref()
            .ok_or(ContractError::NotInitialized("event abi"))
    }
}

#[async_trait]
impl EventSource for ContractHandle {
    async fn events_by_topics(
        &self,
        topics: Vec<Vec<H256>>,
        from_block: u64,
    ) -> Result<Vec<ContractEvent>> {
        let abi = self.events_abi()?;
        let filter = build_filter(self.address, topics, from_block)?;

        debug!(contract = ?self.address, from_block, "eth_getLogs");
        let logs = self
            .wallet
            .connection
            .get_logs(&filter)
            .await
            .map_err(ContractError::chain)?;
        debug!(contract = ?self.address, count = logs.len(), "logs received");

        logs.iter().map(|log| decode_log(abi, log)).collect()
    }
}

/// Log filter for `address` with one topic set per position.
pub fn build_filter(address: Address, topics: Vec<Vec<H256>>, from_block: u64) -> Result<Filter> {
    if topics.len() > MAX_TOPICS {
        return Err(ContractError::InvalidArgument(format!(
            "at most {MAX_TOPICS} topic positions can be filtered, got {}",
            topics.len()
        )));
    }

    let mut filter = Filter::new().address(address).from_block(from_block);
    for (position, set) in topics.into_iter().enumerate() {
        if set.is_empty() {
            continue;
        }
        let topic = ValueOrArray::Array(set.into_iter().map(Some).collect::<Vec<_>>());
        filter = match position {
            0 => filter.topic0(topic),
            1 => filter.topic1(topic),
            2 => filter.topic2(topic),
            _ => filter.topic3(topic),
        };
    }
    Ok(filter)
}

/// Name a raw log by its signature topic and split its parameters into one
/// ABI word each.
///
/// A signature the ABI does not know is named by its hex topic, with the
/// remaining topics and the data words as raw arguments.
pub fn decode_log(abi: &Abi, log: &Log) -> Result<ContractEvent> {
    let signature = log
        .topics
        .first()
        .copied()
        .ok_or_else(|| ContractError::UndecodableLog("log has no topics".into()))?;

    let (name, raw_args) = match abi.events().find(|event| event.signature() == signature) {
        Some(event) => {
            let parsed = event
                .parse_log(RawLog {
                    topics: log.topics.clone(),
                    data: log.data.to_vec(),
                })
                .map_err(|e| ContractError::MalformedEvent {
                    name: event.name.clone(),
                    reason: e.to_string(),
                })?;
            let raw_args = parsed
                .params
                .into_iter()
                .map(|param| Bytes::from(ethers::abi::encode(&[param.value])))
                .collect();
            (event.name.clone(), raw_args)
        }
        None => {
            let raw_args = log.topics[1..]
                .iter()
                .map(|topic| Bytes::from(topic.as_bytes().to_vec()))
                .chain(log.data.chunks(32).map(|word| Bytes::from(word.to_vec())))
                .collect();
            (format!("{signature:?}"), raw_args)
        }
    };

    Ok(ContractEvent {
        name,
        block_number: log.block_number.map(|n| n.as_u64()),
        transaction_hash: log.transaction_hash,
        log_index: log.log_index.map(|i| i.low_u64()),
        raw_args,
        args: None,
    })
}
