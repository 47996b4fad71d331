use ethers::types::{Address, Bytes, TxHash, H256};
use serde::{Deserialize, Serialize};

/// Result of a submitted contract-creation transaction.
///
/// The address is derived from the sender and nonce, so it is known before the
/// transaction is mined.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deployment {
    pub address: Address,
    pub tx_hash: TxHash,
}

/// Constructor inputs of a crowdsale, as supplied by a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsaleDeployParams {
    /// Tokens per wei, in any radix accepted by [`crate::numeric::parse_amount`].
    pub token_rate: String,
    /// Address that receives the raised funds.
    pub wallet_address: String,
}

/// Snapshot of a crowdsale's counters, amounts rendered in decimal.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrowdsaleStatus {
    pub address: String,
    pub wei_raised: String,
    pub rate: String,
    pub tokens_issued: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPaidEventArgs {
    pub purchaser: String,
    pub beneficiary: String,
    pub wei_amount: String,
    pub created: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPurchaseEventArgs {
    pub purchaser: String,
    pub beneficiary: String,
    pub wei_amount: String,
    pub tokens_amount: String,
}

/// Typed payload of a recognised crowdsale event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EventArgs {
    TokenPaid(TokenPaidEventArgs),
    TokenPurchase(TokenPurchaseEventArgs),
}

/// A decoded contract log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    pub name: String,
    pub block_number: Option<u64>,
    pub transaction_hash: Option<H256>,
    pub log_index: Option<u64>,
    /// One 32-byte ABI word per event parameter, in declaration order.
    pub raw_args: Vec<Bytes>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub args: Option<EventArgs>,
}

/// Per-log result of a lenient event query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EventOutcome {
    Known(ContractEvent),
    Unknown(ContractEvent),
}

impl EventOutcome {
    pub fn event(&self) -> &ContractEvent {
        match self {
            Self::Known(event) | Self::Unknown(event) => event,
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Self::Known(_))
    }
}
