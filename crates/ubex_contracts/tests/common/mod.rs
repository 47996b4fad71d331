#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use ethers::abi::Abi;
use ethers::signers::LocalWallet;
use ethers::types::{Address, Bytes, Log, H256, U256};
use ubex_contracts::ethereum::decode_log;
use ubex_contracts::{
    ContractError, ContractEvent, Crowdsale, CrowdsaleBinding, Deployment, EthersCrowdsale,
    EventSource, Result, Token, TokenBinding, Wallet,
};
use ubex_core::config::RpcSettings;

// First account of the Hardhat/Anvil development mnemonic.
pub const DEV_KEY: &str = "ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

/// Wallet pointed at the default local node. Nothing is sent until a call is made.
pub fn dev_wallet() -> Arc<Wallet> {
    let account: LocalWallet = DEV_KEY.parse().unwrap();
    Arc::new(Wallet::connect(&RpcSettings::default(), account).unwrap())
}

/// Event ABI the crowdsale installs when no artifact is configured.
pub fn crowdsale_abi() -> Abi {
    EthersCrowdsale::new(Address::zero(), dev_wallet(), None)
        .unwrap()
        .events_abi()
}

pub fn deployment(byte: u8) -> Deployment {
    Deployment {
        address: Address::repeat_byte(byte),
        tx_hash: H256::repeat_byte(byte),
    }
}

/// Left-pad `bytes` into one 32-byte ABI word.
pub fn word(bytes: &[u8]) -> Bytes {
    let mut padded = vec![0u8; 32 - bytes.len()];
    padded.extend_from_slice(bytes);
    Bytes::from(padded)
}

pub fn address_word(address: Address) -> Bytes {
    word(address.as_bytes())
}

pub fn u256_word(value: u64) -> Bytes {
    let mut buf = [0u8; 32];
    U256::from(value).to_big_endian(&mut buf);
    Bytes::from(buf.to_vec())
}

pub fn raw_event(name: &str, block: u64, raw_args: Vec<Bytes>) -> ContractEvent {
    ContractEvent {
        name: name.to_string(),
        block_number: Some(block),
        transaction_hash: Some(H256::from_low_u64_be(block)),
        log_index: Some(0),
        raw_args,
        args: None,
    }
}

pub fn purchase(name: &str, block: u64, purchaser: Address, wei: u64, last: u64) -> ContractEvent {
    raw_event(
        name,
        block,
        vec![
            address_word(purchaser),
            address_word(Address::repeat_byte(0xbb)),
            u256_word(wei),
            u256_word(last),
        ],
    )
}

// ---------------------------------------------------------------------------
// Token double
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct RecordingToken {
    pub deployed: Mutex<Vec<U256>>,
    pub balance_queries: Mutex<Vec<Address>>,
    pub balance: U256,
}

#[async_trait]
impl TokenBinding for RecordingToken {
    async fn deploy(&self, total_supply: U256) -> Result<Deployment> {
        self.deployed.lock().unwrap().push(total_supply);
        Ok(deployment(0x70))
    }

    async fn balance_of(&self, owner: Address) -> Result<U256> {
        self.balance_queries.lock().unwrap().push(owner);
        Ok(self.balance)
    }
}

pub fn token_with(binding: Arc<RecordingToken>) -> Token {
    Token::new(Address::repeat_byte(0x10), binding)
}

// ---------------------------------------------------------------------------
// Crowdsale double
// ---------------------------------------------------------------------------

/// Counter reads of a crowdsale, in the order `status` issues them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    WeiRaised,
    Rate,
    TokensIssued,
}

#[derive(Default)]
pub struct ScriptedCrowdsale {
    pub deployed: Mutex<Vec<(U256, Address, Address)>>,
    pub calls: AtomicUsize,
    pub issued: Mutex<Vec<Counter>>,
    pub fail_on: Option<Counter>,
    pub wei_raised: U256,
    pub rate: U256,
    pub tokens_issued: U256,
    pub balance: U256,
}

impl ScriptedCrowdsale {
    fn read(&self, counter: Counter, value: U256) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.issued.lock().unwrap().push(counter);
        if self.fail_on == Some(counter) {
            return Err(ContractError::chain(format!("{counter:?} reverted")));
        }
        Ok(value)
    }
}

#[async_trait]
impl CrowdsaleBinding for ScriptedCrowdsale {
    async fn deploy(&self, rate: U256, wallet: Address, token: Address) -> Result<Deployment> {
        self.deployed.lock().unwrap().push((rate, wallet, token));
        Ok(deployment(0xc5))
    }

    async fn balances(&self, _contributor: Address) -> Result<U256> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.balance)
    }

    async fn wei_raised(&self) -> Result<U256> {
        self.read(Counter::WeiRaised, self.wei_raised)
    }

    async fn rate(&self) -> Result<U256> {
        self.read(Counter::Rate, self.rate)
    }

    async fn tokens_issued(&self) -> Result<U256> {
        self.read(Counter::TokensIssued, self.tokens_issued)
    }
}

// ---------------------------------------------------------------------------
// Event source double
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct CannedEvents {
    pub events: Vec<ContractEvent>,
    pub queries: Mutex<Vec<(Vec<Vec<H256>>, u64)>>,
    pub fail: bool,
}

impl CannedEvents {
    pub fn with(events: Vec<ContractEvent>) -> Self {
        Self {
            events,
            ..Default::default()
        }
    }
}

#[async_trait]
impl EventSource for CannedEvents {
    async fn events_by_topics(
        &self,
        topics: Vec<Vec<H256>>,
        from_block: u64,
    ) -> Result<Vec<ContractEvent>> {
        self.queries.lock().unwrap().push((topics, from_block));
        if self.fail {
            return Err(ContractError::chain("connection refused"));
        }
        Ok(self.events.clone())
    }
}

/// Raw logs decoded with a real ABI, the way the live handle does it.
pub struct DecodingEvents {
    pub abi: Abi,
    pub logs: Vec<Log>,
}

#[async_trait]
impl EventSource for DecodingEvents {
    async fn events_by_topics(
        &self,
        _topics: Vec<Vec<H256>>,
        _from_block: u64,
    ) -> Result<Vec<ContractEvent>> {
        self.logs.iter().map(|log| decode_log(&self.abi, log)).collect()
    }
}

pub const CROWDSALE_START_BLOCK: u64 = 4_200_000;

pub fn crowdsale_with(binding: Arc<ScriptedCrowdsale>, events: Arc<dyn EventSource>) -> Crowdsale {
    Crowdsale::new(
        Address::repeat_byte(0xc0),
        CROWDSALE_START_BLOCK,
        binding,
        events,
    )
}
