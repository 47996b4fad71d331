use std::sync::Arc;

use ethers::types::{Address, H256, U256};
use tracing::{debug, info, warn};
use ubex_core::config::ContractSettings;

use crate::artifacts::ContractArtifact;
use crate::bindings::{CrowdsaleBinding, EthersCrowdsale};
use crate::error::{ContractError, Result};
use crate::ethereum::{ContractHandle, EventSource, Wallet};
use crate::models::{
    ContractEvent, CrowdsaleDeployParams, CrowdsaleStatus, Deployment, EventArgs, EventOutcome,
    TokenPaidEventArgs, TokenPurchaseEventArgs,
};
use crate::numeric::{
    address_topic, checksummed, parse_address, parse_amount, word_to_address, word_to_decimal,
};
use crate::registry::configured_address;
use crate::token::Token;

const TOKEN_PAID: &str = "TokenPaid";
const TOKEN_PURCHASE: &str = "TokenPurchase";

/// Raw slots both purchase events carry: purchaser, beneficiary, wei, and
/// either the creation time or the token amount.
const PURCHASE_EVENT_SLOTS: usize = 4;

/// The crowdsale contract.
pub struct Crowdsale {
    address: Address,
    start_block: u64,
    binding: Arc<dyn CrowdsaleBinding>,
    events: Arc<dyn EventSource>,
}

impl Crowdsale {
    pub fn new(
        address: Address,
        start_block: u64,
        binding: Arc<dyn CrowdsaleBinding>,
        events: Arc<dyn EventSource>,
    ) -> Self {
        Self {
            address,
            start_block,
            binding,
            events,
        }
    }

    /// Bind to the configured crowdsale address over `wallet`'s connection.
    pub fn init(settings: &ContractSettings, wallet: Arc<Wallet>) -> Result<Self> {
        let address = configured_address("crowdsale", &settings.address)?;
        let artifact = settings
            .artifact
            .as_deref()
            .map(ContractArtifact::load)
            .transpose()?;
        let binding = EthersCrowdsale::new(address, wallet.clone(), artifact)?;

        let mut handle = ContractHandle::new(address, wallet);
        handle.init_events(binding.events_abi());

        info!(?address, start_block = settings.start_block, "crowdsale contract initialized");
        Ok(Self::new(
            address,
            settings.start_block,
            Arc::new(binding),
            Arc::new(handle),
        ))
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn start_block(&self) -> u64 {
        self.start_block
    }

    /// Deploy a new crowdsale selling `token` at `params.token_rate` tokens
    /// per wei, forwarding funds to `params.wallet_address`.
    pub async fn deploy(&self, token: &Token, params: &CrowdsaleDeployParams) -> Result<Deployment> {
        let rate = parse_amount(&params.token_rate).map_err(|_| {
            ContractError::InvalidArgument(format!("wrong TokenRate provided: {}", params.token_rate))
        })?;
        let wallet = parse_address(&params.wallet_address)?;
        let token_address = token.address();
        if token_address.is_zero() {
            return Err(ContractError::NotInitialized("token address"));
        }

        debug!(%rate, ?wallet, token = ?token_address, "deploying crowdsale");
        self.binding.deploy(rate, wallet, token_address).await
    }

    /// Amount contributed by `address`.
    pub async fn balance(&self, address: &str) -> Result<U256> {
        let contributor = parse_address(address)?;
        self.binding.balances(contributor).await
    }

    /// Current counters. Calls are issued in order and the first failure is
    /// returned without issuing the rest.
    pub async fn status(&self) -> Result<CrowdsaleStatus> {
        let wei_raised = self.binding.wei_raised().await?;
        let rate = self.binding.rate().await?;
        let tokens_issued = self.binding.tokens_issued().await?;

        Ok(CrowdsaleStatus {
            address: checksummed(self.address),
            wei_raised: wei_raised.to_string(),
            rate: rate.to_string(),
            tokens_issued: tokens_issued.to_string(),
        })
    }

    /// Purchase events whose purchaser is one of `addresses` (all purchasers
    /// when empty), with typed arguments.
    ///
    /// Fails as a whole if any returned log is not a `TokenPaid` or
    /// `TokenPurchase` event.
    pub async fn events(&self, addresses: &[String]) -> Result<Vec<ContractEvent>> {
        let events = self.fetch(addresses).await?;

        let mut typed = Vec::with_capacity(events.len());
        for mut event in events {
            match typed_args(&event)? {
                Some(args) => {
                    event.args = Some(args);
                    typed.push(event);
                }
                None => {
                    warn!(name = %event.name, crowdsale = ?self.address, "unknown crowdsale event");
                    return Err(ContractError::UnknownEvent(event.name));
                }
            }
        }
        Ok(typed)
    }

    /// Same query as [`Crowdsale::events`], but every log is returned, tagged
    /// as known (with typed arguments) or unknown.
    pub async fn classify_events(&self, addresses: &[String]) -> Result<Vec<EventOutcome>> {
        let events = self.fetch(addresses).await?;

        events
            .into_iter()
            .map(|mut event| {
                Ok(match typed_args(&event)? {
                    Some(args) => {
                        event.args = Some(args);
                        EventOutcome::Known(event)
                    }
                    None => EventOutcome::Unknown(event),
                })
            })
            .collect()
    }

    async fn fetch(&self, addresses: &[String]) -> Result<Vec<ContractEvent>> {
        let purchasers = addresses
            .iter()
            .map(|address| parse_address(address).map(address_topic))
            .collect::<Result<Vec<H256>>>()?;

        debug!(
            crowdsale = ?self.address,
            purchasers = purchasers.len(),
            from_block = self.start_block,
            "fetching crowdsale events"
        );
        // Position 0 (event signature) stays open; position 1 is the purchaser.
        self.events
            .events_by_topics(vec![Vec::new(), purchasers], self.start_block)
            .await
    }
}

/// Typed arguments for the purchase events, `None` for any other event.
pub fn typed_args(event: &ContractEvent) -> Result<Option<EventArgs>> {
    let args = match event.name.as_str() {
        TOKEN_PAID => {
            let slots = purchase_slots(event)?;
            EventArgs::TokenPaid(TokenPaidEventArgs {
                purchaser: checksummed(word_to_address(slots[0])),
                beneficiary: checksummed(word_to_address(slots[1])),
                wei_amount: word_to_decimal(slots[2]),
                created: word_to_decimal(slots[3]),
            })
        }
        TOKEN_PURCHASE => {
            let slots = purchase_slots(event)?;
            EventArgs::TokenPurchase(TokenPurchaseEventArgs {
                purchaser: checksummed(word_to_address(slots[0])),
                beneficiary: checksummed(word_to_address(slots[1])),
                wei_amount: word_to_decimal(slots[2]),
                tokens_amount: word_to_decimal(slots[3]),
            })
        }
        _ => return Ok(None),
    };
    Ok(Some(args))
}

fn purchase_slots(event: &ContractEvent) -> Result<[&[u8]; PURCHASE_EVENT_SLOTS]> {
    match event.raw_args.as_slice() {
        [purchaser, beneficiary, wei, last, ..] => {
            Ok([&purchaser[..], &beneficiary[..], &wei[..], &last[..]])
        }
        short => Err(ContractError::MalformedEvent {
            name: event.name.clone(),
            reason: format!(
                "expected {PURCHASE_EVENT_SLOTS} arguments, got {}",
                short.len()
            ),
        }),
    }
}
