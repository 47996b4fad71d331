// Token + crowdsale contract facades

pub mod artifacts;
pub mod bindings;
pub mod crowdsale;
pub mod error;
pub mod ethereum;
pub mod models;
pub mod numeric;
pub mod registry;
pub mod token;

// Re-export primary types for convenient access.
pub use artifacts::ContractArtifact;
pub use bindings::{CrowdsaleBinding, EthersCrowdsale, EthersToken, TokenBinding};
pub use crowdsale::Crowdsale;
pub use error::{ContractError, ErrorCategory, Result};
pub use ethereum::{ChainClient, ContractHandle, EventSource, Wallet};
pub use models::{
    ContractEvent, CrowdsaleDeployParams, CrowdsaleStatus, Deployment, EventArgs, EventOutcome,
    TokenPaidEventArgs, TokenPurchaseEventArgs,
};
pub use registry::ContractRegistry;
pub use token::Token;
