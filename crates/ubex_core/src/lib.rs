pub mod config;
pub mod logging;

pub use config::{
    ContractSettings, ContractsSettings, RpcSettings, UbexConfig, WalletSettings, validate_url,
};
