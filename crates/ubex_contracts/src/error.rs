use serde::{Deserialize, Serialize};
use thiserror::Error;

pub type Result<T, E = ContractError> = std::result::Result<T, E>;

/// Errors surfaced by the contract facades and their chain plumbing.
#[derive(Error, Debug)]
pub enum ContractError {
    #[error("{0} is not initialized")]
    NotInitialized(&'static str),

    #[error("{0} is already initialized")]
    AlreadyInitialized(&'static str),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("failed to instantiate a {contract} contract: {reason}")]
    Binding {
        contract: &'static str,
        reason: String,
    },

    #[error("artifact error: {0}")]
    Artifact(String),

    #[error("unknown event type: {0}")]
    UnknownEvent(String),

    #[error("malformed {name} event: {reason}")]
    MalformedEvent { name: String, reason: String },

    #[error("undecodable log: {0}")]
    UndecodableLog(String),

    #[error("chain call failed: {0}")]
    Chain(String),
}

/// Broad classification used for logging and exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCategory {
    /// Bad input from the caller (malformed number or address).
    UserError,
    /// The node, the contract, or the data it returned.
    ChainError,
    /// Missing or invalid configuration, artifacts or initialization order.
    ConfigError,
}

impl ContractError {
    /// Wrap an error coming out of the chain client.
    pub fn chain(err: impl std::fmt::Display) -> Self {
        Self::Chain(err.to_string())
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidArgument(_) => ErrorCategory::UserError,
            Self::UnknownEvent(_)
            | Self::MalformedEvent { .. }
            | Self::UndecodableLog(_)
            | Self::Chain(_) => ErrorCategory::ChainError,
            Self::NotInitialized(_)
            | Self::AlreadyInitialized(_)
            | Self::Config(_)
            | Self::Binding { .. }
            | Self::Artifact(_) => ErrorCategory::ConfigError,
        }
    }
}
