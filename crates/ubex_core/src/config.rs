use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::info;

// ---------------------------------------------------------------------------
// Environment variables
// ---------------------------------------------------------------------------

const ENV_PRIVATE_KEY: &str = "UBEX_PRIVATE_KEY";
const ENV_KEYSTORE_PASSWORD: &str = "UBEX_KEYSTORE_PASSWORD";
const ENV_RPC_URL: &str = "UBEX_RPC_URL";
const ENV_CHAIN_ID: &str = "UBEX_CHAIN_ID";
const ENV_TOKEN_ADDRESS: &str = "UBEX_TOKEN_ADDRESS";
const ENV_CROWDSALE_ADDRESS: &str = "UBEX_CROWDSALE_ADDRESS";
const ENV_TOKEN_START_BLOCK: &str = "UBEX_TOKEN_START_BLOCK";
const ENV_CROWDSALE_START_BLOCK: &str = "UBEX_CROWDSALE_START_BLOCK";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_POLL_INTERVAL_MS: u64 = 7_000;

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

/// JSON-RPC endpoint of the chain node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RpcSettings {
    pub url: String,
    pub chain_id: u64,
    pub timeout_secs: u64,
    /// How often pending transactions and filters are polled.
    pub poll_interval_ms: u64,
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            url: "http://localhost:8545".into(),
            chain_id: 1,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            poll_interval_ms: DEFAULT_POLL_INTERVAL_MS,
        }
    }
}

/// Where the signing account comes from when no raw private key is supplied.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WalletSettings {
    /// Path to an Ethereum V3 JSON keystore.
    pub keystore_path: Option<PathBuf>,
}

/// A single deployed contract.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractSettings {
    /// Hex address of the deployed contract. Empty until the contract is deployed.
    pub address: String,
    /// First block scanned when querying the contract's event logs.
    pub start_block: u64,
    /// Compiled artifact (ABI + bytecode), only needed to deploy.
    pub artifact: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractsSettings {
    pub token: ContractSettings,
    pub crowdsale: ContractSettings,
}

// ---------------------------------------------------------------------------
// UbexConfig
// ---------------------------------------------------------------------------

/// Application configuration stored at `~/.ubex/config.json`.
///
/// The signing key and keystore password are **never** written to the JSON
/// file. They are read from `UBEX_PRIVATE_KEY` / `UBEX_KEYSTORE_PASSWORD` by
/// [`UbexConfig::apply_env_overrides`].
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct UbexConfig {
    #[serde(skip)]
    pub private_key: Option<String>,
    #[serde(skip)]
    pub keystore_password: Option<String>,

    pub rpc: RpcSettings,
    pub wallet: WalletSettings,
    pub contracts: ContractsSettings,
    pub log_level: String,
}

impl Default for UbexConfig {
    fn default() -> Self {
        Self {
            private_key: None,
            keystore_password: None,
            rpc: RpcSettings::default(),
            wallet: WalletSettings::default(),
            contracts: ContractsSettings::default(),
            log_level: "info".into(),
        }
    }
}

impl fmt::Debug for UbexConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UbexConfig")
            .field("private_key", &self.private_key.as_ref().map(|_| "<redacted>"))
            .field(
                "keystore_password",
                &self.keystore_password.as_ref().map(|_| "<redacted>"),
            )
            .field("rpc", &self.rpc)
            .field("wallet", &self.wallet)
            .field("contracts", &self.contracts)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl UbexConfig {
    /// Returns the base config directory: `~/.ubex/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".ubex"))
    }

    /// Returns the config file path: `~/.ubex/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.ubex/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        let dirs = [Self::base_dir()?, Self::logs_dir()?];
        for dir in &dirs {
            if !dir.exists() {
                std::fs::create_dir_all(dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from the default location, or creates it with defaults.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        Self::load_from_path(&path)
    }

    /// Load config from a specific file path, writing the defaults there if
    /// the file does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path (secrets are excluded via `#[serde(skip)]`).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create directory: {}", parent.display())
                })?;
            }
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply `UBEX_*` environment variables on top of the file values.
    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(key) = get(ENV_PRIVATE_KEY) {
            self.private_key = Some(key);
        }
        if let Some(password) = get(ENV_KEYSTORE_PASSWORD) {
            self.keystore_password = Some(password);
        }
        if let Some(url) = get(ENV_RPC_URL) {
            self.rpc.url = url;
        }
        if let Some(chain_id) = get(ENV_CHAIN_ID) {
            self.rpc.chain_id = chain_id
                .parse()
                .with_context(|| format!("{ENV_CHAIN_ID} is not a number: {chain_id}"))?;
        }
        if let Some(address) = get(ENV_TOKEN_ADDRESS) {
            self.contracts.token.address = address;
        }
        if let Some(address) = get(ENV_CROWDSALE_ADDRESS) {
            self.contracts.crowdsale.address = address;
        }
        if let Some(block) = get(ENV_TOKEN_START_BLOCK) {
            self.contracts.token.start_block = block
                .parse()
                .with_context(|| format!("{ENV_TOKEN_START_BLOCK} is not a number: {block}"))?;
        }
        if let Some(block) = get(ENV_CROWDSALE_START_BLOCK) {
            self.contracts.crowdsale.start_block = block.parse().with_context(|| {
                format!("{ENV_CROWDSALE_START_BLOCK} is not a number: {block}")
            })?;
        }
        Ok(())
    }

    /// Reject settings that can never produce a working connection.
    pub fn validate(&self) -> Result<()> {
        if !validate_url(&self.rpc.url) {
            anyhow::bail!("invalid RPC URL: {}", self.rpc.url);
        }
        if self.rpc.timeout_secs == 0 {
            anyhow::bail!("rpc.timeout_secs must be greater than zero");
        }
        Ok(())
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}
