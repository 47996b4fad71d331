use std::path::Path;

use ethers::abi::Abi;
use ethers::types::Bytes;
use serde::Deserialize;
use tracing::debug;

use crate::error::{ContractError, Result};

/// Compiled contract: ABI plus creation bytecode.
#[derive(Debug, Clone)]
pub struct ContractArtifact {
    pub abi: Abi,
    pub bytecode: Bytes,
}

/// Hardhat writes `"bytecode": "0x.."`, Foundry writes `"bytecode": { "object": "0x.." }`.
#[derive(Deserialize)]
#[serde(untagged)]
enum RawBytecode {
    Hex(Bytes),
    Object { object: Bytes },
}

#[derive(Deserialize)]
struct RawArtifact {
    abi: Abi,
    bytecode: RawBytecode,
}

impl ContractArtifact {
    /// Parse a Hardhat or Foundry artifact.
    pub fn from_json(json: &str) -> Result<Self> {
        let raw: RawArtifact = serde_json::from_str(json)
            .map_err(|e| ContractError::Artifact(format!("unreadable artifact: {e}")))?;
        let bytecode = match raw.bytecode {
            RawBytecode::Hex(bytes) | RawBytecode::Object { object: bytes } => bytes,
        };
        if bytecode.is_empty() {
            return Err(ContractError::Artifact(
                "artifact has no creation bytecode (abstract contract or interface?)".into(),
            ));
        }
        Ok(Self {
            abi: raw.abi,
            bytecode,
        })
    }

    /// Read and parse an artifact file.
    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            ContractError::Artifact(format!("failed to read {}: {e}", path.display()))
        })?;
        let artifact = Self::from_json(&json)?;
        debug!(path = %path.display(), bytecode_len = artifact.bytecode.len(), "artifact loaded");
        Ok(artifact)
    }

    /// Number of constructor inputs declared by the ABI (0 without a constructor).
    pub fn constructor_arity(&self) -> usize {
        self.abi
            .constructor
            .as_ref()
            .map_or(0, |constructor| constructor.inputs.len())
    }
}
