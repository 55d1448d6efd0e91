//! Telliot Chain Access
//!
//! Read-only access to oracle contracts. A [`ContractGateway`] owns the
//! contract ABI and a node handle, connects lazily, and reports every
//! outcome as a [`ContractResponse`] value.

use std::path::{Path, PathBuf};
use std::time::Duration;

use ethers::abi::Abi;
use ethers::types::Address;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub mod gateway;
pub mod response;

pub use gateway::{ConnectionState, ContractGateway};
pub use response::ContractResponse;

/// Connection to a remote execution environment
#[async_trait::async_trait]
pub trait RpcNode: Send + Sync {
    /// Check that the node is reachable
    async fn connect(&self) -> bool;

    /// Execute a read-only call against `to`, returning the raw output
    async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Vec<u8>, ChainError>;

    /// Endpoint description used in responses and logs
    fn endpoint(&self) -> String;
}

const DEFAULT_TIMEOUT_MS: u64 = 10_000;

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

/// Configuration for a contract gateway
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChainConfig {
    pub rpc_url: String,
    pub contract_address: String,
    /// Path to an ABI JSON file, or the ABI itself inline
    pub abi: serde_json::Value,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    /// Directory relative ABI paths resolve against; set by `load`
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

impl ChainConfig {
    /// Load a configuration from a JSON file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ChainError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)?;
        let mut config: Self = serde_json::from_str(&text)?;
        config.base_dir = path.parent().map(Path::to_path_buf);
        Ok(config)
    }

    pub fn parse_address(&self) -> Result<Address, ChainError> {
        self.contract_address
            .parse()
            .map_err(|e| ChainError::Config(format!("invalid contract address {}: {}", self.contract_address, e)))
    }

    /// Resolve the contract ABI, reading it from disk when given as a path
    pub fn load_abi(&self) -> Result<Abi, ChainError> {
        match &self.abi {
            serde_json::Value::String(path) => {
                let path = match &self.base_dir {
                    Some(base) => base.join(path),
                    None => PathBuf::from(path),
                };
                let text = std::fs::read_to_string(path)?;
                Ok(serde_json::from_str(&text)?)
            }
            inline @ serde_json::Value::Array(_) => Ok(serde_json::from_value(inline.clone())?),
            other => Err(ChainError::Config(format!(
                "abi must be a file path or an array, got {}",
                other
            ))),
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Gateway construction factory
pub struct GatewayFactory;

impl GatewayFactory {
    /// Build a gateway backed by an HTTP JSON-RPC node
    pub fn create_gateway(config: &ChainConfig) -> Result<ContractGateway, ChainError> {
        let node = EthersNode::new(&config.rpc_url)?;
        Ok(ContractGateway::new(
            Some(Box::new(node)),
            config.parse_address()?,
            config.load_abi()?,
            config.timeout(),
        ))
    }
}

/// HTTP JSON-RPC node
pub mod evm {
    use super::*;
    use ethers::providers::{Http, Middleware, Provider};
    use ethers::types::transaction::eip2718::TypedTransaction;
    use ethers::types::TransactionRequest;
    use tracing::{debug, warn};

    pub struct EthersNode {
        provider: Provider<Http>,
        endpoint: String,
    }

    impl EthersNode {
        pub fn new(rpc_url: &str) -> Result<Self, ChainError> {
            let provider = Provider::<Http>::try_from(rpc_url)
                .map_err(|e| ChainError::Config(format!("invalid rpc url {}: {}", rpc_url, e)))?;
            Ok(Self {
                provider,
                endpoint: rpc_url.to_string(),
            })
        }
    }

    #[async_trait::async_trait]
    impl RpcNode for EthersNode {
        async fn connect(&self) -> bool {
            match self.provider.get_chainid().await {
                Ok(chain_id) => {
                    debug!("Connected to {} (chain id {})", self.endpoint, chain_id);
                    true
                }
                Err(e) => {
                    warn!("Node {} unreachable: {}", self.endpoint, e);
                    false
                }
            }
        }

        async fn call(&self, to: Address, calldata: Vec<u8>) -> Result<Vec<u8>, ChainError> {
            let tx: TypedTransaction = TransactionRequest::new().to(to).data(calldata).into();
            self.provider
                .call(&tx, None)
                .await
                .map(|output| output.to_vec())
                .map_err(|e| ChainError::Rpc(e.to_string()))
        }

        fn endpoint(&self) -> String {
            self.endpoint.clone()
        }
    }
}

pub use evm::EthersNode;

/// Error types
#[derive(Error, Debug)]
pub enum ChainError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("RPC error: {0}")]
    Rpc(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Failures reported by a [`ContractGateway`]
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    #[error("node is not instantiated")]
    NodeNotInitialized,

    #[error("unable to connect to {0}")]
    ConnectionFailed(String),

    #[error("function '{0}' not found in contract abi")]
    FunctionNotFound(String),

    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("invalid arguments for '{function}': {reason}")]
    InvalidArguments { function: String, reason: String },

    #[error("call failed: {0}")]
    CallFailed(String),
}
