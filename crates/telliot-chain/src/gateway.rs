//! Contract Gateway
//!
//! Lazily connected, read-only view of one contract. The gateway is a
//! two-state machine: `read` on a disconnected gateway makes exactly one
//! implicit connection attempt and fails with a response if that attempt
//! fails. Every network step is bounded by the gateway's timeout.

use std::collections::BTreeMap;
use std::time::Duration;

use ethers::abi::{Abi, Function, Token};
use ethers::types::Address;
use ethers::utils::to_checksum;
use telliot_query::QueryId;
use tracing::{debug, info, warn};

use crate::{ContractResponse, GatewayError, RpcNode};

/// Connection state of a gateway
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connected,
}

/// Read-only gateway to a deployed contract
pub struct ContractGateway {
    node: Option<Box<dyn RpcNode>>,
    address: Address,
    checksum_address: String,
    abi: Abi,
    timeout: Duration,
    state: ConnectionState,
}

impl ContractGateway {
    /// Create a disconnected gateway. A missing node makes every operation
    /// fail with `NodeNotInitialized`.
    pub fn new(node: Option<Box<dyn RpcNode>>, address: Address, abi: Abi, timeout: Duration) -> Self {
        Self {
            node,
            checksum_address: to_checksum(&address, None),
            address,
            abi,
            timeout,
            state: ConnectionState::Disconnected,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn address(&self) -> Address {
        self.address
    }

    /// EIP-55 checksummed contract address
    pub fn checksum_address(&self) -> &str {
        &self.checksum_address
    }

    pub fn abi(&self) -> &Abi {
        &self.abi
    }

    pub fn has_function(&self, name: &str) -> bool {
        self.abi.functions.contains_key(name)
    }

    /// Check that the node is reachable and move to `Connected`
    pub async fn connect(&mut self) -> ContractResponse {
        let Some(node) = self.node.as_ref() else {
            return ContractResponse::failure(GatewayError::NodeNotInitialized);
        };
        let endpoint = node.endpoint();

        let outcome = tokio::time::timeout(self.timeout, node.connect()).await;
        match outcome {
            Ok(true) => {
                info!("Connected to {} at {}", self.checksum_address, endpoint);
                self.state = ConnectionState::Connected;
                ContractResponse::success(None).with_endpoint(endpoint)
            }
            Ok(false) => {
                warn!("Node {} is not connected", endpoint);
                ContractResponse::failure(GatewayError::ConnectionFailed(endpoint.clone())).with_endpoint(endpoint)
            }
            Err(_) => {
                warn!("Connecting to {} timed out after {:?}", endpoint, self.timeout);
                ContractResponse::failure(GatewayError::Timeout(self.timeout)).with_endpoint(endpoint)
            }
        }
    }

    /// Call a read-only contract function with named arguments.
    ///
    /// Unnamed ABI inputs are addressed by their position (`"0"`, `"1"`, ...).
    pub async fn read(&mut self, function_name: &str, args: &BTreeMap<String, Token>) -> ContractResponse {
        let (function, calldata) = match self.prepare(function_name, args) {
            Ok(prepared) => prepared,
            Err(error) => return self.fail(error),
        };

        if self.state == ConnectionState::Disconnected {
            debug!("Gateway disconnected, connecting before {}", function_name);
            let connected = self.connect().await;
            if !connected.ok() {
                return connected;
            }
        }

        self.call(&function, calldata).await
    }

    /// Call a function whose single input is a query id, such as
    /// `getCurrentValue(bytes32)`
    pub async fn read_query(&mut self, function_name: &str, query_id: QueryId) -> ContractResponse {
        let input = match self.abi.function(function_name) {
            Ok(function) if function.inputs.len() == 1 => input_key(0, &function.inputs[0].name),
            Ok(function) => {
                return self.fail(GatewayError::InvalidArguments {
                    function: function_name.to_string(),
                    reason: format!("expected a single query id input, found {}", function.inputs.len()),
                })
            }
            Err(_) => return self.fail(GatewayError::FunctionNotFound(function_name.to_string())),
        };

        let mut args = BTreeMap::new();
        args.insert(input, Token::FixedBytes(query_id.as_bytes().to_vec()));
        self.read(function_name, &args).await
    }

    fn prepare(&self, function_name: &str, args: &BTreeMap<String, Token>) -> Result<(Function, Vec<u8>), GatewayError> {
        let function = self
            .abi
            .function(function_name)
            .map_err(|_| GatewayError::FunctionNotFound(function_name.to_string()))?
            .clone();
        let invalid = |reason: String| GatewayError::InvalidArguments {
            function: function_name.to_string(),
            reason,
        };

        let keys: Vec<String> = function
            .inputs
            .iter()
            .enumerate()
            .map(|(index, param)| input_key(index, &param.name))
            .collect();
        if let Some(unexpected) = args.keys().find(|name| !keys.contains(name)) {
            return Err(invalid(format!("unexpected argument '{}'", unexpected)));
        }

        let tokens = keys
            .iter()
            .map(|key| {
                args.get(key)
                    .cloned()
                    .ok_or_else(|| invalid(format!("missing argument '{}'", key)))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let calldata = function.encode_input(&tokens).map_err(|e| invalid(e.to_string()))?;
        Ok((function, calldata))
    }

    async fn call(&mut self, function: &Function, calldata: Vec<u8>) -> ContractResponse {
        let Some(node) = self.node.as_ref() else {
            return ContractResponse::failure(GatewayError::NodeNotInitialized);
        };
        let endpoint = node.endpoint();

        let outcome = tokio::time::timeout(self.timeout, node.call(self.address, calldata)).await;
        let output = match outcome {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!("Call to {} failed: {}", function.name, e);
                self.state = ConnectionState::Disconnected;
                return ContractResponse::failure(GatewayError::CallFailed(e.to_string())).with_endpoint(endpoint);
            }
            Err(_) => {
                warn!("Call to {} timed out after {:?}", function.name, self.timeout);
                self.state = ConnectionState::Disconnected;
                return ContractResponse::failure(GatewayError::Timeout(self.timeout)).with_endpoint(endpoint);
            }
        };

        match function.decode_output(&output) {
            Ok(tokens) => {
                debug!("{} returned {} values", function.name, tokens.len());
                ContractResponse::success(Some(tokens)).with_endpoint(endpoint)
            }
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                ContractResponse::failure(GatewayError::CallFailed(format!(
                    "undecodable output from {}: {}",
                    function.name, e
                )))
                .with_endpoint(endpoint)
            }
        }
    }

    fn fail(&self, error: GatewayError) -> ContractResponse {
        let response = ContractResponse::failure(error);
        match &self.node {
            Some(node) => response.with_endpoint(node.endpoint()),
            None => response,
        }
    }
}

fn input_key(index: usize, name: &str) -> String {
    if name.is_empty() {
        index.to_string()
    } else {
        name.to_string()
    }
}
