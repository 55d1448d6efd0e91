//! Contract response envelope

use ethers::abi::Token;

use crate::GatewayError;

/// Outcome of a gateway operation.
///
/// A successful response never carries an error; a failed one always
/// carries both the error and its message.
#[derive(Debug, Clone, PartialEq)]
pub struct ContractResponse {
    ok: bool,
    result: Option<Vec<Token>>,
    error: Option<GatewayError>,
    error_msg: Option<String>,
    endpoint: Option<String>,
}

impl ContractResponse {
    /// Successful response, with decoded outputs when a call was made
    pub fn success(result: Option<Vec<Token>>) -> Self {
        Self {
            ok: true,
            result,
            error: None,
            error_msg: None,
            endpoint: None,
        }
    }

    pub fn failure(error: GatewayError) -> Self {
        Self {
            ok: false,
            result: None,
            error_msg: Some(error.to_string()),
            error: Some(error),
            endpoint: None,
        }
    }

    /// Replace the human-readable message of a failed response
    pub fn with_error_msg(mut self, msg: impl Into<String>) -> Self {
        if !self.ok {
            self.error_msg = Some(msg.into());
        }
        self
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = Some(endpoint.into());
        self
    }

    pub fn ok(&self) -> bool {
        self.ok
    }

    pub fn result(&self) -> Option<&[Token]> {
        self.result.as_deref()
    }

    pub fn error(&self) -> Option<&GatewayError> {
        self.error.as_ref()
    }

    pub fn error_msg(&self) -> Option<&str> {
        self.error_msg.as_deref()
    }

    pub fn endpoint(&self) -> Option<&str> {
        self.endpoint.as_deref()
    }

    /// Convert into a `Result`, yielding the decoded outputs (empty for connect)
    pub fn into_result(self) -> Result<Vec<Token>, GatewayError> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.result.unwrap_or_default()),
        }
    }
}
