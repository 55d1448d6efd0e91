//! Answer value types
//!
//! Describes how the answer to a query is encoded when it is reported,
//! and encodes/decodes answers in that shape.

use ethers::abi;
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};

use crate::abi::{format_decimal, scale_decimal, AbiType, AbiValue};
use crate::error::QueryError;

const ANSWER: &str = "value";

/// Expected shape of a query answer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ValueType {
    abi_type: AbiType,
    #[serde(default)]
    packed: bool,
}

impl ValueType {
    /// Create a value type from an ABI tag, rejecting unsupported tags
    pub fn new(abi_type: &str, packed: bool) -> Result<Self, QueryError> {
        Ok(Self {
            abi_type: abi_type.parse()?,
            packed,
        })
    }

    pub fn from_abi_type(abi_type: AbiType, packed: bool) -> Self {
        Self { abi_type, packed }
    }

    pub fn abi_type(&self) -> AbiType {
        self.abi_type
    }

    pub fn packed(&self) -> bool {
        self.packed
    }

    /// Encode an answer
    pub fn encode(&self, value: &AbiValue) -> Result<Vec<u8>, QueryError> {
        self.abi_type
            .check(value)
            .map_err(|reason| QueryError::invalid_parameter(ANSWER, reason))?;

        if self.packed {
            Ok(encode_packed(self.abi_type, value))
        } else {
            Ok(abi::encode(&[value.to_token()]))
        }
    }

    /// Decode an answer, rejecting anything but the canonical encoding
    pub fn decode(&self, data: &[u8]) -> Result<AbiValue, QueryError> {
        if self.packed {
            return self.decode_packed(data);
        }

        let mut tokens = abi::decode(&[self.abi_type.param_type()], data)
            .map_err(|e| QueryError::MalformedQuery(format!("answer is not a {}: {}", self.abi_type, e)))?;
        let token = tokens
            .pop()
            .ok_or_else(|| QueryError::MalformedQuery("answer decoded to nothing".to_string()))?;
        let value = self
            .abi_type
            .value_from_token(token)
            .map_err(QueryError::MalformedQuery)?;

        if abi::encode(&[value.to_token()]) != data {
            return Err(QueryError::MalformedQuery(format!(
                "answer is not a canonical {} encoding",
                self.abi_type
            )));
        }
        Ok(value)
    }

    /// Encode a decimal answer for `ufixed` value types, rounding to the
    /// type's precision
    pub fn encode_decimal(&self, value: f64) -> Result<Vec<u8>, QueryError> {
        let decimals = self.fixed_decimals()?;
        if !value.is_finite() || value < 0.0 {
            return Err(QueryError::invalid_parameter(
                ANSWER,
                format!("{} is not a non-negative finite number", value),
            ));
        }
        // Shortest round-trip form first, so 1234.5678 scales exactly
        let mut text = value.to_string();
        if text.split_once('.').map_or(false, |(_, fraction)| fraction.len() > decimals as usize) {
            text = format!("{:.*}", decimals as usize, value);
        }
        let scaled = scale_decimal(&text, decimals).map_err(|reason| QueryError::invalid_parameter(ANSWER, reason))?;
        self.encode(&AbiValue::Uint(scaled))
    }

    /// Decode a `ufixed` answer back into a decimal
    pub fn decode_decimal(&self, data: &[u8]) -> Result<f64, QueryError> {
        let decimals = self.fixed_decimals()?;
        let scaled = self
            .decode(data)?
            .as_uint()
            .ok_or_else(|| QueryError::MalformedQuery("answer is not an integer".to_string()))?;
        format_decimal(scaled, decimals)
            .parse()
            .map_err(|e| QueryError::MalformedQuery(format!("answer is not a decimal: {}", e)))
    }

    fn fixed_decimals(&self) -> Result<u32, QueryError> {
        self.abi_type.decimals().ok_or_else(|| {
            QueryError::invalid_parameter(ANSWER, format!("{} answers are not decimals", self.abi_type))
        })
    }

    fn decode_packed(&self, data: &[u8]) -> Result<AbiValue, QueryError> {
        if let Some(width) = self.abi_type.packed_width() {
            if data.len() != width {
                return Err(QueryError::MalformedQuery(format!(
                    "packed {} must be {} bytes, got {}",
                    self.abi_type,
                    width,
                    data.len()
                )));
            }
        }

        let value = match self.abi_type {
            AbiType::Uint(_) | AbiType::UFixed { .. } => AbiValue::Uint(U256::from_big_endian(data)),
            AbiType::Address => AbiValue::Address(Address::from_slice(data)),
            AbiType::Bool => match data[0] {
                0 => AbiValue::Bool(false),
                1 => AbiValue::Bool(true),
                other => {
                    return Err(QueryError::MalformedQuery(format!(
                        "packed bool must be 0 or 1, got {}",
                        other
                    )))
                }
            },
            AbiType::FixedBytes(_) => AbiValue::FixedBytes(data.to_vec()),
            AbiType::Bytes => AbiValue::Bytes(data.to_vec()),
            AbiType::String => String::from_utf8(data.to_vec())
                .map(AbiValue::String)
                .map_err(|e| QueryError::MalformedQuery(format!("packed string is not UTF-8: {}", e)))?,
        };
        Ok(value)
    }
}

// Tight encoding: no padding, no length prefix. Callers check the value
// against the declared type first, so integer widths are known to fit.
fn encode_packed(abi_type: AbiType, value: &AbiValue) -> Vec<u8> {
    match value {
        AbiValue::Uint(v) => {
            let mut word = [0u8; 32];
            v.to_big_endian(&mut word);
            let width = abi_type.packed_width().unwrap_or(32);
            word[32 - width..].to_vec()
        }
        AbiValue::Address(address) => address.as_bytes().to_vec(),
        AbiValue::Bool(flag) => vec![u8::from(*flag)],
        AbiValue::FixedBytes(bytes) | AbiValue::Bytes(bytes) => bytes.clone(),
        AbiValue::String(text) => text.as_bytes().to_vec(),
    }
}
