//! ABI primitive types
//!
//! The closed set of Solidity primitive types a query parameter or a query
//! answer may be declared with, and the typed values they carry.

use ethers::abi::{ParamType, Token};
use ethers::types::{Address, U256};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::QueryError;

/// Largest number of decimals a `ufixed` type may declare
pub const MAX_FIXED_DECIMALS: u32 = 80;

/// Supported primitive ABI types.
///
/// Parsed from (and rendered back to) the canonical Solidity tag, so that
/// registry configuration and CLI input stay stringly but are validated at
/// the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AbiType {
    /// `uint<bits>`
    Uint(usize),
    Address,
    Bool,
    /// `bytes<size>`
    FixedBytes(usize),
    Bytes,
    String,
    /// `ufixed<bits>x<decimals>`, carried on the wire as an unsigned integer
    /// scaled by 10^decimals
    UFixed { bits: usize, decimals: u32 },
}

impl AbiType {
    /// Wire-level parameter type used by the tuple encoder
    pub fn param_type(&self) -> ParamType {
        match *self {
            AbiType::Uint(bits) | AbiType::UFixed { bits, .. } => ParamType::Uint(bits),
            AbiType::Address => ParamType::Address,
            AbiType::Bool => ParamType::Bool,
            AbiType::FixedBytes(size) => ParamType::FixedBytes(size),
            AbiType::Bytes => ParamType::Bytes,
            AbiType::String => ParamType::String,
        }
    }

    /// Whether the type is encoded in the tail section of a tuple
    pub fn is_dynamic(&self) -> bool {
        matches!(self, AbiType::Bytes | AbiType::String)
    }

    /// Width in bytes of the tightly packed encoding, `None` for dynamic types
    pub fn packed_width(&self) -> Option<usize> {
        match *self {
            AbiType::Uint(bits) | AbiType::UFixed { bits, .. } => Some(bits / 8),
            AbiType::Address => Some(20),
            AbiType::Bool => Some(1),
            AbiType::FixedBytes(size) => Some(size),
            AbiType::Bytes | AbiType::String => None,
        }
    }

    /// Number of decimals for `ufixed` types
    pub fn decimals(&self) -> Option<u32> {
        match *self {
            AbiType::UFixed { decimals, .. } => Some(decimals),
            _ => None,
        }
    }

    /// Checks that `value` is representable in this type
    pub fn check(&self, value: &AbiValue) -> Result<(), String> {
        match (self, value) {
            (AbiType::Uint(bits) | AbiType::UFixed { bits, .. }, AbiValue::Uint(v)) => {
                if v.bits() > *bits {
                    Err(format!("{} does not fit in {}", v, self))
                } else {
                    Ok(())
                }
            }
            (AbiType::FixedBytes(size), AbiValue::FixedBytes(bytes)) => {
                if bytes.len() != *size {
                    Err(format!("expected {} bytes, got {}", size, bytes.len()))
                } else {
                    Ok(())
                }
            }
            (AbiType::Address, AbiValue::Address(_))
            | (AbiType::Bool, AbiValue::Bool(_))
            | (AbiType::Bytes, AbiValue::Bytes(_))
            | (AbiType::String, AbiValue::String(_)) => Ok(()),
            _ => Err(format!("{} value cannot be used as {}", value.kind(), self)),
        }
    }

    /// Converts a decoded token into a value of this type, rejecting values
    /// wider than the declared type
    pub(crate) fn value_from_token(&self, token: Token) -> Result<AbiValue, String> {
        let value = match token {
            Token::Uint(v) => AbiValue::Uint(v),
            Token::Address(address) => AbiValue::Address(address),
            Token::Bool(flag) => AbiValue::Bool(flag),
            Token::FixedBytes(bytes) => AbiValue::FixedBytes(bytes),
            Token::Bytes(bytes) => AbiValue::Bytes(bytes),
            Token::String(text) => AbiValue::String(text),
            other => return Err(format!("unsupported token {:?}", other)),
        };
        self.check(&value)?;
        Ok(value)
    }

    /// Coerces a textual value into this type.
    ///
    /// Integers accept decimal or `0x` hex, `ufixed` accepts decimal
    /// notation, byte types accept hex with an optional `0x` prefix.
    pub(crate) fn parse_text(&self, raw: &str) -> Result<AbiValue, String> {
        let value = match *self {
            AbiType::Uint(_) => AbiValue::Uint(parse_uint(raw.trim())?),
            AbiType::UFixed { decimals, .. } => AbiValue::Uint(scale_decimal(raw.trim(), decimals)?),
            AbiType::Address => Address::from_str(raw.trim())
                .map(AbiValue::Address)
                .map_err(|e| format!("invalid address '{}': {}", raw, e))?,
            AbiType::Bool => match raw.trim() {
                "true" => AbiValue::Bool(true),
                "false" => AbiValue::Bool(false),
                other => return Err(format!("'{}' is not a bool", other)),
            },
            AbiType::FixedBytes(_) => AbiValue::FixedBytes(decode_hex(raw.trim())?),
            AbiType::Bytes => AbiValue::Bytes(decode_hex(raw.trim())?),
            AbiType::String => AbiValue::String(raw.to_string()),
        };
        self.check(&value)?;
        Ok(value)
    }

    /// Coerces a JSON value into this type
    pub(crate) fn value_from_json(&self, raw: &serde_json::Value) -> Result<AbiValue, String> {
        use serde_json::Value;

        match raw {
            Value::String(text) => self.parse_text(text),
            Value::Bool(flag) if *self == AbiType::Bool => Ok(AbiValue::Bool(*flag)),
            Value::Number(number) if matches!(self, AbiType::Uint(_) | AbiType::UFixed { .. }) => {
                self.parse_text(&number.to_string())
            }
            other => Err(format!("JSON value {} cannot be used as {}", other, self)),
        }
    }
}

impl fmt::Display for AbiType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiType::Uint(bits) => write!(f, "uint{}", bits),
            AbiType::Address => f.write_str("address"),
            AbiType::Bool => f.write_str("bool"),
            AbiType::FixedBytes(size) => write!(f, "bytes{}", size),
            AbiType::Bytes => f.write_str("bytes"),
            AbiType::String => f.write_str("string"),
            AbiType::UFixed { bits, decimals } => write!(f, "ufixed{}x{}", bits, decimals),
        }
    }
}

impl FromStr for AbiType {
    type Err = QueryError;

    fn from_str(tag: &str) -> Result<Self, Self::Err> {
        let parsed = match tag {
            "address" => Some(AbiType::Address),
            "bool" => Some(AbiType::Bool),
            "bytes" => Some(AbiType::Bytes),
            "string" => Some(AbiType::String),
            "uint" => Some(AbiType::Uint(256)),
            "ufixed" => Some(AbiType::UFixed { bits: 128, decimals: 18 }),
            _ => parse_sized(tag),
        };
        parsed.ok_or_else(|| QueryError::UnsupportedType(tag.to_string()))
    }
}

impl TryFrom<String> for AbiType {
    type Error = QueryError;

    fn try_from(tag: String) -> Result<Self, Self::Error> {
        tag.parse()
    }
}

impl From<AbiType> for String {
    fn from(abi_type: AbiType) -> Self {
        abi_type.to_string()
    }
}

fn parse_sized(tag: &str) -> Option<AbiType> {
    if let Some(suffix) = tag.strip_prefix("ufixed") {
        let (bits, decimals) = suffix.split_once('x')?;
        let (bits, decimals) = (width(bits)?, width(decimals)?);
        let valid = is_integer_width(bits) && (1..=MAX_FIXED_DECIMALS as usize).contains(&decimals);
        return valid.then(|| AbiType::UFixed {
            bits,
            decimals: decimals as u32,
        });
    }
    if let Some(bits) = tag.strip_prefix("uint") {
        let bits = width(bits)?;
        return is_integer_width(bits).then(|| AbiType::Uint(bits));
    }
    if let Some(size) = tag.strip_prefix("bytes") {
        let size = width(size)?;
        return (1..=32).contains(&size).then(|| AbiType::FixedBytes(size));
    }
    None
}

// Canonical decimal only: no sign, no leading zeros.
fn width(digits: &str) -> Option<usize> {
    if digits.is_empty() || digits.starts_with('0') || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok()
}

fn is_integer_width(bits: usize) -> bool {
    bits % 8 == 0 && (8..=256).contains(&bits)
}

fn parse_uint(raw: &str) -> Result<U256, String> {
    if raw.starts_with('-') {
        return Err(format!("negative value {} for unsigned type", raw));
    }
    if let Some(digits) = raw.strip_prefix("0x") {
        let padded = if digits.len() % 2 == 1 {
            format!("0{}", digits)
        } else {
            digits.to_string()
        };
        let bytes = hex::decode(&padded).map_err(|e| format!("invalid hex integer '{}': {}", raw, e))?;
        if bytes.is_empty() || bytes.len() > 32 {
            return Err(format!("hex integer '{}' must be 1 to 32 bytes", raw));
        }
        return Ok(U256::from_big_endian(&bytes));
    }
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(format!("'{}' is not an unsigned integer", raw));
    }
    U256::from_dec_str(raw).map_err(|_| format!("'{}' overflows 256 bits", raw))
}

fn decode_hex(raw: &str) -> Result<Vec<u8>, String> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    hex::decode(digits).map_err(|e| format!("invalid hex '{}': {}", raw, e))
}

/// Scales a non-negative decimal string by 10^decimals without going
/// through floating point
pub(crate) fn scale_decimal(raw: &str, decimals: u32) -> Result<U256, String> {
    if raw.starts_with('-') {
        return Err(format!("negative value {} for unsigned type", raw));
    }
    let (whole, fraction) = raw.split_once('.').unwrap_or((raw, ""));
    let all_digits = |s: &str| s.bytes().all(|b| b.is_ascii_digit());
    if (whole.is_empty() && fraction.is_empty()) || !all_digits(whole) || !all_digits(fraction) {
        return Err(format!("'{}' is not an unsigned decimal", raw));
    }
    let decimals = decimals as usize;
    if fraction.len() > decimals {
        return Err(format!("'{}' has more than {} decimal places", raw, decimals));
    }

    let mut digits = String::with_capacity(whole.len() + decimals);
    digits.push_str(whole);
    digits.push_str(fraction);
    digits.extend(std::iter::repeat('0').take(decimals - fraction.len()));

    let digits = digits.trim_start_matches('0');
    if digits.is_empty() {
        return Ok(U256::zero());
    }
    U256::from_dec_str(digits).map_err(|_| format!("'{}' overflows 256 bits", raw))
}

/// Renders a scaled integer back as a decimal string, trimming trailing zeros
pub(crate) fn format_decimal(value: U256, decimals: u32) -> String {
    let decimals = decimals as usize;
    let mut digits = value.to_string();
    if digits.len() <= decimals {
        digits = format!("{}{}", "0".repeat(decimals + 1 - digits.len()), digits);
    }
    let (whole, fraction) = digits.split_at(digits.len() - decimals);
    let fraction = fraction.trim_end_matches('0');
    if fraction.is_empty() {
        whole.to_string()
    } else {
        format!("{}.{}", whole, fraction)
    }
}

/// A value of one of the supported primitive types
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AbiValue {
    Uint(U256),
    Address(Address),
    Bool(bool),
    FixedBytes(Vec<u8>),
    Bytes(Vec<u8>),
    String(String),
}

impl AbiValue {
    pub fn to_token(&self) -> Token {
        match self {
            AbiValue::Uint(v) => Token::Uint(*v),
            AbiValue::Address(address) => Token::Address(*address),
            AbiValue::Bool(flag) => Token::Bool(*flag),
            AbiValue::FixedBytes(bytes) => Token::FixedBytes(bytes.clone()),
            AbiValue::Bytes(bytes) => Token::Bytes(bytes.clone()),
            AbiValue::String(text) => Token::String(text.clone()),
        }
    }

    /// Short name of the value's kind, used in error messages
    pub fn kind(&self) -> &'static str {
        match self {
            AbiValue::Uint(_) => "uint",
            AbiValue::Address(_) => "address",
            AbiValue::Bool(_) => "bool",
            AbiValue::FixedBytes(_) => "fixed bytes",
            AbiValue::Bytes(_) => "bytes",
            AbiValue::String(_) => "string",
        }
    }

    pub fn as_uint(&self) -> Option<U256> {
        match self {
            AbiValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            AbiValue::String(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            AbiValue::FixedBytes(bytes) | AbiValue::Bytes(bytes) => Some(bytes),
            _ => None,
        }
    }
}

impl fmt::Display for AbiValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AbiValue::Uint(v) => write!(f, "{}", v),
            AbiValue::Address(address) => f.write_str(&ethers::utils::to_checksum(address, None)),
            AbiValue::Bool(flag) => write!(f, "{}", flag),
            AbiValue::FixedBytes(bytes) | AbiValue::Bytes(bytes) => write!(f, "0x{}", hex::encode(bytes)),
            AbiValue::String(text) => write!(f, "{:?}", text),
        }
    }
}

impl From<U256> for AbiValue {
    fn from(v: U256) -> Self {
        AbiValue::Uint(v)
    }
}

impl From<u64> for AbiValue {
    fn from(v: u64) -> Self {
        AbiValue::Uint(U256::from(v))
    }
}

impl From<Address> for AbiValue {
    fn from(address: Address) -> Self {
        AbiValue::Address(address)
    }
}

impl From<bool> for AbiValue {
    fn from(flag: bool) -> Self {
        AbiValue::Bool(flag)
    }
}

impl From<&str> for AbiValue {
    fn from(text: &str) -> Self {
        AbiValue::String(text.to_string())
    }
}

impl From<String> for AbiValue {
    fn from(text: String) -> Self {
        AbiValue::String(text)
    }
}
