//! Query identifiers
//!
//! A query id is the Keccak-256 digest of the query's canonical
//! `query_data`. Reporters and the oracle contract agree on a query purely
//! by this id.

use std::fmt;
use std::str::FromStr;

use ethers::types::H256;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use sha3::{Digest, Keccak256};

use crate::error::QueryError;

/// 32-byte content-addressed query identifier
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QueryId([u8; 32]);

impl QueryId {
    pub const LEN: usize = 32;

    /// Derive the id of an encoded query
    pub fn derive(query_data: &[u8]) -> Self {
        let mut hasher = Keccak256::new();
        hasher.update(query_data);
        Self(hasher.finalize().into())
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Lowercase hex with a `0x` prefix, as the contract tooling expects
    pub fn to_hex_prefixed(&self) -> String {
        format!("0x{}", self)
    }
}

impl fmt::Display for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for QueryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "QueryId({})", self)
    }
}

impl FromStr for QueryId {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").unwrap_or(s);
        let bytes = hex::decode(digits).map_err(|e| QueryError::MalformedQuery(format!("query id: {}", e)))?;
        let id: [u8; 32] = bytes.try_into().map_err(|bytes: Vec<u8>| {
            QueryError::MalformedQuery(format!("query id must be {} bytes, got {}", Self::LEN, bytes.len()))
        })?;
        Ok(Self(id))
    }
}

impl From<[u8; 32]> for QueryId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<QueryId> for H256 {
    fn from(id: QueryId) -> Self {
        H256(id.0)
    }
}

impl From<QueryId> for [u8; 32] {
    fn from(id: QueryId) -> Self {
        id.0
    }
}

impl Serialize for QueryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex_prefixed())
    }
}

impl<'de> Deserialize<'de> for QueryId {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}
