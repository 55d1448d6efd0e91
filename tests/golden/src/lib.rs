//! Telliot Golden Test Suite
//!
//! Fixed query encodings and ids that every reporter and the oracle
//! contracts must agree on, plus malformed inputs that must be rejected.

use telliot_query::{queries, QueryCodec, QueryDescriptor, QueryError, QueryRegistry};
use thiserror::Error;

#[cfg(test)]
mod fuzz;

/// A query with its expected canonical encoding and id
#[derive(Debug, Clone)]
pub struct GoldenVector {
    pub name: &'static str,
    pub description: &'static str,
    pub build: fn() -> QueryDescriptor,
    /// Full `query_data` hex, when pinned
    pub query_data: Option<&'static str>,
    pub query_id: &'static str,
}

/// Input that must fail to decode
#[derive(Debug, Clone)]
pub struct RejectionVector {
    pub name: &'static str,
    pub query_data: Vec<u8>,
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GoldenError {
    #[error("{field} mismatch: expected {expected}, got {actual}")]
    Mismatch {
        field: &'static str,
        expected: String,
        actual: String,
    },

    #[error("decoding failed: {0}")]
    Query(#[from] QueryError),

    #[error("malformed input was accepted")]
    Accepted,
}

/// Runs golden vectors against a registry
pub struct GoldenTestHarness {
    registry: QueryRegistry,
}

impl GoldenTestHarness {
    pub fn new(registry: QueryRegistry) -> Self {
        Self { registry }
    }

    /// Check encoding, id and full decode of a vector
    pub fn check(&self, vector: &GoldenVector) -> Result<(), GoldenError> {
        let query = (vector.build)();
        let query_data = query.query_data();

        if let Some(expected) = vector.query_data {
            expect("query_data", expected, &hex::encode(&query_data))?;
        }
        expect("query_id", vector.query_id, &query.query_id().to_string())?;

        let decoded = QueryCodec::decode_query(&query_data, &self.registry)?;
        if decoded != query {
            return Err(GoldenError::Mismatch {
                field: "decoded query",
                expected: format!("{:?}", query),
                actual: format!("{:?}", decoded),
            });
        }
        expect("re-encoded query_data", &hex::encode(&query_data), &hex::encode(decoded.query_data()))
    }

    /// Check that malformed input fails to decode
    pub fn check_rejection(&self, vector: &RejectionVector) -> Result<QueryError, GoldenError> {
        match QueryCodec::decode_query(&vector.query_data, &self.registry) {
            Ok(_) => Err(GoldenError::Accepted),
            Err(e) => Ok(e),
        }
    }

    /// Run every vector, returning the failures by name
    pub fn run_all(&self) -> Vec<(&'static str, GoldenError)> {
        let mut failures = Vec::new();
        for vector in vectors() {
            if let Err(e) = self.check(&vector) {
                failures.push((vector.name, e));
            }
        }
        for vector in rejection_vectors() {
            if let Err(e) = self.check_rejection(&vector) {
                failures.push((vector.name, e));
            }
        }
        failures
    }
}

impl Default for GoldenTestHarness {
    fn default() -> Self {
        Self::new(QueryRegistry::builtin())
    }
}

fn expect(field: &'static str, expected: &str, actual: &str) -> Result<(), GoldenError> {
    if expected == actual {
        Ok(())
    } else {
        Err(GoldenError::Mismatch {
            field,
            expected: expected.to_string(),
            actual: actual.to_string(),
        })
    }
}

pub const TELLOR_RNG_1000000_DATA: &str = concat!(
    "0000000000000000000000000000000000000000000000000000000000000040",
    "0000000000000000000000000000000000000000000000000000000000000080",
    "0000000000000000000000000000000000000000000000000000000000000009",
    "54656c6c6f72524e470000000000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000020",
    "00000000000000000000000000000000000000000000000000000000000f4240",
);

pub const SPOT_PRICE_ETH_USD_DATA: &str = concat!(
    "0000000000000000000000000000000000000000000000000000000000000040",
    "0000000000000000000000000000000000000000000000000000000000000080",
    "0000000000000000000000000000000000000000000000000000000000000009",
    "53706f7450726963650000000000000000000000000000000000000000000000",
    "00000000000000000000000000000000000000000000000000000000000000c0",
    "0000000000000000000000000000000000000000000000000000000000000040",
    "0000000000000000000000000000000000000000000000000000000000000080",
    "0000000000000000000000000000000000000000000000000000000000000003",
    "6574680000000000000000000000000000000000000000000000000000000000",
    "0000000000000000000000000000000000000000000000000000000000000003",
    "7573640000000000000000000000000000000000000000000000000000000000",
);

/// Pinned vectors
pub fn vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "tellor_rng_1000000",
            description: "TellorRNG(timestamp=1000000)",
            build: || queries::tellor_rng(1_000_000u64),
            query_data: Some(TELLOR_RNG_1000000_DATA),
            query_id: "3f43c74ef29e7115b1788f887bcd92a88a242fbab13e1721339adf7b238a473b",
        },
        GoldenVector {
            name: "spot_price_eth_usd",
            description: "SpotPrice(asset=eth, currency=usd)",
            build: || queries::spot_price("eth", "usd"),
            query_data: Some(SPOT_PRICE_ETH_USD_DATA),
            query_id: "83a7f3d48786ac2667503a61e8c415438ed2922eb86a2906e4ee66d9a2ce4992",
        },
        GoldenVector {
            name: "spot_price_btc_usd",
            description: "SpotPrice(asset=BTC, currency=USD), symbols lowercased",
            build: || queries::spot_price("BTC", "USD"),
            query_data: None,
            query_id: "a6f013ee236804827b77696d350e9f0ac3e879328f2a3021d473a0b778ad78ac",
        },
    ]
}

/// Malformed encodings derived from the pinned vectors
pub fn rejection_vectors() -> Vec<RejectionVector> {
    let valid = queries::tellor_rng(1_000_000u64).query_data();

    let mut truncated = valid.clone();
    truncated.truncate(valid.len() - 1);

    let mut trailing = valid.clone();
    trailing.extend_from_slice(&[0u8; 32]);

    let mut dirty_padding = valid.clone();
    dirty_padding[120] = 0xff;

    let mut bad_offset = valid.clone();
    bad_offset[31] = 0x41;

    let mut bad_utf8 = valid.clone();
    bad_utf8[96] = 0xff;

    vec![
        RejectionVector { name: "empty", query_data: Vec::new() },
        RejectionVector { name: "truncated", query_data: truncated },
        RejectionVector { name: "trailing_word", query_data: trailing },
        RejectionVector { name: "dirty_padding", query_data: dirty_padding },
        RejectionVector { name: "misaligned_offset", query_data: bad_offset },
        RejectionVector { name: "invalid_utf8_type_name", query_data: bad_utf8 },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_golden_vectors() {
        let harness = GoldenTestHarness::default();
        for vector in vectors() {
            harness
                .check(&vector)
                .unwrap_or_else(|e| panic!("{}: {}", vector.name, e));
        }
    }

    #[test]
    fn test_rng_query_data_is_192_bytes() {
        assert_eq!(TELLOR_RNG_1000000_DATA.len(), 2 * 192);
        assert_eq!(SPOT_PRICE_ETH_USD_DATA.len(), 2 * 352);
    }

    #[test]
    fn test_rejections_are_malformed_query() {
        let harness = GoldenTestHarness::default();
        for vector in rejection_vectors() {
            let error = harness.check_rejection(&vector).unwrap();
            assert!(
                matches!(error, QueryError::MalformedQuery(_)),
                "{}: {:?}",
                vector.name,
                error
            );
        }
    }

    #[test]
    fn test_mismatch_is_reported() {
        let mut vector = vectors().remove(0);
        vector.query_id = "00";
        let error = GoldenTestHarness::default().check(&vector).unwrap_err();
        assert!(matches!(error, GoldenError::Mismatch { field: "query_id", .. }));
    }

    #[test]
    fn test_run_all_passes() {
        assert!(GoldenTestHarness::default().run_all().is_empty());
    }
}
