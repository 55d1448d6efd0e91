//! Built-in query types
//!
//! Typed constructors for the query types every reporter understands. Each
//! constructor instantiates the same schema the registry holds, so ids agree
//! whichever way a query is created.

use ethers::types::U256;

use crate::abi::{AbiType, AbiValue};
use crate::descriptor::QueryDescriptor;
use crate::registry::{ParameterSchema, QuerySchema};
use crate::value_type::ValueType;

pub const TELLOR_RNG: &str = "TellorRNG";
pub const SPOT_PRICE: &str = "SpotPrice";
pub const NUMERIC_API_RESPONSE: &str = "NumericApiResponse";
pub const SNAPSHOT: &str = "Snapshot";

const PRICE: AbiType = AbiType::UFixed {
    bits: 256,
    decimals: 18,
};

/// Pseudorandom number derived from block hashes after `timestamp`
pub fn tellor_rng(timestamp: impl Into<U256>) -> QueryDescriptor {
    tellor_rng_schema().instantiate(vec![AbiValue::Uint(timestamp.into())])
}

/// Price of `asset` denominated in `currency`. Symbols are lowercased.
pub fn spot_price(asset: &str, currency: &str) -> QueryDescriptor {
    spot_price_schema().instantiate(vec![AbiValue::from(asset), AbiValue::from(currency)])
}

/// Numeric value extracted from a JSON API response.
///
/// `parse_str` is a comma-separated path into the response body, e.g.
/// `"data, price"`.
pub fn numeric_api_response(url: &str, parse_str: &str) -> QueryDescriptor {
    numeric_api_response_schema().instantiate(vec![AbiValue::from(url), AbiValue::from(parse_str)])
}

/// Whether a Snapshot governance proposal passed
pub fn snapshot(proposal_id: &str) -> QueryDescriptor {
    snapshot_schema().instantiate(vec![AbiValue::from(proposal_id)])
}

/// Schemas for every built-in query type
pub(crate) fn builtin_schemas() -> Vec<QuerySchema> {
    vec![
        tellor_rng_schema(),
        spot_price_schema(),
        numeric_api_response_schema(),
        snapshot_schema(),
    ]
}

fn tellor_rng_schema() -> QuerySchema {
    schema(
        TELLOR_RNG,
        vec![ParameterSchema::new("timestamp", AbiType::Uint(256))],
        ValueType::from_abi_type(AbiType::FixedBytes(32), false),
    )
}

fn spot_price_schema() -> QuerySchema {
    schema(
        SPOT_PRICE,
        vec![
            ParameterSchema::new("asset", AbiType::String).lowercased(),
            ParameterSchema::new("currency", AbiType::String).lowercased(),
        ],
        ValueType::from_abi_type(PRICE, false),
    )
}

fn numeric_api_response_schema() -> QuerySchema {
    schema(
        NUMERIC_API_RESPONSE,
        vec![
            ParameterSchema::new("url", AbiType::String),
            ParameterSchema::new("parseStr", AbiType::String),
        ],
        ValueType::from_abi_type(PRICE, false),
    )
}

fn snapshot_schema() -> QuerySchema {
    schema(
        SNAPSHOT,
        vec![ParameterSchema::new("proposalId", AbiType::String)],
        ValueType::from_abi_type(AbiType::Bool, false),
    )
}

fn schema(type_name: &str, parameters: Vec<ParameterSchema>, value_type: ValueType) -> QuerySchema {
    QuerySchema {
        type_name: type_name.to_string(),
        parameters,
        value_type,
    }
}
