//! Query codec
//!
//! `query_data` is built in two passes: the ordered parameter values are
//! ABI-encoded into an inner buffer, then the tuple `(string type_name,
//! bytes inner)` is ABI-encoded again. The outer layer can therefore be
//! decoded without knowing the parameter schema, and the type name selects
//! the schema for the inner layer.
//!
//! Decoding is strict: anything that does not re-encode to exactly the same
//! bytes (dirty padding, trailing data, non-canonical offsets, values wider
//! than their declared type) is rejected.

use ethers::abi::{self, ParamType, Token};

use crate::abi::{AbiType, AbiValue};
use crate::descriptor::{QueryDescriptor, QueryParameter};
use crate::error::QueryError;
use crate::registry::QueryRegistry;

/// Encoder/decoder for `query_data`
pub struct QueryCodec;

impl QueryCodec {
    /// Encode a descriptor into canonical `query_data`
    pub fn encode(descriptor: &QueryDescriptor) -> Vec<u8> {
        let inner = Self::encode_parameters(descriptor.parameters());
        abi::encode(&[
            Token::String(descriptor.type_name().to_string()),
            Token::Bytes(inner),
        ])
    }

    /// Encode ordered parameter values as an ABI tuple
    pub fn encode_parameters(parameters: &[QueryParameter]) -> Vec<u8> {
        let tokens: Vec<Token> = parameters.iter().map(|parameter| parameter.value().to_token()).collect();
        abi::encode(&tokens)
    }

    /// Split `query_data` into the type name and the still-encoded parameters
    pub fn decode(query_data: &[u8]) -> Result<(String, Vec<u8>), QueryError> {
        let tokens = abi::decode(&[ParamType::String, ParamType::Bytes], query_data)
            .map_err(|e| QueryError::MalformedQuery(e.to_string()))?;

        let (type_name, inner) = match tokens.as_slice() {
            [Token::String(type_name), Token::Bytes(inner)] => (type_name.clone(), inner.clone()),
            _ => {
                return Err(QueryError::MalformedQuery(
                    "expected a (string, bytes) tuple".to_string(),
                ))
            }
        };

        if abi::encode(&tokens) != query_data {
            return Err(QueryError::MalformedQuery(
                "query data is not canonically encoded".to_string(),
            ));
        }
        Ok((type_name, inner))
    }

    /// Decode the inner parameter payload against an explicit ordered schema
    pub fn decode_parameters(inner: &[u8], schema: &[AbiType]) -> Result<Vec<AbiValue>, QueryError> {
        let param_types: Vec<ParamType> = schema.iter().map(AbiType::param_type).collect();
        let tokens = abi::decode(&param_types, inner).map_err(|e| {
            QueryError::SchemaMismatch(format!("payload does not decode as {}: {}", render(schema), e))
        })?;

        if tokens.len() != schema.len() {
            return Err(QueryError::SchemaMismatch(format!(
                "expected {} values, decoded {}",
                schema.len(),
                tokens.len()
            )));
        }
        if abi::encode(&tokens) != inner {
            return Err(QueryError::SchemaMismatch(format!(
                "payload is not a canonical encoding of {}",
                render(schema)
            )));
        }

        schema
            .iter()
            .zip(tokens)
            .enumerate()
            .map(|(index, (abi_type, token))| {
                abi_type
                    .value_from_token(token)
                    .map_err(|reason| QueryError::SchemaMismatch(format!("parameter {}: {}", index, reason)))
            })
            .collect()
    }

    /// Fully decode `query_data`, resolving its schema in `registry`
    pub fn decode_query(query_data: &[u8], registry: &QueryRegistry) -> Result<QueryDescriptor, QueryError> {
        let (type_name, inner) = Self::decode(query_data)?;
        let schema = registry.get(&type_name)?;
        let values = Self::decode_parameters(&inner, &schema.abi_types())?;
        schema.build_decoded(values)
    }
}

fn render(schema: &[AbiType]) -> String {
    let tags: Vec<String> = schema.iter().map(AbiType::to_string).collect();
    format!("({})", tags.join(","))
}
