//! Query descriptors
//!
//! A query descriptor is an immutable, fully typed instance of a query:
//! the query type name, its ordered parameters and the shape of its answer.

use std::hash::{Hash, Hasher};

use crate::abi::{AbiType, AbiValue};
use crate::codec::QueryCodec;
use crate::error::QueryError;
use crate::query_id::QueryId;
use crate::value_type::ValueType;

/// A named, typed query parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct QueryParameter {
    name: String,
    abi_type: AbiType,
    value: AbiValue,
}

impl QueryParameter {
    /// Create a parameter, checking that `value` is representable as `abi_type`
    pub fn new(name: impl Into<String>, abi_type: AbiType, value: AbiValue) -> Result<Self, QueryError> {
        let name = name.into();
        abi_type
            .check(&value)
            .map_err(|reason| QueryError::invalid_parameter(&name, reason))?;
        Ok(Self { name, abi_type, value })
    }

    /// Create a parameter from its textual form (CLI input)
    pub fn from_text(name: impl Into<String>, abi_type: AbiType, raw: &str) -> Result<Self, QueryError> {
        let name = name.into();
        let value = abi_type
            .parse_text(raw)
            .map_err(|reason| QueryError::invalid_parameter(&name, reason))?;
        Ok(Self { name, abi_type, value })
    }

    /// Create a parameter from a JSON value (configuration input)
    pub fn from_json(
        name: impl Into<String>,
        abi_type: AbiType,
        raw: &serde_json::Value,
    ) -> Result<Self, QueryError> {
        let name = name.into();
        let value = abi_type
            .value_from_json(raw)
            .map_err(|reason| QueryError::invalid_parameter(&name, reason))?;
        Ok(Self { name, abi_type, value })
    }

    pub(crate) fn unchecked(name: &str, abi_type: AbiType, value: AbiValue) -> Self {
        Self {
            name: name.to_string(),
            abi_type,
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn abi_type(&self) -> AbiType {
        self.abi_type
    }

    pub fn value(&self) -> &AbiValue {
        &self.value
    }
}

/// An immutable query instance.
///
/// Equality covers the type name, the ordered (type, value) pairs of the
/// parameters and the value type. Parameter names are labels only.
#[derive(Debug, Clone)]
pub struct QueryDescriptor {
    type_name: String,
    parameters: Vec<QueryParameter>,
    value_type: ValueType,
}

impl QueryDescriptor {
    pub fn new(
        type_name: impl Into<String>,
        parameters: Vec<QueryParameter>,
        value_type: ValueType,
    ) -> Result<Self, QueryError> {
        let type_name = type_name.into();
        if type_name.is_empty() {
            return Err(QueryError::invalid_parameter("type_name", "query type name is empty"));
        }
        Ok(Self {
            type_name,
            parameters,
            value_type,
        })
    }

    pub(crate) fn unchecked(type_name: &str, parameters: Vec<QueryParameter>, value_type: ValueType) -> Self {
        Self {
            type_name: type_name.to_string(),
            parameters,
            value_type,
        }
    }

    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn parameters(&self) -> &[QueryParameter] {
        &self.parameters
    }

    /// Look up a parameter value by name
    pub fn parameter(&self, name: &str) -> Option<&AbiValue> {
        self.parameters
            .iter()
            .find(|parameter| parameter.name == name)
            .map(|parameter| &parameter.value)
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    /// Ordered parameter types, as needed to decode the inner payload
    pub fn schema(&self) -> Vec<AbiType> {
        self.parameters.iter().map(|parameter| parameter.abi_type).collect()
    }

    /// Ordered parameter values
    pub fn values(&self) -> Vec<AbiValue> {
        self.parameters.iter().map(|parameter| parameter.value.clone()).collect()
    }

    /// Canonical encoded form of this query
    pub fn query_data(&self) -> Vec<u8> {
        QueryCodec::encode(self)
    }

    /// Content-addressed identifier of this query
    pub fn query_id(&self) -> QueryId {
        QueryId::derive(&self.query_data())
    }
}

impl PartialEq for QueryDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_name == other.type_name
            && self.value_type == other.value_type
            && self.parameters.len() == other.parameters.len()
            && self
                .parameters
                .iter()
                .zip(&other.parameters)
                .all(|(a, b)| a.abi_type == b.abi_type && a.value == b.value)
    }
}

impl Eq for QueryDescriptor {}

impl Hash for QueryDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_name.hash(state);
        self.value_type.hash(state);
        for parameter in &self.parameters {
            parameter.abi_type.hash(state);
            parameter.value.hash(state);
        }
    }
}
