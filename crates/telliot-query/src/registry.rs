//! Query type registry
//!
//! Maps a query type name to its ordered parameter schema and answer value
//! type. Descriptors are resolved against the registry when they are built,
//! so an unknown type or a badly shaped parameter list never reaches the
//! encoder.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use crate::abi::{AbiType, AbiValue};
use crate::descriptor::{QueryDescriptor, QueryParameter};
use crate::error::QueryError;
use crate::queries;
use crate::value_type::ValueType;

/// One declared parameter of a query type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParameterSchema {
    pub name: String,
    pub abi_type: AbiType,
    /// Lowercase string values when a query is built
    #[serde(default)]
    pub lowercase: bool,
}

impl ParameterSchema {
    pub fn new(name: impl Into<String>, abi_type: AbiType) -> Self {
        Self {
            name: name.into(),
            abi_type,
            lowercase: false,
        }
    }

    /// Mark a string parameter as case-insensitive
    pub fn lowercased(mut self) -> Self {
        self.lowercase = true;
        self
    }

    /// Canonical form of a value supplied for this parameter
    pub fn normalize(&self, value: AbiValue) -> AbiValue {
        match value {
            AbiValue::String(text) if self.lowercase => AbiValue::String(text.to_lowercase()),
            other => other,
        }
    }
}

/// Declaration of a query type
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuerySchema {
    pub type_name: String,
    #[serde(default)]
    pub parameters: Vec<ParameterSchema>,
    pub value_type: ValueType,
}

impl QuerySchema {
    /// Declare a query type from `(name, abi_type)` tag pairs
    pub fn new(type_name: &str, parameters: &[(&str, &str)], value_type: ValueType) -> Result<Self, QueryError> {
        let parameters = parameters
            .iter()
            .map(|(name, tag)| Ok(ParameterSchema::new(*name, tag.parse()?)))
            .collect::<Result<Vec<_>, QueryError>>()?;

        let schema = Self {
            type_name: type_name.to_string(),
            parameters,
            value_type,
        };
        schema.validate()?;
        Ok(schema)
    }

    /// Reject empty type names and empty or repeated parameter names
    pub fn validate(&self) -> Result<(), QueryError> {
        if self.type_name.is_empty() {
            return Err(QueryError::InvalidSchema("query type name is empty".to_string()));
        }
        let mut seen = HashSet::new();
        for parameter in &self.parameters {
            if parameter.name.is_empty() {
                return Err(QueryError::InvalidSchema(format!(
                    "{} has a parameter without a name",
                    self.type_name
                )));
            }
            if !seen.insert(parameter.name.as_str()) {
                return Err(QueryError::InvalidSchema(format!(
                    "{} declares parameter '{}' twice",
                    self.type_name, parameter.name
                )));
            }
        }
        Ok(())
    }

    /// Ordered parameter types
    pub fn abi_types(&self) -> Vec<AbiType> {
        self.parameters.iter().map(|parameter| parameter.abi_type).collect()
    }

    /// Build a descriptor from values given in schema order
    pub fn build(&self, values: Vec<AbiValue>) -> Result<QueryDescriptor, QueryError> {
        self.assemble(values, true)
    }

    /// Build a descriptor from named textual arguments, in any order
    pub fn build_from_text(&self, arguments: &[(String, String)]) -> Result<QueryDescriptor, QueryError> {
        let mut named = BTreeMap::new();
        for (name, value) in arguments {
            if named.insert(name.as_str(), value.as_str()).is_some() {
                return Err(QueryError::invalid_parameter(name, "given more than once"));
            }
        }
        self.check_names(named.keys().copied())?;

        let values = self
            .parameters
            .iter()
            .map(|declared| {
                let raw = named
                    .get(declared.name.as_str())
                    .ok_or_else(|| QueryError::invalid_parameter(&declared.name, "missing"))?;
                declared
                    .abi_type
                    .parse_text(raw)
                    .map_err(|reason| QueryError::invalid_parameter(&declared.name, reason))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.build(values)
    }

    /// Build a descriptor from a JSON object of named arguments
    pub fn build_from_json(
        &self,
        arguments: &serde_json::Map<String, serde_json::Value>,
    ) -> Result<QueryDescriptor, QueryError> {
        self.check_names(arguments.keys().map(String::as_str))?;

        let values = self
            .parameters
            .iter()
            .map(|declared| {
                let raw = arguments
                    .get(&declared.name)
                    .ok_or_else(|| QueryError::invalid_parameter(&declared.name, "missing"))?;
                declared
                    .abi_type
                    .value_from_json(raw)
                    .map_err(|reason| QueryError::invalid_parameter(&declared.name, reason))
            })
            .collect::<Result<Vec<_>, _>>()?;
        self.build(values)
    }

    /// Rebuild a decoded query exactly as it was encoded
    pub(crate) fn build_decoded(&self, values: Vec<AbiValue>) -> Result<QueryDescriptor, QueryError> {
        self.assemble(values, false)
    }

    /// Build a descriptor from values already known to fit the schema
    pub(crate) fn instantiate(&self, values: Vec<AbiValue>) -> QueryDescriptor {
        let parameters = self
            .parameters
            .iter()
            .zip(values)
            .map(|(declared, value)| {
                QueryParameter::unchecked(&declared.name, declared.abi_type, declared.normalize(value))
            })
            .collect();
        QueryDescriptor::unchecked(&self.type_name, parameters, self.value_type.clone())
    }

    fn assemble(&self, values: Vec<AbiValue>, normalize: bool) -> Result<QueryDescriptor, QueryError> {
        if values.len() != self.parameters.len() {
            return Err(QueryError::invalid_parameter(
                &self.type_name,
                format!("expected {} parameters, got {}", self.parameters.len(), values.len()),
            ));
        }
        let parameters = self
            .parameters
            .iter()
            .zip(values)
            .map(|(declared, value)| {
                let value = if normalize { declared.normalize(value) } else { value };
                QueryParameter::new(declared.name.clone(), declared.abi_type, value)
            })
            .collect::<Result<Vec<_>, _>>()?;
        QueryDescriptor::new(self.type_name.clone(), parameters, self.value_type.clone())
    }

    fn check_names<'a>(&self, mut names: impl Iterator<Item = &'a str>) -> Result<(), QueryError> {
        match names.find(|name| !self.parameters.iter().any(|declared| declared.name == *name)) {
            Some(unexpected) => Err(QueryError::invalid_parameter(
                unexpected,
                format!("not a parameter of {}", self.type_name),
            )),
            None => Ok(()),
        }
    }
}

/// Registered query types, keyed by type name
#[derive(Debug, Clone)]
pub struct QueryRegistry {
    schemas: BTreeMap<String, QuerySchema>,
}

impl QueryRegistry {
    pub fn empty() -> Self {
        Self {
            schemas: BTreeMap::new(),
        }
    }

    /// Registry holding the built-in query types
    pub fn builtin() -> Self {
        let schemas = queries::builtin_schemas()
            .into_iter()
            .map(|schema| (schema.type_name.clone(), schema))
            .collect();
        Self { schemas }
    }

    /// Register a query type; type names are unique
    pub fn register(&mut self, schema: QuerySchema) -> Result<(), QueryError> {
        schema.validate()?;
        if self.schemas.contains_key(&schema.type_name) {
            return Err(QueryError::DuplicateQueryType(schema.type_name));
        }
        self.schemas.insert(schema.type_name.clone(), schema);
        Ok(())
    }

    /// Register every schema in a JSON array, returning how many were added.
    ///
    /// Nothing is registered if any schema in the document is invalid.
    pub fn load_json(&mut self, json: &str) -> Result<usize, QueryError> {
        let schemas: Vec<QuerySchema> =
            serde_json::from_str(json).map_err(|e| QueryError::InvalidSchema(e.to_string()))?;

        let mut staged = self.clone();
        for schema in &schemas {
            staged.register(schema.clone())?;
        }
        *self = staged;
        Ok(schemas.len())
    }

    pub fn get(&self, type_name: &str) -> Result<&QuerySchema, QueryError> {
        self.schemas
            .get(type_name)
            .ok_or_else(|| QueryError::UnknownQueryType(type_name.to_string()))
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.schemas.contains_key(type_name)
    }

    /// Registered schemas in type-name order
    pub fn iter(&self) -> impl Iterator<Item = &QuerySchema> {
        self.schemas.values()
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

impl Default for QueryRegistry {
    fn default() -> Self {
        Self::builtin()
    }
}
