//! Query error taxonomy

use thiserror::Error;

/// Failures produced while building, encoding or decoding queries.
///
/// All of these are data-validation failures: nothing here is retried, and
/// malformed input is never decoded on a best-effort basis.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryError {
    #[error("unsupported ABI type: {0}")]
    UnsupportedType(String),

    #[error("invalid parameter '{name}': {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("malformed query data: {0}")]
    MalformedQuery(String),

    #[error("parameter schema mismatch: {0}")]
    SchemaMismatch(String),

    #[error("query type '{0}' is not registered")]
    UnknownQueryType(String),

    #[error("query type '{0}' is already registered")]
    DuplicateQueryType(String),

    #[error("invalid query schema: {0}")]
    InvalidSchema(String),
}

impl QueryError {
    pub(crate) fn invalid_parameter(name: &str, reason: impl Into<String>) -> Self {
        QueryError::InvalidParameter {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}
