//! Telliot Query Library
//!
//! Typed oracle queries and their canonical encoding. A query is a type name
//! plus ordered, ABI-typed parameters; it encodes to `query_data` (nested
//! Ethereum ABI tuples) and is identified on chain by the Keccak-256 digest
//! of those bytes.
//!
//! ```
//! use telliot_query::queries;
//!
//! let query = queries::tellor_rng(1_000_000u64);
//! assert_eq!(query.query_data().len(), 192);
//! assert_eq!(
//!     query.query_id().to_string(),
//!     "3f43c74ef29e7115b1788f887bcd92a88a242fbab13e1721339adf7b238a473b"
//! );
//! ```

pub mod abi;
pub mod codec;
pub mod descriptor;
pub mod error;
pub mod queries;
pub mod query_id;
pub mod registry;
pub mod value_type;

pub use abi::{AbiType, AbiValue};
pub use codec::QueryCodec;
pub use descriptor::{QueryDescriptor, QueryParameter};
pub use error::QueryError;
pub use query_id::QueryId;
pub use registry::{ParameterSchema, QueryRegistry, QuerySchema};
pub use value_type::ValueType;
