//! Property-based tests for the query codec
//!
//! Uses proptest to check round-trips, determinism and strict decoding over
//! random descriptors and corrupted encodings.

use ethers::types::{Address, U256};
use proptest::prelude::*;
use telliot_query::{AbiType, AbiValue, QueryCodec, QueryDescriptor, QueryError, QueryId, QueryParameter, ValueType};

/// A single typed parameter with a value that fits its type
pub fn parameter_strategy() -> impl Strategy<Value = (AbiType, AbiValue)> {
    prop_oneof![
        any::<u64>().prop_map(|v| (AbiType::Uint(256), AbiValue::from(v))),
        any::<[u8; 32]>().prop_map(|word| (AbiType::Uint(256), AbiValue::Uint(U256::from_big_endian(&word)))),
        any::<u8>().prop_map(|v| (AbiType::Uint(8), AbiValue::from(u64::from(v)))),
        any::<[u8; 20]>().prop_map(|bytes| (AbiType::Address, AbiValue::from(Address::from(bytes)))),
        any::<bool>().prop_map(|flag| (AbiType::Bool, AbiValue::from(flag))),
        any::<[u8; 32]>().prop_map(|bytes| (AbiType::FixedBytes(32), AbiValue::FixedBytes(bytes.to_vec()))),
        prop::collection::vec(any::<u8>(), 0..80).prop_map(|bytes| (AbiType::Bytes, AbiValue::Bytes(bytes))),
        ".{0,40}".prop_map(|text| (AbiType::String, AbiValue::String(text))),
    ]
}

/// A descriptor with up to six parameters
pub fn descriptor_strategy() -> impl Strategy<Value = QueryDescriptor> {
    ("[A-Za-z][A-Za-z0-9]{0,24}", prop::collection::vec(parameter_strategy(), 0..6)).prop_map(|(type_name, params)| {
        let parameters = params
            .into_iter()
            .enumerate()
            .map(|(index, (abi_type, value))| QueryParameter::new(format!("p{}", index), abi_type, value).unwrap())
            .collect();
        QueryDescriptor::new(type_name, parameters, ValueType::from_abi_type(AbiType::Bytes, false)).unwrap()
    })
}

proptest! {
    #[test]
    fn test_round_trip(query in descriptor_strategy()) {
        let query_data = query.query_data();
        let (type_name, inner) = QueryCodec::decode(&query_data).unwrap();
        prop_assert_eq!(type_name.as_str(), query.type_name());

        let values = QueryCodec::decode_parameters(&inner, &query.schema()).unwrap();
        prop_assert_eq!(values, query.values());
    }

    #[test]
    fn test_encoding_is_deterministic(query in descriptor_strategy()) {
        let copy = query.clone();
        prop_assert_eq!(query.query_data(), copy.query_data());
        prop_assert_eq!(query.query_id(), copy.query_id());
        prop_assert_eq!(query.query_data().len() % 32, 0);
    }

    #[test]
    fn test_id_changes_with_any_flipped_bit(query in descriptor_strategy(), index in any::<prop::sample::Index>(), bit in 0..8u8) {
        let mut query_data = query.query_data();
        let before = QueryId::derive(&query_data);
        let position = index.index(query_data.len());
        query_data[position] ^= 1 << bit;
        prop_assert_ne!(QueryId::derive(&query_data), before);
    }

    #[test]
    fn test_corruption_never_decodes_to_different_bytes(query in descriptor_strategy(), index in any::<prop::sample::Index>(), byte in any::<u8>()) {
        let mut query_data = query.query_data();
        let position = index.index(query_data.len());
        query_data[position] = byte;

        // Whatever still decodes must re-encode to exactly the corrupted input
        if let Ok((type_name, inner)) = QueryCodec::decode(&query_data) {
            let rebuilt = ethers::abi::encode(&[
                ethers::abi::Token::String(type_name),
                ethers::abi::Token::Bytes(inner),
            ]);
            prop_assert_eq!(rebuilt, query_data);
        }
    }

    #[test]
    fn test_wrong_schema_is_rejected(value in 100u64.., text in "[a-z]{1,20}") {
        let query = QueryDescriptor::new(
            "Mixed",
            vec![
                QueryParameter::new("n", AbiType::Uint(256), AbiValue::from(value)).unwrap(),
                QueryParameter::new("s", AbiType::String, AbiValue::from(text)).unwrap(),
            ],
            ValueType::from_abi_type(AbiType::Bool, false),
        )
        .unwrap();
        let (_, inner) = QueryCodec::decode(&query.query_data()).unwrap();

        let swapped = QueryCodec::decode_parameters(&inner, &[AbiType::String, AbiType::Uint(256)]);
        prop_assert!(matches!(swapped, Err(QueryError::SchemaMismatch(_))));

        let short = QueryCodec::decode_parameters(&inner, &[AbiType::Uint(256)]);
        prop_assert!(matches!(short, Err(QueryError::SchemaMismatch(_))));
    }

    #[test]
    fn test_uint_answers_round_trip(value in any::<u64>(), packed in any::<bool>()) {
        let value_type = ValueType::new("uint64", packed).unwrap();
        let encoded = value_type.encode(&AbiValue::from(value)).unwrap();
        prop_assert_eq!(encoded.len(), if packed { 8 } else { 32 });
        prop_assert_eq!(value_type.decode(&encoded).unwrap(), AbiValue::from(value));
    }
}
