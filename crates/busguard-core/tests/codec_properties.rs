//! Property-based tests for the compact value codec.
//!
//! - Decoding never panics on arbitrary input
//! - Canonical encodings decode back to the encoded value
//! - Blank input is always absent

use busguard_core::{decode, encode, DecodedValue};
use proptest::prelude::*;
use serde_json::{json, Value};

// Strategy for JSON values that survive a text round trip.
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i32>().prop_map(|n| json!(n)),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect())),
        ]
    })
}

#[test]
fn prop_decode_never_panics() {
    proptest!(|(raw in ".*")| {
        let _ = decode(&raw);
    });
}

#[test]
fn prop_blank_is_absent() {
    proptest!(|(raw in "[ \t\r\n]*")| {
        prop_assert_eq!(decode(&raw), DecodedValue::Absent);
    });
}

#[test]
fn prop_strings_round_trip() {
    proptest!(|(s in ".+")| {
        let value = DecodedValue::String(s);
        let wire = encode(&value).unwrap();
        prop_assert_eq!(decode(&wire), value);
    });
}

#[test]
fn prop_finite_numbers_round_trip() {
    proptest!(|(n in any::<f64>().prop_filter("finite", |n| n.is_finite()))| {
        let wire = encode(&DecodedValue::Number(n)).unwrap();
        prop_assert_eq!(decode(&wire), DecodedValue::Number(n));
    });
}

#[test]
fn prop_json_round_trips() {
    proptest!(|(v in json_strategy())| {
        let value = DecodedValue::Json(v);
        let wire = encode(&value).unwrap();
        prop_assert_eq!(decode(&wire), value);
    });
}

#[test]
fn test_scalar_tags_round_trip() {
    for value in [
        DecodedValue::Bool(true),
        DecodedValue::Bool(false),
        DecodedValue::Null,
        DecodedValue::Undefined,
    ] {
        let wire = encode(&value).unwrap();
        assert_eq!(decode(&wire), value);
    }
}
