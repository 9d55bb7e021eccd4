//! Whole-file integration tests against the public API (spec §8).

use jonx::{encode_records, EncodeOptions, JonxError, Reader, SerdeJsonCodec, ZstdCodec};
use serde_json::{json, Value};

/// Mirrors the donor's `logging::init_for_tests`: a `tracing_subscriber`
/// registered once per test binary, routed through `with_test_writer` so
/// `jonx::error::JonxError::log`'s events show up under `cargo test -- --nocapture`.
fn init_logging() {
    use std::sync::Once;
    use tracing_subscriber::EnvFilter;

    static INIT: Once = Once::new();
    INIT.call_once(|| {
        let filter = EnvFilter::from_default_env().add_directive("jonx=debug".parse().unwrap());
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .try_init()
            .ok();
    });
}

fn encode(records: &[Value]) -> Vec<u8> {
    init_logging();
    encode_records(records, &ZstdCodec, &SerdeJsonCodec, &EncodeOptions::default()).unwrap()
}

#[test]
fn round_trip_preserves_field_order_values_and_types() {
    let records = vec![
        json!({"id": 1u64, "label": "a", "active": true}),
        json!({"id": 2u64, "label": "b", "active": false}),
        json!({"id": 255u64, "label": "c", "active": true}),
    ];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();

    let info = reader.info().unwrap();
    assert_eq!(info.fields, vec!["id", "label", "active"]);
    assert_eq!(info.num_rows, 3);

    assert_eq!(
        reader.get_column("id").unwrap(),
        vec![json!(1), json!(2), json!(255)]
    );
    assert_eq!(
        reader.get_column("label").unwrap(),
        vec![json!("a"), json!("b"), json!("c")]
    );
    assert_eq!(
        reader.get_column("active").unwrap(),
        vec![json!(true), json!(false), json!(true)]
    );
}

#[test]
fn encoding_twice_is_byte_identical() {
    let records = vec![json!({"x": 1}), json!({"x": 2}), json!({"x": 3})];
    let first = encode(&records);
    let second = encode(&records);
    assert_eq!(first, second);
}

#[test]
fn encoding_twice_is_byte_identical_with_multiple_fields() {
    // A single-field record set can't expose a schema-ordering regression
    // (one entry has only one possible iteration order); this needs a
    // record set wide enough for a HashMap's per-instance random seed to
    // actually reorder the "types" object between two fresh encodes.
    let records = vec![
        json!({"a": 1u64, "b": "x", "c": 1.5, "d": true, "e": "550e8400-e29b-41d4-a716-446655440000"}),
        json!({"a": 2u64, "b": "y", "c": 2.5, "d": false, "e": "6ba7b810-9dad-11d1-80b4-00c04fd430c8"}),
    ];
    let first = encode(&records);
    let second = encode(&records);
    assert_eq!(first, second);
}

#[test]
fn index_correctness_is_sorted_and_a_permutation() {
    let records = vec![json!({"x": 30}), json!({"x": 10}), json!({"x": 20})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert!(reader.has_index("x").unwrap());
    assert_eq!(reader.find_min("x", true).unwrap(), json!(10));
    assert_eq!(reader.find_min("x", false).unwrap(), json!(10));
    assert_eq!(reader.find_max("x", true).unwrap(), json!(30));
    assert_eq!(reader.find_max("x", false).unwrap(), json!(30));
}

#[test]
fn aggregate_laws_hold_for_integers() {
    let records = vec![json!({"x": 10}), json!({"x": 20}), json!({"x": 30})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    let sum = reader.sum("x").unwrap();
    assert_eq!(sum, jonx::Aggregate::Int(60));
    assert_eq!(reader.avg("x").unwrap(), 20.0);
}

#[test]
fn aggregate_laws_hold_for_a_nullable_column() {
    // avg(f)*N = sum(f) where N is the column's row count (spec §8), not
    // the count of non-null entries: sum = 10 + 30 = 40 over N = 3 rows.
    let records = vec![json!({"x": 10}), json!({"x": Value::Null}), json!({"x": 30})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.sum("x").unwrap(), jonx::Aggregate::Int(40));
    assert_eq!(reader.avg("x").unwrap() * 3.0, 40.0);
    assert_eq!(reader.avg("x").unwrap(), 40.0 / 3.0);
}

#[test]
fn nullable_preserves_null_positions_and_has_no_index() {
    let records = vec![json!({"v": Value::Null}), json!({"v": 1}), json!({"v": 2})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.info().unwrap().types["v"], "nullable<uint8>");
    assert_eq!(
        reader.get_column("v").unwrap(),
        vec![Value::Null, json!(1), json!(2)]
    );
    assert!(!reader.has_index("v").unwrap());
}

#[test]
fn scenario_1_uint8_with_sorted_index() {
    let records = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 255})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.info().unwrap().types["id"], "uint8");
    assert_eq!(
        reader.get_column("id").unwrap(),
        vec![json!(1), json!(2), json!(255)]
    );
}

#[test]
fn scenario_2_int8() {
    let records = vec![json!({"x": -1}), json!({"x": 0}), json!({"x": 127})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.info().unwrap().types["x"], "int8");
}

#[test]
fn scenario_3_large_uint64_find_max_with_index() {
    let records = vec![json!({"x": 5_000_000_000u64})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.info().unwrap().types["x"], "uint64");
    assert_eq!(
        reader.find_max("x", true).unwrap(),
        json!(5_000_000_000u64)
    );
}

#[test]
fn scenario_4_uuid_has_no_index() {
    let records = vec![
        json!({"u": "550e8400-e29b-41d4-a716-446655440000"}),
        json!({"u": "6ba7b810-9dad-11d1-80b4-00c04fd430c8"}),
    ];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.info().unwrap().types["u"], "uuid");
    assert!(!reader.has_index("u").unwrap());
}

#[test]
fn scenario_5_enum_dict_and_idx() {
    let records = vec![
        json!({"c": "A"}),
        json!({"c": "B"}),
        json!({"c": "A"}),
        json!({"c": "A"}),
    ];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.info().unwrap().types["c"], "enum");
    assert_eq!(
        reader.get_column("c").unwrap(),
        vec![json!("A"), json!("B"), json!("A"), json!("A")]
    );
}

#[test]
fn scenario_6_nullable_uint8_no_index() {
    let records = vec![json!({"v": Value::Null}), json!({"v": 1}), json!({"v": 2})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    assert_eq!(reader.info().unwrap().types["v"], "nullable<uint8>");
    assert_eq!(
        reader.get_column("v").unwrap(),
        vec![Value::Null, json!(1), json!(2)]
    );
    assert!(!reader.has_index("v").unwrap());
}

#[test]
fn corrupting_signature_byte_is_a_decode_error_not_a_wrong_value() {
    let bytes = encode(&[json!({"x": 1})]);
    let mut corrupted = bytes.clone();
    corrupted[0] = b'Z';
    let err = Reader::from_bytes(&corrupted).unwrap_err();
    assert!(matches!(err, JonxError::Decode(_)));
}

#[test]
fn corrupting_a_block_length_prefix_is_a_decode_error() {
    let bytes = encode(&[json!({"x": 1}), json!({"x": 2})]);
    let mut corrupted = bytes.clone();
    // Byte 8 begins the schema block's little-endian length prefix.
    corrupted[8] = 0xff;
    corrupted[9] = 0xff;
    let err = Reader::from_bytes(&corrupted).unwrap_err();
    assert!(matches!(err, JonxError::Decode(_)));
}

#[test]
fn heterogeneous_record_set_is_fatal_encode_error() {
    let records = vec![json!({"a": 1}), json!({"a": 1, "b": 2})];
    let err =
        encode_records(&records, &ZstdCodec, &SerdeJsonCodec, &EncodeOptions::default()).unwrap_err();
    assert!(matches!(err, JonxError::Encode(_)));
}

#[test]
fn validate_reports_a_healthy_file_as_valid() {
    let records = vec![json!({"x": 1, "y": Value::Null}), json!({"x": 2, "y": "hi"})];
    let bytes = encode(&records);
    let reader = Reader::from_bytes(&bytes).unwrap();
    let report = reader.validate();
    assert!(report.valid, "{:?}", report.errors);
}
