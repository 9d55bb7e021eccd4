//! File framer, encode side (spec §4.5, §6): header, schema block, one
//! column block per field in schema order, then the index section. All
//! variable-length blocks are prefixed with a 32-bit little-endian length.
//!
//! The encoder is fail-fast (spec §7): the first heterogeneous record or
//! out-of-range value aborts the whole encoding with no partial output —
//! `encode_records` never writes anything to its caller until every
//! column has encoded successfully.

use super::header;
use super::schema::Schema;
use crate::codec;
use crate::compress::{Compressor, COMPRESSION_LEVEL};
use crate::error::JonxError;
use crate::index;
use crate::infer;
use crate::json::JsonCodec;
use crate::types::PhysicalType;
use serde_json::Value;
use std::collections::HashMap;
use tracing::{debug, info};

/// Knobs for the encoder. The compression level is intentionally not
/// among them — spec §4.3 fixes it at 7 for the whole file format, and
/// varying it would break the format's byte-exact-output contract (spec
/// §8 "Stability").
#[derive(Debug, Clone, Default)]
pub struct EncodeOptions {
    /// Build indexes for indexable columns. Defaults to `true`; set to
    /// `false` only for callers that will never query min/max and want to
    /// skip the extra pass (not part of the on-disk format's semantics —
    /// purely a local performance knob for this encoder invocation).
    pub build_indexes: Option<bool>,
}

impl EncodeOptions {
    fn build_indexes(&self) -> bool {
        self.build_indexes.unwrap_or(true)
    }
}

/// Encode a homogeneous record set into JONX file bytes (spec §3, §6).
///
/// `records` must be non-empty `Value::Object`s sharing the same key set;
/// the field order of the first record becomes the canonical field list
/// `F`. A record with a missing or extra key is a fatal `JonxError::Encode`.
///
/// Any error is logged (`JonxError::log`) at the point it crosses back out
/// to the caller, mirroring the donor's `QueryExecutionError::log_error`
/// call sites at its own public API boundary.
pub fn encode_records(
    records: &[Value],
    compressor: &dyn Compressor,
    json: &dyn JsonCodec,
    options: &EncodeOptions,
) -> Result<Vec<u8>, JonxError> {
    encode_records_inner(records, compressor, json, options).map_err(JonxError::log)
}

fn encode_records_inner(
    records: &[Value],
    compressor: &dyn Compressor,
    json: &dyn JsonCodec,
    options: &EncodeOptions,
) -> Result<Vec<u8>, JonxError> {
    let fields = canonical_fields(records)?;
    let n = records.len();
    info!(target: "jonx::encode", num_records = n, num_fields = fields.len(), "encoding record set");

    let columns = pivot_to_columns(records, &fields)?;

    let mut types: HashMap<String, PhysicalType> = HashMap::with_capacity(fields.len());
    let mut column_blocks: Vec<(String, Vec<u8>)> = Vec::with_capacity(fields.len());
    let mut index_blocks: Vec<(String, Vec<u8>)> = Vec::new();

    for field in &fields {
        let values = &columns[field];
        let ty = infer::infer_column(values)?;
        debug!(target: "jonx::encode", field = %field, ty = %ty, "inferred column type");

        let raw = codec::encode_column(&ty, values, json)?;
        let compressed = compressor.compress(&raw, COMPRESSION_LEVEL)?;
        column_blocks.push((field.clone(), compressed));

        if options.build_indexes() && ty.is_indexable() && !ty.is_nullable() {
            let perm = index::build_index(&ty, values)?;
            let perm_value = serde_json::to_value(&perm)
                .map_err(|e| JonxError::encode(format!("index JSON encode failed: {e}")))?;
            let perm_json = json.encode(&perm_value)?;
            let compressed_index = compressor.compress(&perm_json, COMPRESSION_LEVEL)?;
            index_blocks.push((field.clone(), compressed_index));
        }

        types.insert(field.clone(), ty);
    }

    let schema = Schema::new(fields, types);
    let schema_bytes = schema.to_json_bytes()?;
    let schema_compressed = compressor.compress(&schema_bytes, COMPRESSION_LEVEL)?;

    let mut out = Vec::new();
    header::write_header(&mut out);
    write_block(&mut out, &schema_compressed);
    for (_, block) in &column_blocks {
        write_block(&mut out, block);
    }

    out.extend_from_slice(&(index_blocks.len() as u32).to_le_bytes());
    for (name, block) in &index_blocks {
        let name_bytes = name.as_bytes();
        out.extend_from_slice(&(name_bytes.len() as u32).to_le_bytes());
        out.extend_from_slice(name_bytes);
        write_block(&mut out, block);
    }

    Ok(out)
}

fn write_block(out: &mut Vec<u8>, block: &[u8]) {
    out.extend_from_slice(&(block.len() as u32).to_le_bytes());
    out.extend_from_slice(block);
}

/// Derives `F` from the first record's key order and validates every
/// subsequent record has exactly that key set (spec §3 invariant).
fn canonical_fields(records: &[Value]) -> Result<Vec<String>, JonxError> {
    let first = records
        .first()
        .ok_or_else(|| JonxError::encode("cannot encode an empty record set"))?;
    let first_obj = first
        .as_object()
        .ok_or_else(|| JonxError::encode("records must be JSON objects"))?;
    let fields: Vec<String> = first_obj.keys().cloned().collect();
    let field_set: std::collections::HashSet<&str> = fields.iter().map(String::as_str).collect();

    for (i, record) in records.iter().enumerate() {
        let obj = record
            .as_object()
            .ok_or_else(|| JonxError::encode(format!("record {i} is not a JSON object")))?;
        if obj.len() != fields.len() || !obj.keys().all(|k| field_set.contains(k.as_str())) {
            return Err(JonxError::encode(format!(
                "record {i} has a key set differing from the canonical field list"
            )));
        }
    }
    Ok(fields)
}

fn pivot_to_columns(
    records: &[Value],
    fields: &[String],
) -> Result<HashMap<String, Vec<Value>>, JonxError> {
    let mut columns: HashMap<String, Vec<Value>> = fields
        .iter()
        .map(|f| (f.clone(), Vec::with_capacity(records.len())))
        .collect();

    for (i, record) in records.iter().enumerate() {
        let obj = record.as_object().expect("validated by canonical_fields");
        for field in fields {
            let value = obj.get(field).ok_or_else(|| {
                JonxError::encode(format!("record {i} missing field '{field}'"))
            })?;
            columns.get_mut(field).unwrap().push(value.clone());
        }
    }
    Ok(columns)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::compress::ZstdCodec;
    use crate::json::SerdeJsonCodec;
    use serde_json::json;

    #[test]
    fn heterogeneous_records_are_fatal() {
        let records = vec![json!({"a": 1}), json!({"a": 1, "b": 2})];
        let err = encode_records(&records, &ZstdCodec, &SerdeJsonCodec, &EncodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, JonxError::Encode(_)));
    }

    #[test]
    fn empty_record_set_is_fatal() {
        let err = encode_records(&[], &ZstdCodec, &SerdeJsonCodec, &EncodeOptions::default())
            .unwrap_err();
        assert!(matches!(err, JonxError::Encode(_)));
    }

    #[test]
    fn header_and_block_framing_is_well_formed() {
        let records = vec![json!({"id": 1}), json!({"id": 2}), json!({"id": 255})];
        let bytes =
            encode_records(&records, &ZstdCodec, &SerdeJsonCodec, &EncodeOptions::default())
                .unwrap();
        assert_eq!(&bytes[0..4], b"JONX");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 1);
    }
}
