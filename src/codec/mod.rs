//! Column codec (spec §4.3): per-physical-type encode/decode of a value
//! list to/from a raw byte block (pre-compression).
//!
//! Grounded in the donor's `engine::core::column::compression::
//! compression_codec::CompressionCodec` trait + `Lz4Codec` struct: a small
//! trait with a concrete struct per concern, dispatched explicitly rather
//! than through inheritance (spec §9 design note). Here the trait covers
//! per-*value* packing (one implementor per physical type) rather than
//! whole-block compression, which lives in `crate::compress` instead.

mod bool_codec;
mod dict;
mod float;
mod integer;
mod nullable;
mod temporal;
mod text;

use crate::error::JonxError;
use crate::json::JsonCodec;
use crate::types::PhysicalType;
use serde_json::Value;

/// Pure encode/decode pair for one physical type's block payload.
/// `decode(encode(v), len(v)) == v` (spec §4.3's round-trip contract).
///
/// `json` is the same injectable JSON collaborator as `crate::compress`'s
/// `Compressor`/`Decompressor` (spec §6): most implementors pack a fixed-width
/// binary array and never touch it, but the JSON-text-block implementors
/// (`text`, `dict`, `nullable`) route every value-list/wrapper-object they
/// write or read through it, rather than calling `serde_json` directly.
pub trait ColumnCodec {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError>;
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError>;
}

/// Encode a column's values to its pre-compression byte block, dispatching
/// on the column's inferred physical type.
pub fn encode_column(ty: &PhysicalType, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
    if let PhysicalType::Nullable(inner) = ty {
        let inner: &PhysicalType = inner;
        return nullable::NullableCodec { inner }.encode(values, json);
    }
    codec_for(ty).encode(values, json)
}

/// Decode a column's byte block back to `n` values, dispatching on the
/// column's physical type.
pub fn decode_column(
    ty: &PhysicalType,
    bytes: &[u8],
    n: usize,
    json: &dyn JsonCodec,
) -> Result<Vec<Value>, JonxError> {
    if let PhysicalType::Nullable(inner) = ty {
        let inner: &PhysicalType = inner;
        return nullable::NullableCodec { inner }.decode(bytes, n, json);
    }
    codec_for(ty).decode(bytes, n, json)
}

/// Decode a column's byte block without an externally supplied row count,
/// deriving it from the block's own framing instead. The file format
/// itself carries no row-count field (spec §6's layout table has none),
/// so the reader establishes `N` once per file by self-deriving it from
/// whichever column it decodes first, then passes that `N` to every
/// subsequent `decode_column` call for cross-validation (spec §4.3's
/// "decoder asserts len(bytes) = N*width").
pub fn decode_column_self_describing(
    ty: &PhysicalType,
    bytes: &[u8],
    json: &dyn JsonCodec,
) -> Result<Vec<Value>, JonxError> {
    let n = infer_len(ty, bytes, json)?;
    decode_column(ty, bytes, n, json)
}

fn infer_len(ty: &PhysicalType, bytes: &[u8], json: &dyn JsonCodec) -> Result<usize, JonxError> {
    if let PhysicalType::Nullable(_) = ty {
        let payload = json.decode(bytes)?;
        let nulls = payload
            .get(nullable::NULLS_KEY)
            .and_then(Value::as_array)
            .ok_or_else(|| JonxError::decode("nullable block missing 'nulls'"))?;
        return Ok(nulls.len());
    }

    if let Some(width) = ty.fixed_width() {
        if bytes.len() % width != 0 {
            return Err(JonxError::decode(format!(
                "block length {} is not a multiple of element width {width}",
                bytes.len()
            )));
        }
        return Ok(bytes.len() / width);
    }

    match ty {
        PhysicalType::Enum | PhysicalType::StringDict => {
            let payload = json.decode(bytes)?;
            let idx = payload
                .get(dict::IDX_KEY)
                .and_then(Value::as_array)
                .ok_or_else(|| JonxError::decode("dictionary block missing 'idx'"))?;
            Ok(idx.len())
        }
        _ => {
            let payload = json.decode(bytes)?;
            let arr = payload
                .as_array()
                .ok_or_else(|| JonxError::decode("malformed value list: expected a JSON array"))?;
            Ok(arr.len())
        }
    }
}

fn codec_for(ty: &PhysicalType) -> Box<dyn ColumnCodec> {
    use PhysicalType::*;
    match ty {
        Int8 => Box::new(integer::IntCodec::<i8>::default()),
        Int16 => Box::new(integer::IntCodec::<i16>::default()),
        Int32 => Box::new(integer::IntCodec::<i32>::default()),
        Int64 => Box::new(integer::IntCodec::<i64>::default()),
        Uint8 => Box::new(integer::UIntCodec::<u8>::default()),
        Uint16 => Box::new(integer::UIntCodec::<u16>::default()),
        Uint32 => Box::new(integer::UIntCodec::<u32>::default()),
        Uint64 => Box::new(integer::UIntCodec::<u64>::default()),
        Float16 => Box::new(float::Float16Codec),
        Float32 => Box::new(float::Float32Codec),
        Float64 => Box::new(float::Float64Codec),
        Bool => Box::new(bool_codec::BoolCodec),
        TimestampMs => Box::new(temporal::TimestampMsCodec),
        Date => Box::new(text::StringListCodec::plain()),
        Datetime => Box::new(text::StringListCodec::plain()),
        Uuid => Box::new(text::StringListCodec::plain()),
        Str => Box::new(text::StringListCodec::plain()),
        Binary => Box::new(text::StringListCodec::base64()),
        Json => Box::new(text::JsonListCodec),
        Enum => Box::new(dict::DictCodec::enum_dict()),
        StringDict => Box::new(dict::DictCodec::string_dict()),
        Nullable(_) => unreachable!("Nullable is dispatched separately in encode_column/decode_column"),
    }
}

pub use dict::{DICT_KEY, IDX_KEY};
pub use nullable::{NULLS_KEY, VALUES_KEY};
pub use text::BINARY_MARKER_KEY;
