//! `date`, `datetime`, `uuid`, `str`: block is JSON text of the value list
//! (spec §4.3). `binary`: block is JSON text of a list of base64 strings;
//! the decoder returns bytes. `json`: block is JSON text of a list of
//! arbitrary values (the fallback — no narrowing at all).
//!
//! The JSON data model spec §6 specifies (null, bool, integer, float,
//! string, array, object) has no native byte-string variant, so a `binary`
//! value in `serde_json::Value` is represented as the single-key object
//! `{"$binary": "<base64 text>"}` rather than a plain array of small
//! integers. A shape-only heuristic over plain arrays is fundamentally
//! ambiguous — `[255, 0, 1]` is indistinguishable from a genuine byte
//! string by value alone — so this marker is the resolved representation
//! for "bytes" on both sides: `crate::infer::is_byte_value` looks for it
//! when inferring a column's type, and this codec produces/consumes it.

use super::ColumnCodec;
use crate::error::JonxError;
use crate::json::JsonCodec;
use base64::Engine;
use serde_json::Value;

/// The single object key marking a `serde_json::Value` as raw bytes,
/// shared with `crate::infer`'s rule-3 detection.
pub const BINARY_MARKER_KEY: &str = "$binary";

#[derive(Clone, Copy)]
enum Mode {
    Plain,
    Base64,
}

pub struct StringListCodec {
    mode: Mode,
}

impl StringListCodec {
    pub fn plain() -> Self {
        Self { mode: Mode::Plain }
    }

    pub fn base64() -> Self {
        Self { mode: Mode::Base64 }
    }
}

impl ColumnCodec for StringListCodec {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        match self.mode {
            Mode::Plain => {
                let strs: Vec<Value> = values
                    .iter()
                    .map(|v| {
                        v.as_str()
                            .map(|s| Value::String(s.to_string()))
                            .ok_or_else(|| JonxError::encode(format!("expected string, got {v}")))
                    })
                    .collect::<Result<_, _>>()?;
                json.encode(&Value::Array(strs))
            }
            Mode::Base64 => {
                let engine = base64::engine::general_purpose::STANDARD;
                let mut encoded = Vec::with_capacity(values.len());
                for v in values {
                    let bytes = value_as_bytes(v)?;
                    encoded.push(Value::String(engine.encode(bytes)));
                }
                json.encode(&Value::Array(encoded))
            }
        }
    }

    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        let strs = decode_string_array(json, bytes)?;
        match self.mode {
            Mode::Plain => {
                check_len(strs.len(), n)?;
                Ok(strs.into_iter().map(Value::String).collect())
            }
            Mode::Base64 => {
                check_len(strs.len(), n)?;
                // Validate each entry decodes as base64, then re-wrap the
                // canonical text rather than the raw bytes: the marker
                // shape, not a plain byte array, is this codec's "bytes"
                // representation (see module docs).
                let engine = base64::engine::general_purpose::STANDARD;
                strs.into_iter()
                    .map(|s| {
                        engine
                            .decode(&s)
                            .map_err(|e| JonxError::decode(format!("invalid base64: {e}")))?;
                        let mut obj = serde_json::Map::with_capacity(1);
                        obj.insert(BINARY_MARKER_KEY.to_string(), Value::String(s));
                        Ok(Value::Object(obj))
                    })
                    .collect()
            }
        }
    }
}

fn decode_string_array(json: &dyn JsonCodec, bytes: &[u8]) -> Result<Vec<String>, JonxError> {
    let payload = json.decode(bytes)?;
    let arr = payload
        .as_array()
        .ok_or_else(|| JonxError::decode("malformed string list: expected a JSON array"))?;
    arr.iter()
        .map(|v| {
            v.as_str()
                .map(str::to_string)
                .ok_or_else(|| JonxError::decode(format!("expected string in list, got {v}")))
        })
        .collect()
}

fn value_as_bytes(v: &Value) -> Result<Vec<u8>, JonxError> {
    let s = v
        .as_object()
        .filter(|obj| obj.len() == 1)
        .and_then(|obj| obj.get(BINARY_MARKER_KEY))
        .and_then(Value::as_str)
        .ok_or_else(|| {
            JonxError::encode(format!(
                "expected {{\"{BINARY_MARKER_KEY}\": <base64>}}, got {v}"
            ))
        })?;
    base64::engine::general_purpose::STANDARD
        .decode(s)
        .map_err(|e| JonxError::encode(format!("invalid base64 in '{BINARY_MARKER_KEY}': {e}")))
}

fn check_len(got: usize, expected: usize) -> Result<(), JonxError> {
    if got != expected {
        return Err(JonxError::decode(format!(
            "value count mismatch: expected {expected}, got {got}"
        )));
    }
    Ok(())
}

/// `json`: no narrowing applied; the block is the JSON text of the raw
/// value list.
pub struct JsonListCodec;

impl ColumnCodec for JsonListCodec {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        json.encode(&Value::Array(values.to_vec()))
    }

    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        let payload = json.decode(bytes)?;
        let values = payload
            .as_array()
            .cloned()
            .ok_or_else(|| JonxError::decode("malformed json list: expected a JSON array"))?;
        check_len(values.len(), n)?;
        Ok(values)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::SerdeJsonCodec;
    use serde_json::json;

    #[test]
    fn plain_string_roundtrip() {
        let codec = StringListCodec::plain();
        let values = vec![json!("2024-01-01"), json!("2024-12-31")];
        let bytes = codec.encode(&values, &SerdeJsonCodec).unwrap();
        assert_eq!(codec.decode(&bytes, 2, &SerdeJsonCodec).unwrap(), values);
    }

    #[test]
    fn binary_roundtrip() {
        let codec = StringListCodec::base64();
        let values = vec![json!({"$binary": "AP8q"})]; // base64 of [0, 255, 42]
        let bytes = codec.encode(&values, &SerdeJsonCodec).unwrap();
        let decoded = codec.decode(&bytes, 1, &SerdeJsonCodec).unwrap();
        assert_eq!(decoded, values);
    }

    #[test]
    fn binary_encode_rejects_plain_int_array() {
        // A plain array of small integers is not the marker shape; it must
        // not be silently accepted as bytes (see module docs).
        let codec = StringListCodec::base64();
        let values = vec![Value::Array(vec![json!(0), json!(255), json!(42)])];
        assert!(codec.encode(&values, &SerdeJsonCodec).is_err());
    }

    #[test]
    fn json_fallback_roundtrip() {
        let codec = JsonListCodec;
        let values = vec![json!({"a": 1}), json!([1, 2, 3]), Value::Null];
        let bytes = codec.encode(&values, &SerdeJsonCodec).unwrap();
        assert_eq!(codec.decode(&bytes, 3, &SerdeJsonCodec).unwrap(), values);
    }
}
