//! `enum`, `string_dict`: block is JSON text of `{"dict": [...], "idx":
//! [...]}` (spec §4.3). The dictionary is built in first-seen order during
//! encoding — this is observable in file output and therefore part of the
//! contract (spec §9). The decoder does not need to know which of the two
//! inference thresholds (≤256 distinct, or ≤0.30 distinct ratio) produced
//! this column; it simply rehydrates `dict[idx[i]]`. Encoding does need to
//! know, though: `enum`'s `m ≤ 256` cap (spec §3) is a codec-level invariant,
//! not just an inference-pipeline convention, so `DictCodec` is constructed
//! as either `enum_dict()` or `string_dict()` and only the former enforces it.

use super::ColumnCodec;
use crate::error::JonxError;
use crate::json::JsonCodec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;

pub const DICT_KEY: &str = "dict";
pub const IDX_KEY: &str = "idx";

#[derive(Serialize, Deserialize)]
struct DictPayload {
    dict: Vec<String>,
    idx: Vec<u32>,
}

/// The spec §3 invariant "`m ≤ 256` for `enum`" — `string_dict` has no such
/// cap (its own inference threshold is the ≤0.30 distinct ratio instead).
const ENUM_MAX_DICT_LEN: usize = 256;

pub struct DictCodec {
    is_enum: bool,
}

impl DictCodec {
    /// For `PhysicalType::Enum` columns: `encode` asserts `m ≤ 256`.
    pub fn enum_dict() -> Self {
        Self { is_enum: true }
    }

    /// For `PhysicalType::StringDict` columns: no dictionary-size cap.
    pub fn string_dict() -> Self {
        Self { is_enum: false }
    }
}

impl ColumnCodec for DictCodec {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        let mut dict = Vec::new();
        let mut seen: HashMap<&str, u32> = HashMap::new();
        let mut idx = Vec::with_capacity(values.len());

        for v in values {
            let s = v
                .as_str()
                .ok_or_else(|| JonxError::encode(format!("expected string, got {v}")))?;
            let code = *seen.entry(s).or_insert_with(|| {
                let next = dict.len() as u32;
                dict.push(s.to_string());
                next
            });
            idx.push(code);
        }

        if self.is_enum && dict.len() > ENUM_MAX_DICT_LEN {
            return Err(JonxError::encode(format!(
                "enum dictionary has {} distinct values, exceeding the {ENUM_MAX_DICT_LEN} cap",
                dict.len()
            )));
        }

        let payload = DictPayload { dict, idx };
        let value = serde_json::to_value(&payload)
            .map_err(|e| JonxError::encode(format!("JSON encode failed: {e}")))?;
        json.encode(&value)
    }

    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        let value = json.decode(bytes)?;
        let payload: DictPayload = serde_json::from_value(value)
            .map_err(|e| JonxError::decode(format!("malformed dictionary: {e}")))?;

        if payload.idx.len() != n {
            return Err(JonxError::decode(format!(
                "value count mismatch: expected {n}, got {}",
                payload.idx.len()
            )));
        }

        let m = payload.dict.len();
        payload
            .idx
            .into_iter()
            .map(|i| {
                payload
                    .dict
                    .get(i as usize)
                    .cloned()
                    .map(Value::String)
                    .ok_or_else(|| {
                        JonxError::decode(format!("dict index {i} out of range [0,{m})"))
                    })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::SerdeJsonCodec;
    use serde_json::json;

    #[test]
    fn first_seen_order_and_roundtrip() {
        let codec = DictCodec::string_dict();
        let values = vec![json!("A"), json!("B"), json!("A"), json!("A")];
        let bytes = codec.encode(&values, &SerdeJsonCodec).unwrap();

        let payload: DictPayload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload.dict, vec!["A".to_string(), "B".to_string()]);
        assert_eq!(payload.idx, vec![0, 1, 0, 0]);

        assert_eq!(codec.decode(&bytes, 4, &SerdeJsonCodec).unwrap(), values);
    }

    #[test]
    fn out_of_range_index_is_decode_error() {
        let bytes = serde_json::to_vec(&DictPayload {
            dict: vec!["A".to_string()],
            idx: vec![5],
        })
        .unwrap();
        let err = DictCodec::string_dict()
            .decode(&bytes, 1, &SerdeJsonCodec)
            .unwrap_err();
        assert!(matches!(err, JonxError::Decode(_)));
    }

    #[test]
    fn string_dict_has_no_cap() {
        let values: Vec<Value> = (0..300).map(|i| json!(format!("v{i}"))).collect();
        let bytes = DictCodec::string_dict()
            .encode(&values, &SerdeJsonCodec)
            .unwrap();
        let payload: DictPayload = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(payload.dict.len(), 300);
    }

    #[test]
    fn enum_dict_over_256_distinct_values_is_encode_error() {
        let values: Vec<Value> = (0..300).map(|i| json!(format!("v{i}"))).collect();
        let err = DictCodec::enum_dict()
            .encode(&values, &SerdeJsonCodec)
            .unwrap_err();
        assert!(matches!(err, JonxError::Encode(_)));
    }

    #[test]
    fn enum_dict_at_256_distinct_values_is_fine() {
        let values: Vec<Value> = (0..256).map(|i| json!(format!("v{i}"))).collect();
        assert!(DictCodec::enum_dict().encode(&values, &SerdeJsonCodec).is_ok());
    }
}
