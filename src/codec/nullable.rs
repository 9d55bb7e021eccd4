//! `nullable<T>`: block is JSON text of `{"nulls": [...], "values": <payload
//! of T>}` (spec §4.3). When `T` is a binary-packed type, `values` is
//! stored as a base64 string of the raw packed bytes rather than a JSON
//! list; the decoder recognises this by `T`'s fixed width
//! (`PhysicalType::fixed_width`). Modelled as a thin adapter over the
//! inner codec rather than a second rank of physical types (spec §9):
//! only this wrapper knows about nullability.

use super::{codec_for, ColumnCodec};
use crate::error::JonxError;
use crate::json::JsonCodec;
use crate::types::PhysicalType;
use base64::Engine;
use serde_json::Value;

pub const NULLS_KEY: &str = "nulls";
pub const VALUES_KEY: &str = "values";

pub struct NullableCodec<'a> {
    pub inner: &'a PhysicalType,
}

impl ColumnCodec for NullableCodec<'_> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        if self.inner.is_nullable() {
            return Err(JonxError::encode("nested nullable types are not supported"));
        }

        let nulls: Vec<bool> = values.iter().map(Value::is_null).collect();
        let dense: Vec<Value> = values.iter().filter(|v| !v.is_null()).cloned().collect();

        let inner_bytes = codec_for(self.inner).encode(&dense, json)?;
        let values_field = if self.inner.fixed_width().is_some() {
            let engine = base64::engine::general_purpose::STANDARD;
            Value::String(engine.encode(&inner_bytes))
        } else {
            json.decode(&inner_bytes)
                .map_err(|e| JonxError::encode(format!("inner codec produced invalid JSON: {e}")))?
        };

        let payload = serde_json::json!({ NULLS_KEY: nulls, VALUES_KEY: values_field });
        json.encode(&payload)
    }

    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        if self.inner.is_nullable() {
            return Err(JonxError::decode("nested nullable types are not supported"));
        }

        let payload = json.decode(bytes)?;
        let obj = payload
            .as_object()
            .ok_or_else(|| JonxError::decode("nullable block is not a JSON object"))?;

        let nulls: Vec<bool> = obj
            .get(NULLS_KEY)
            .and_then(|v| v.as_array())
            .ok_or_else(|| JonxError::decode("nullable block missing 'nulls'"))?
            .iter()
            .map(|v| {
                v.as_bool()
                    .ok_or_else(|| JonxError::decode("'nulls' entry is not a bool"))
            })
            .collect::<Result<_, _>>()?;

        if nulls.len() != n {
            return Err(JonxError::decode(format!(
                "'nulls' length mismatch: expected {n}, got {}",
                nulls.len()
            )));
        }

        let non_null_count = nulls.iter().filter(|&&b| !b).count();
        let values_field = obj
            .get(VALUES_KEY)
            .ok_or_else(|| JonxError::decode("nullable block missing 'values'"))?;

        let dense = if self.inner.fixed_width().is_some() {
            let s = values_field
                .as_str()
                .ok_or_else(|| JonxError::decode("'values' expected base64 string for packed inner type"))?;
            let engine = base64::engine::general_purpose::STANDARD;
            let raw = engine
                .decode(s)
                .map_err(|e| JonxError::decode(format!("invalid base64 in 'values': {e}")))?;
            codec_for(self.inner).decode(&raw, non_null_count, json)?
        } else {
            let raw = json
                .encode(values_field)
                .map_err(|e| JonxError::decode(format!("JSON re-encode of 'values' failed: {e}")))?;
            codec_for(self.inner).decode(&raw, non_null_count, json)?
        };

        let mut dense_iter = dense.into_iter();
        nulls
            .into_iter()
            .map(|is_null| {
                if is_null {
                    Ok(Value::Null)
                } else {
                    dense_iter
                        .next()
                        .ok_or_else(|| JonxError::decode("'values' shorter than non-null count"))
                }
            })
            .collect()
    }
}
