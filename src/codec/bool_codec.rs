//! `bool`: one byte per value, `0x00`/`0x01` (spec §4.3).

use super::ColumnCodec;
use crate::error::JonxError;
use crate::json::JsonCodec;
use serde_json::Value;

pub struct BoolCodec;

impl ColumnCodec for BoolCodec {
    fn encode(&self, values: &[Value], _json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        values
            .iter()
            .map(|v| {
                v.as_bool()
                    .map(|b| if b { 1u8 } else { 0u8 })
                    .ok_or_else(|| JonxError::encode(format!("expected bool, got {v}")))
            })
            .collect()
    }

    fn decode(&self, bytes: &[u8], n: usize, _json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        if bytes.len() != n {
            return Err(JonxError::decode(format!(
                "block length mismatch: expected {n} bytes for {n} values, got {}",
                bytes.len()
            )));
        }
        bytes
            .iter()
            .map(|&b| match b {
                0 => Ok(Value::Bool(false)),
                1 => Ok(Value::Bool(true)),
                other => Err(JonxError::decode(format!("invalid bool byte: {other:#x}"))),
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
    fn roundtrip() {
        let codec = BoolCodec;
        let values = vec![json!(true), json!(false), json!(true)];
        let bytes = codec.encode(&values, &SerdeJsonCodec).unwrap();
        assert_eq!(bytes, vec![1, 0, 1]);
        assert_eq!(codec.decode(&bytes, 3, &SerdeJsonCodec).unwrap(), values);
    }

    #[test]
    fn invalid_byte_is_decode_error() {
        let codec = BoolCodec;
        assert!(codec.decode(&[2], 1, &SerdeJsonCodec).is_err());
    }
}
