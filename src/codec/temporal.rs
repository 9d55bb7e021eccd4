//! `timestamp_ms`: little-endian signed 64-bit milliseconds since the Unix
//! epoch (spec §3/§4.3). `date` and `datetime` are handled by
//! `text::StringListCodec` since their block payload is JSON text, not a
//! packed binary array.

use super::ColumnCodec;
use crate::error::JonxError;
use crate::json::JsonCodec;
use serde_json::Value;

pub struct TimestampMsCodec;

impl ColumnCodec for TimestampMsCodec {
    fn encode(&self, values: &[Value], _json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        let mut out = Vec::with_capacity(values.len() * 8);
        for v in values {
            let ms = v
                .as_i64()
                .ok_or_else(|| JonxError::encode(format!("expected integer milliseconds, got {v}")))?;
            out.extend_from_slice(&ms.to_le_bytes());
        }
        Ok(out)
    }

    fn decode(&self, bytes: &[u8], n: usize, _json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        if bytes.len() != n * 8 {
            return Err(JonxError::decode(format!(
                "block length mismatch: expected {} bytes for {n} values, got {}",
                n * 8,
                bytes.len()
            )));
        }
        let mut out = Vec::with_capacity(n);
        for chunk in bytes.chunks_exact(8) {
            let ms = i64::from_le_bytes(chunk.try_into().unwrap());
            out.push(Value::from(ms));
        }
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::SerdeJsonCodec;
    use serde_json::json;

    #[test]
    fn roundtrip() {
        let codec = TimestampMsCodec;
        let values = vec![json!(0), json!(-1000), json!(1_700_000_000_000i64)];
        let bytes = codec.encode(&values, &SerdeJsonCodec).unwrap();
        assert_eq!(codec.decode(&bytes, 3, &SerdeJsonCodec).unwrap(), values);
    }
}
