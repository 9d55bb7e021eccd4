//! Float codecs: little-endian packed array, fixed element width (spec
//! §4.3). `float16` has no native Rust/serde_json representation, so it is
//! packed as IEEE 754 binary16 bits computed from the `f64` value and
//! unpacked back to `f64` on decode.

use super::ColumnCodec;
use crate::error::JonxError;
use crate::json::JsonCodec;
use serde_json::Value;

fn f64_to_f16_bits(v: f64) -> u16 {
    half_from_f32(v as f32)
}

fn f16_bits_to_f64(bits: u16) -> f64 {
    half_to_f32(bits) as f64
}

// Minimal binary16 <-> binary32 conversion. Narrowing the 23-bit binary32
// mantissa to 10 bits rounds to nearest, ties to even, rather than
// truncating: a bare right-shift would silently drop precision the spec's
// round-trip contract (§4.3, §8) requires to be preserved for every value
// `crate::infer` classifies as `float16`.
fn half_from_f32(f: f32) -> u16 {
    let bits = f.to_bits();
    let sign = (bits >> 16) & 0x8000;
    let exp = ((bits >> 23) & 0xff) as i32 - 127 + 15;
    let mantissa = bits & 0x7f_ffff;

    if exp <= 0 {
        return sign as u16;
    }
    if exp >= 0x1f {
        return (sign | 0x7c00) as u16;
    }

    let mut mantissa10 = mantissa >> 13;
    let round_bit = (mantissa >> 12) & 1;
    let sticky = (mantissa & 0xfff) != 0;
    let mut exp10 = exp as u32;

    if round_bit == 1 && (sticky || (mantissa10 & 1) == 1) {
        mantissa10 += 1;
        if mantissa10 == 0x400 {
            // Mantissa overflowed into the next exponent.
            mantissa10 = 0;
            exp10 += 1;
            if exp10 >= 0x1f {
                return (sign | 0x7c00) as u16;
            }
        }
    }

    (sign | (exp10 << 10) | mantissa10) as u16
}

fn half_to_f32(half: u16) -> f32 {
    let sign = (half & 0x8000) as u32;
    let exp = (half & 0x7c00) as u32;
    let mantissa = (half & 0x03ff) as u32;

    let bits = if exp == 0 {
        sign << 16
    } else if exp == 0x7c00 {
        (sign << 16) | 0x7f80_0000 | (mantissa << 13)
    } else {
        let unbiased_exp = (exp >> 10) as i32 - 15 + 127;
        (sign << 16) | ((unbiased_exp as u32) << 23) | (mantissa << 13)
    };
    f32::from_bits(bits)
}

pub struct Float16Codec;

impl ColumnCodec for Float16Codec {
    fn encode(&self, values: &[Value], _json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        let mut out = Vec::with_capacity(values.len() * 2);
        for v in values {
            let d = v
                .as_f64()
                .ok_or_else(|| JonxError::encode(format!("expected number, got {v}")))?;
            out.extend_from_slice(&f64_to_f16_bits(d).to_le_bytes());
        }
        Ok(out)
    }

    fn decode(&self, bytes: &[u8], n: usize, _json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        if bytes.len() != n * 2 {
            return Err(JonxError::decode(format!(
                "block length mismatch: expected {} bytes for {n} values, got {}",
                n * 2,
                bytes.len()
            )));
        }
        let mut out = Vec::with_capacity(n);
        for chunk in bytes.chunks_exact(2) {
            let bits = u16::from_le_bytes([chunk[0], chunk[1]]);
            let d = f16_bits_to_f64(bits);
            out.push(
                serde_json::Number::from_f64(d)
                    .map(Value::Number)
                    .ok_or_else(|| JonxError::decode("non-finite float16 value"))?,
            );
        }
        Ok(out)
    }
}

pub struct Float32Codec;

impl ColumnCodec for Float32Codec {
    fn encode(&self, values: &[Value], _json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        let mut out = Vec::with_capacity(values.len() * 4);
        for v in values {
            let d = v
                .as_f64()
                .ok_or_else(|| JonxError::encode(format!("expected number, got {v}")))?;
            out.extend_from_slice(&(d as f32).to_le_bytes());
        }
        Ok(out)
    }

    fn decode(&self, bytes: &[u8], n: usize, _json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        if bytes.len() != n * 4 {
            return Err(JonxError::decode(format!(
                "block length mismatch: expected {} bytes for {n} values, got {}",
                n * 4,
                bytes.len()
            )));
        }
        let mut out = Vec::with_capacity(n);
        for chunk in bytes.chunks_exact(4) {
            let f = f32::from_le_bytes(chunk.try_into().unwrap());
            out.push(
                serde_json::Number::from_f64(f as f64)
                    .map(Value::Number)
                    .ok_or_else(|| JonxError::decode("non-finite float32 value"))?,
            );
        }
        Ok(out)
    }
}

pub struct Float64Codec;

impl ColumnCodec for Float64Codec {
    fn encode(&self, values: &[Value], _json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        let mut out = Vec::with_capacity(values.len() * 8);
        for v in values {
            let d = v
                .as_f64()
                .ok_or_else(|| JonxError::encode(format!("expected number, got {v}")))?;
            out.extend_from_slice(&d.to_le_bytes());
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
            let d = f64::from_le_bytes(chunk.try_into().unwrap());
            out.push(
                serde_json::Number::from_f64(d)
                    .map(Value::Number)
                    .ok_or_else(|| JonxError::decode("non-finite float64 value"))?,
            );
        }
        Ok(out)
    }
}
