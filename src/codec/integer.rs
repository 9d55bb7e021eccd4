//! Signed/unsigned integer codecs: little-endian packed array, fixed
//! element width, no length prefix inside the block (spec §4.3). `N`
//! comes from the schema/record count; `decode` asserts
//! `len(bytes) == N * width`.

use super::ColumnCodec;
use crate::error::JonxError;
use crate::json::JsonCodec;
use serde_json::Value;
use std::marker::PhantomData;

macro_rules! signed_codec {
    ($name:ident, $ty:ty) => {
        #[derive(Default)]
        pub struct $name;

        impl ColumnCodec for $name {
            fn encode(&self, values: &[Value], _json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
                let mut out = Vec::with_capacity(values.len() * std::mem::size_of::<$ty>());
                for v in values {
                    let n = v
                        .as_i64()
                        .ok_or_else(|| JonxError::encode(format!("expected integer, got {v}")))?;
                    let narrowed = <$ty>::try_from(n).map_err(|_| {
                        JonxError::encode(format!(
                            "value {n} outside {} range after inference",
                            stringify!($ty)
                        ))
                    })?;
                    out.extend_from_slice(&narrowed.to_le_bytes());
                }
                Ok(out)
            }

            fn decode(&self, bytes: &[u8], n: usize, _json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
                let width = std::mem::size_of::<$ty>();
                if bytes.len() != n * width {
                    return Err(JonxError::decode(format!(
                        "block length mismatch: expected {} bytes for {} values, got {}",
                        n * width,
                        n,
                        bytes.len()
                    )));
                }
                let mut out = Vec::with_capacity(n);
                for chunk in bytes.chunks_exact(width) {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(chunk);
                    out.push(Value::from(<$ty>::from_le_bytes(buf)));
                }
                Ok(out)
            }
        }
    };
}

macro_rules! unsigned_codec {
    ($name:ident, $ty:ty) => {
        #[derive(Default)]
        pub struct $name;

        impl ColumnCodec for $name {
            fn encode(&self, values: &[Value], _json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
                let mut out = Vec::with_capacity(values.len() * std::mem::size_of::<$ty>());
                for v in values {
                    let n = v
                        .as_u64()
                        .ok_or_else(|| JonxError::encode(format!("expected non-negative integer, got {v}")))?;
                    let narrowed = <$ty>::try_from(n).map_err(|_| {
                        JonxError::encode(format!(
                            "value {n} outside {} range after inference",
                            stringify!($ty)
                        ))
                    })?;
                    out.extend_from_slice(&narrowed.to_le_bytes());
                }
                Ok(out)
            }

            fn decode(&self, bytes: &[u8], n: usize, _json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
                let width = std::mem::size_of::<$ty>();
                if bytes.len() != n * width {
                    return Err(JonxError::decode(format!(
                        "block length mismatch: expected {} bytes for {} values, got {}",
                        n * width,
                        n,
                        bytes.len()
                    )));
                }
                let mut out = Vec::with_capacity(n);
                for chunk in bytes.chunks_exact(width) {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    buf.copy_from_slice(chunk);
                    out.push(Value::from(<$ty>::from_le_bytes(buf)));
                }
                Ok(out)
            }
        }
    };
}

// i8 has no `as_i64`-based narrowing via TryFrom<i64> directly ambiguity;
// all of these use the standard `TryFrom<i64>`/`TryFrom<u64>` impls.
signed_codec!(IntCodecI8, i8);
signed_codec!(IntCodecI16, i16);
signed_codec!(IntCodecI32, i32);
signed_codec!(IntCodecI64, i64);
unsigned_codec!(UIntCodecU8, u8);
unsigned_codec!(UIntCodecU16, u16);
unsigned_codec!(UIntCodecU32, u32);
unsigned_codec!(UIntCodecU64, u64);

/// Thin generic alias so `mod.rs`'s dispatch table can name
/// `IntCodec::<i8>::default()` uniformly; delegates to the macro-generated
/// concrete struct for each width.
pub struct IntCodec<T>(PhantomData<T>);
pub struct UIntCodec<T>(PhantomData<T>);

impl<T> Default for IntCodec<T> {
    fn default() -> Self {
        IntCodec(PhantomData)
    }
}
impl<T> Default for UIntCodec<T> {
    fn default() -> Self {
        UIntCodec(PhantomData)
    }
}

impl ColumnCodec for IntCodec<i8> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        IntCodecI8.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        IntCodecI8.decode(bytes, n, json)
    }
}
impl ColumnCodec for IntCodec<i16> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        IntCodecI16.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        IntCodecI16.decode(bytes, n, json)
    }
}
impl ColumnCodec for IntCodec<i32> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        IntCodecI32.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        IntCodecI32.decode(bytes, n, json)
    }
}
impl ColumnCodec for IntCodec<i64> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        IntCodecI64.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        IntCodecI64.decode(bytes, n, json)
    }
}
impl ColumnCodec for UIntCodec<u8> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        UIntCodecU8.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        UIntCodecU8.decode(bytes, n, json)
    }
}
impl ColumnCodec for UIntCodec<u16> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        UIntCodecU16.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        UIntCodecU16.decode(bytes, n, json)
    }
}
impl ColumnCodec for UIntCodec<u32> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        UIntCodecU32.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        UIntCodecU32.decode(bytes, n, json)
    }
}
impl ColumnCodec for UIntCodec<u64> {
    fn encode(&self, values: &[Value], json: &dyn JsonCodec) -> Result<Vec<u8>, JonxError> {
        UIntCodecU64.encode(values, json)
    }
    fn decode(&self, bytes: &[u8], n: usize, json: &dyn JsonCodec) -> Result<Vec<Value>, JonxError> {
        UIntCodecU64.decode(bytes, n, json)
    }
}
