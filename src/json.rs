//! JSON parser collaborator interface (spec §6).
//!
//! Kept injectable for the same reason as `compress::Compressor`: the core
//! is library-agnostic. `serde_json::Value` is the concrete JSON data model
//! used throughout the crate (null, bool, integer, float, string, array,
//! object), matching spec §6's `JsonCodec` data model one-to-one.

use crate::error::JonxError;
use serde_json::Value;

pub trait JsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, JonxError>;
    fn decode(&self, bytes: &[u8]) -> Result<Value, JonxError>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SerdeJsonCodec;

impl JsonCodec for SerdeJsonCodec {
    fn encode(&self, value: &Value) -> Result<Vec<u8>, JonxError> {
        serde_json::to_vec(value).map_err(|e| JonxError::encode(format!("JSON encode failed: {e}")))
    }

    fn decode(&self, bytes: &[u8]) -> Result<Value, JonxError> {
        serde_json::from_slice(bytes).map_err(|e| JonxError::decode(format!("JSON decode failed: {e}")))
    }
}
