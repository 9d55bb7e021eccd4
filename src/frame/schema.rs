//! Schema block (spec §3, §6): the pair `(F, {f_j -> T_j})`, persisted as
//! one compressed JSON block right after the header. The JSON object has
//! exactly two keys, `"fields"` and `"types"`, with `nullable<T>` spelled
//! exactly as `"nullable<T>"` (spec §6).

use crate::error::JonxError;
use crate::types::PhysicalType;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub fields: Vec<String>,
    pub types: HashMap<String, PhysicalType>,
}

#[derive(Deserialize)]
struct SchemaWire {
    fields: Vec<String>,
    types: HashMap<String, String>,
}

/// Write-side mirror of `SchemaWire`. `types` is serialized through
/// `serialize_ordered_types` rather than as a `HashMap`: `HashMap`'s
/// iteration order is perturbed per-instance by `RandomState`, so handing
/// a `HashMap` straight to `#[derive(Serialize)]` would make the "types"
/// object's key order — and therefore the compressed schema block's bytes
/// — vary between two encodes of the same record set, violating the
/// format's byte-identical-output contract (spec §8 "Stability").
#[derive(Serialize)]
struct SchemaWireOut<'a> {
    fields: &'a [String],
    #[serde(serialize_with = "serialize_ordered_types")]
    types: Vec<(&'a str, String)>,
}

/// Serializes pre-ordered `(field, type)` pairs as a JSON object, writing
/// entries in the order given rather than sorting or rehashing them.
fn serialize_ordered_types<S>(pairs: &[(&str, String)], serializer: S) -> Result<S::Ok, S::Error>
where
    S: serde::Serializer,
{
    use serde::ser::SerializeMap;
    let mut map = serializer.serialize_map(Some(pairs.len()))?;
    for (field, ty) in pairs {
        map.serialize_entry(field, ty)?;
    }
    map.end()
}

impl Schema {
    pub fn new(fields: Vec<String>, types: HashMap<String, PhysicalType>) -> Self {
        Self { fields, types }
    }

    pub fn type_of(&self, field: &str) -> Option<&PhysicalType> {
        self.types.get(field)
    }

    pub fn to_json_bytes(&self) -> Result<Vec<u8>, JonxError> {
        // Walk `self.fields`, not `self.types`, so the "types" object's key
        // order always matches the canonical field order regardless of
        // which order the `HashMap` itself happens to iterate in.
        let mut types = Vec::with_capacity(self.fields.len());
        for field in &self.fields {
            let ty = self
                .types
                .get(field)
                .ok_or_else(|| JonxError::encode(format!("field '{field}' has no declared type")))?;
            types.push((field.as_str(), ty.to_string()));
        }
        let wire = SchemaWireOut {
            fields: &self.fields,
            types,
        };
        serde_json::to_vec(&wire).map_err(|e| JonxError::encode(format!("schema JSON encode failed: {e}")))
    }

    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self, JonxError> {
        let wire: SchemaWire =
            serde_json::from_slice(bytes).map_err(|e| JonxError::decode(format!("malformed schema block: {e}")))?;
        let mut types = HashMap::with_capacity(wire.types.len());
        for (k, v) in wire.types {
            let ty: PhysicalType = v
                .parse()
                .map_err(|e: JonxError| JonxError::decode(format!("field '{k}': {e}")))?;
            types.insert(k, ty);
        }
        Ok(Schema {
            fields: wire.fields,
            types,
        })
    }

    /// Internal consistency check (spec §4.6 `check_schema`): every field
    /// has a known type, no duplicate field names, and `fields`/`types`
    /// agree on the field set.
    pub fn check(&self) -> SchemaReport {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        let mut seen = std::collections::HashSet::new();
        for f in &self.fields {
            if !seen.insert(f.as_str()) {
                errors.push(format!("duplicate field in schema: '{f}'"));
            }
            if !self.types.contains_key(f) {
                errors.push(format!("field '{f}' has no declared type"));
            }
        }
        for k in self.types.keys() {
            if !self.fields.contains(k) {
                warnings.push(format!("type map has entry for undeclared field '{k}'"));
            }
        }

        SchemaReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SchemaReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Schema {
        let mut types = HashMap::new();
        types.insert("id".to_string(), PhysicalType::Uint8);
        types.insert(
            "v".to_string(),
            PhysicalType::Nullable(Box::new(PhysicalType::Str)),
        );
        Schema::new(vec!["id".to_string(), "v".to_string()], types)
    }

    #[test]
    fn roundtrip() {
        let schema = sample();
        let bytes = schema.to_json_bytes().unwrap();
        let back = Schema::from_json_bytes(&bytes).unwrap();
        assert_eq!(back, schema);
    }

    #[test]
    fn nullable_spelling_in_wire_json() {
        let schema = sample();
        let bytes = schema.to_json_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        assert!(text.contains("nullable<str>"));
    }

    #[test]
    fn encoding_twice_is_byte_identical_for_a_multi_field_schema() {
        // A single-field schema can't expose HashMap-iteration-order bugs
        // (one entry has only one possible order); this needs several
        // fields, built fresh each time, the way `encode_records` does.
        let mut types = HashMap::new();
        types.insert("a".to_string(), PhysicalType::Uint8);
        types.insert("b".to_string(), PhysicalType::Str);
        types.insert("c".to_string(), PhysicalType::Float64);
        types.insert("d".to_string(), PhysicalType::Bool);
        types.insert("e".to_string(), PhysicalType::Uuid);
        let fields: Vec<String> = vec!["a", "b", "c", "d", "e"]
            .into_iter()
            .map(String::from)
            .collect();

        let first = Schema::new(fields.clone(), types.clone()).to_json_bytes().unwrap();
        let second = Schema::new(fields, types).to_json_bytes().unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn types_object_key_order_matches_field_order() {
        let mut types = HashMap::new();
        types.insert("z".to_string(), PhysicalType::Uint8);
        types.insert("a".to_string(), PhysicalType::Str);
        types.insert("m".to_string(), PhysicalType::Bool);
        let fields: Vec<String> = vec!["z", "a", "m"].into_iter().map(String::from).collect();
        let schema = Schema::new(fields, types);

        let bytes = schema.to_json_bytes().unwrap();
        let text = String::from_utf8(bytes).unwrap();
        let pos_z = text.find("\"z\"").unwrap();
        let pos_a = text.find("\"a\"").unwrap();
        let pos_m = text.find("\"m\"").unwrap();
        assert!(pos_z < pos_a && pos_a < pos_m, "{text}");
    }

    #[test]
    fn check_detects_missing_type() {
        let schema = Schema::new(vec!["a".to_string()], HashMap::new());
        let report = schema.check();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("no declared type")));
    }

    #[test]
    fn check_detects_duplicate_field() {
        let mut types = HashMap::new();
        types.insert("a".to_string(), PhysicalType::Bool);
        let schema = Schema::new(vec!["a".to_string(), "a".to_string()], types);
        let report = schema.check();
        assert!(!report.valid);
        assert!(report.errors.iter().any(|e| e.contains("duplicate")));
    }
}
