//! Type inference (spec §4.2): scan a column's decoded JSON values and
//! choose the narrowest physical type, wrapping in `nullable<T>` if any
//! value was `null`.
//!
//! The donor's `FieldType::from_primitive_str`/`from_spec_with_nullable`
//! (`engine::schema::types`) parse a *declared* type string through a
//! chain of early returns; this module derives the type from *observed*
//! values instead, but keeps the same single-entry-point, first-match-wins
//! shape, and compiles its UUID/date/datetime shape regexes once via
//! `once_cell::sync::Lazy`, the donor's idiom for process-wide compiled
//! state (`shared::config::global::CONFIG`).

use crate::codec::BINARY_MARKER_KEY;
use crate::types::PhysicalType;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

static UUID_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?i)[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}$").unwrap()
});

static DATE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").unwrap());

static DATETIME_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^\d{4}-\d{2}-\d{2}T\d{2}:\d{2}:\d{2}(\.\d+)?(Z|[+-]\d{2}:\d{2})?$",
    )
    .unwrap()
});

/// Infer the physical type of a column, given its values in record order.
///
/// Presence of any `Value::Null` forces the result to be wrapped in
/// `nullable<T>`, where `T` is derived from the non-null subset alone
/// (spec §4.2). An all-null column infers as `nullable<json>`.
pub fn infer_column(values: &[Value]) -> Result<PhysicalType, crate::error::JonxError> {
    let has_null = values.iter().any(Value::is_null);
    let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();

    let base = infer_non_null(&non_null)?;
    Ok(if has_null { base.wrap_nullable() } else { base })
}

fn infer_non_null(values: &[&Value]) -> Result<PhysicalType, crate::error::JonxError> {
    // Rule 1: empty (or all-null) column.
    if values.is_empty() {
        return Ok(PhysicalType::Json);
    }

    // Rule 2: every element a boolean.
    if values.iter().all(|v| v.is_boolean()) {
        return Ok(PhysicalType::Bool);
    }

    // Rule 3: every element raw bytes. serde_json::Value has no native byte
    // type, and a plain array of small integers (e.g. `[255, 0, 1]`) is
    // indistinguishable by shape alone from a genuine byte string — an RGB
    // triple and a 3-byte string look identical. Detection therefore looks
    // for the unambiguous `{"$binary": "<base64>"}` marker that
    // `crate::codec::text` produces and consumes (spec §9 open question,
    // resolved in DESIGN.md), not for int-shaped arrays; a plain JSON array
    // column falls through to rule 7's `json` fallback instead.
    if values.iter().all(|v| is_byte_value(v)) {
        return Ok(PhysicalType::Binary);
    }

    // Rule 4: every element an integer.
    if values.iter().all(|v| v.is_i64() || v.is_u64()) {
        return Ok(infer_integer(values));
    }

    // Rule 5: every element a number, with at least one non-integer float.
    if values.iter().all(|v| v.is_number()) {
        return Ok(infer_float(values));
    }

    // Rule 6: every element a string.
    if values.iter().all(|v| v.is_string()) {
        return Ok(infer_string(values));
    }

    // Rule 7: fallback.
    Ok(PhysicalType::Json)
}

/// True for the `{"$binary": "<base64>"}` marker shape that
/// `crate::codec::text::StringListCodec::base64` round-trips, and only that
/// shape — not a plain array of small integers (see module docs above).
fn is_byte_value(v: &Value) -> bool {
    use base64::Engine;

    v.as_object()
        .filter(|obj| obj.len() == 1)
        .and_then(|obj| obj.get(BINARY_MARKER_KEY))
        .and_then(Value::as_str)
        .is_some_and(|s| {
            base64::engine::general_purpose::STANDARD
                .decode(s)
                .is_ok()
        })
}

fn infer_integer(values: &[&Value]) -> PhysicalType {
    let mut lo: i128 = i128::MAX;
    let mut hi: i128 = i128::MIN;
    for v in values {
        let n = if let Some(u) = v.as_u64() {
            u as i128
        } else {
            v.as_i64().expect("checked is_i64/is_u64 above") as i128
        };
        lo = lo.min(n);
        hi = hi.max(n);
    }

    if lo >= 0 {
        if hi <= u8::MAX as i128 {
            PhysicalType::Uint8
        } else if hi <= u16::MAX as i128 {
            PhysicalType::Uint16
        } else if hi <= u32::MAX as i128 {
            PhysicalType::Uint32
        } else {
            PhysicalType::Uint64
        }
    } else if lo >= i8::MIN as i128 && hi <= i8::MAX as i128 {
        PhysicalType::Int8
    } else if lo >= i16::MIN as i128 && hi <= i16::MAX as i128 {
        PhysicalType::Int16
    } else if lo >= i32::MIN as i128 && hi <= i32::MAX as i128 {
        PhysicalType::Int32
    } else {
        PhysicalType::Int64
    }
}

fn infer_float(values: &[&Value]) -> PhysicalType {
    let doubles: Vec<f64> = values.iter().map(|v| v.as_f64().unwrap_or(f64::NAN)).collect();

    let fits_f16 = doubles.iter().all(|d| {
        if !(-65504.0..=65504.0).contains(d) {
            return false;
        }
        // Implementation-defined heuristic (spec §9 open question): a
        // three-decimal round-trip through text, not a binary16 bit check.
        let text = format!("{:.3}", d);
        text.parse::<f64>().map(|back| back == *d).unwrap_or(false)
    });
    if fits_f16 {
        return PhysicalType::Float16;
    }

    let fits_f32 = doubles
        .iter()
        .all(|d| *d >= f32::MIN as f64 && *d <= f32::MAX as f64);
    if fits_f32 {
        return PhysicalType::Float32;
    }

    PhysicalType::Float64
}

fn infer_string(values: &[&Value]) -> PhysicalType {
    let strs: Vec<&str> = values.iter().map(|v| v.as_str().unwrap_or("")).collect();

    if strs.iter().all(|s| UUID_RE.is_match(s)) {
        return PhysicalType::Uuid;
    }
    if strs.iter().all(|s| DATE_RE.is_match(s)) {
        return PhysicalType::Date;
    }
    if strs.iter().all(|s| DATETIME_RE.is_match(s)) {
        return PhysicalType::Datetime;
    }

    let distinct: std::collections::HashSet<&str> = strs.iter().copied().collect();
    let u = distinct.len();
    if u <= 256 {
        PhysicalType::Enum
    } else if (u as f64) / (strs.len() as f64) <= 0.30 {
        PhysicalType::StringDict
    } else {
        PhysicalType::Str
    }
    // Note: per spec §4.2, the ≤256 check takes priority over the distinct
    // ratio, so `string_dict` only ever applies when u > 256.
}
