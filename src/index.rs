//! Index builder (spec §4.4): for any indexable column type, computes
//! `P = argsort(column)` using a stable sort on the natural order of that
//! type. Nullable columns never get an index, even when the inner type is
//! indexable — nulls complicate total order and this is deliberate (spec
//! §4.4, §9 design note "Index on nullable numeric types").
//!
//! Grounded in the donor's `engine::core::zone::zone_index::ZoneIndex` as
//! the pattern for "a derived ordering artifact built once at write time,
//! consulted at read time, framed as a flat little-endian binary block" —
//! generalised here from the donor's per-zone `BTreeMap` bookkeeping to a
//! single file-scoped permutation, since spec §3's index is defined over
//! the whole column rather than per zone.

use crate::error::JonxError;
use crate::types::PhysicalType;
use serde_json::Value;

/// Build the sorted-ordinal permutation for an indexable column.
///
/// `P[i]` is the original position of the `i`-th smallest value; ties are
/// broken by ascending original position (guaranteed by `sort_by`'s
/// stability, since `order` starts in ascending-position order).
pub fn build_index(ty: &PhysicalType, values: &[Value]) -> Result<Vec<u32>, JonxError> {
    if ty.is_nullable() {
        return Err(JonxError::validation(
            "indexes are never built for nullable columns",
        ));
    }
    if !ty.is_indexable() {
        return Err(JonxError::validation(format!(
            "type {ty} is not indexable"
        )));
    }

    let mut order: Vec<u32> = (0..values.len() as u32).collect();
    order.sort_by(|&a, &b| compare(ty, &values[a as usize], &values[b as usize]));
    Ok(order)
}

/// Natural order comparator for an indexable type (spec §3): numeric types
/// compare numerically; `date`/`datetime` compare lexicographically on
/// their ISO 8601 string form, which coincides with chronological order.
///
/// Floats compare via `f64::total_cmp`, resolving spec §9's open question
/// on `+0.0` vs `-0.0` and NaN ordering: `total_cmp` gives a well-defined
/// total order (`-0.0 < +0.0`), so the indexed and linear-scan extremum
/// paths can use the same comparator and always agree.
pub fn compare(ty: &PhysicalType, a: &Value, b: &Value) -> std::cmp::Ordering {
    if ty.is_float() {
        let fa = a.as_f64().unwrap_or(f64::NAN);
        let fb = b.as_f64().unwrap_or(f64::NAN);
        fa.total_cmp(&fb)
    } else if matches!(ty, PhysicalType::TimestampMs) {
        // Packed as i64 milliseconds, not a string (unlike date/datetime).
        let ia = a.as_i64().unwrap_or(0);
        let ib = b.as_i64().unwrap_or(0);
        ia.cmp(&ib)
    } else if ty.is_signed_integer() {
        let ia = a.as_i64().unwrap_or(0);
        let ib = b.as_i64().unwrap_or(0);
        ia.cmp(&ib)
    } else if ty.is_integer() {
        let ia = a.as_u64().unwrap_or(0);
        let ib = b.as_u64().unwrap_or(0);
        ia.cmp(&ib)
    } else {
        // date / datetime / timestamp_ms-as-string fallback: lexicographic.
        let sa = a.as_str().unwrap_or_default();
        let sb = b.as_str().unwrap_or_default();
        sa.cmp(sb)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn permutation_sorts_and_is_a_bijection() {
        let ty = PhysicalType::Int32;
        let values = vec![json!(5), json!(1), json!(3), json!(1)];
        let perm = build_index(&ty, &values).unwrap();

        let mut seen = vec![false; values.len()];
        for &p in &perm {
            assert!(!seen[p as usize]);
            seen[p as usize] = true;
        }
        assert!(seen.iter().all(|&b| b));

        for w in perm.windows(2) {
            let a = values[w[0] as usize].as_i64().unwrap();
            let b = values[w[1] as usize].as_i64().unwrap();
            assert!(a <= b);
        }
    }

    #[test]
    fn ties_break_by_ascending_original_position() {
        let ty = PhysicalType::Uint8;
        let values = vec![json!(2), json!(1), json!(1), json!(2)];
        let perm = build_index(&ty, &values).unwrap();
        // Positions 1 and 2 both hold 1; 1 must precede 2 in the output.
        let pos_of_1 = perm.iter().position(|&p| p == 1).unwrap();
        let pos_of_2 = perm.iter().position(|&p| p == 2).unwrap();
        assert!(pos_of_1 < pos_of_2);
    }

    #[test]
    fn date_strings_sort_lexicographically() {
        let ty = PhysicalType::Date;
        let values = vec![json!("2024-03-01"), json!("2023-12-31"), json!("2024-01-15")];
        let perm = build_index(&ty, &values).unwrap();
        assert_eq!(perm, vec![1, 2, 0]);
    }

    #[test]
    fn timestamp_ms_orders_numerically_not_lexicographically() {
        // 9 < 10 numerically but "9" > "10" lexicographically; a naive
        // string comparator would get this wrong.
        let ty = PhysicalType::TimestampMs;
        let values = vec![json!(10), json!(9), json!(100)];
        let perm = build_index(&ty, &values).unwrap();
        assert_eq!(perm, vec![1, 0, 2]);
    }

    #[test]
    fn nullable_column_refuses_index() {
        let ty = PhysicalType::Nullable(Box::new(PhysicalType::Int32));
        let err = build_index(&ty, &[json!(1)]).unwrap_err();
        assert!(matches!(err, JonxError::Validation(_)));
    }

    #[test]
    fn non_indexable_type_refuses_index() {
        let ty = PhysicalType::Str;
        let err = build_index(&ty, &[json!("a")]).unwrap_err();
        assert!(matches!(err, JonxError::Validation(_)));
    }
}
