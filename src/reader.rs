//! File reader (spec §4.6): lazy, random-access column decompression;
//! sorted ordinal indexes; numeric aggregation and extremum queries.
//!
//! Construction parses the header, the schema block, and the column/index
//! section boundaries eagerly (all O(k) in the field count); no column or
//! index block is decompressed until first requested. Grounded in the
//! donor's `engine::core::read::cache::column_block_cache` /
//! `global_column_handle_cache` pattern of "cache populated on first
//! access", but scoped to a single `Reader` instance via plain
//! `RefCell`/`HashMap` rather than the donor's process-wide `DashMap` /
//! `once_cell::Lazy` globals — spec §5 rules out global state and
//! concurrent-writer requirements for this reader, so there is nothing to
//! share across instances ("a per-column single-producer initialisation
//! cell, no global state", spec §9).

use crate::codec;
use crate::compress::{Decompressor, ZstdCodec};
use crate::error::JonxError;
use crate::frame::header;
use crate::frame::schema::{Schema, SchemaReport};
use crate::index;
use crate::json::{JsonCodec, SerdeJsonCodec};
use crate::types::PhysicalType;
use serde_json::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use tracing::{debug, warn};

/// Result of `Reader::sum`: an exact wide integer accumulator for integer
/// columns, or a double-precision sum for float columns (spec §4.6).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Aggregate {
    Int(i128),
    Float(f64),
}

impl Aggregate {
    pub fn as_f64(&self) -> f64 {
        match self {
            Aggregate::Int(i) => *i as f64,
            Aggregate::Float(f) => *f,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FileInfo {
    pub path: Option<String>,
    pub version: u32,
    pub num_rows: usize,
    pub num_columns: usize,
    pub fields: Vec<String>,
    pub types: HashMap<String, String>,
    pub indexes: Vec<String>,
    pub file_size: usize,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidateReport {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub struct Reader {
    path: Option<String>,
    version: u32,
    file_size: usize,
    schema: Schema,
    column_blocks: HashMap<String, Vec<u8>>,
    index_blocks: HashMap<String, Vec<u8>>,
    decompressor: Box<dyn Decompressor>,
    json: Box<dyn JsonCodec>,
    column_cache: RefCell<HashMap<String, Vec<Value>>>,
    index_cache: RefCell<HashMap<String, Vec<u32>>>,
    num_rows: RefCell<Option<usize>>,
}

impl Reader {
    /// Parses a JONX file already held in memory.
    ///
    /// Like every other `Result`-returning public method on `Reader`, a
    /// failure here is logged (`JonxError::log`) right before it crosses
    /// back out to the caller, mirroring the donor's
    /// `QueryExecutionError::log_error` call sites at its public API
    /// boundary. Methods that build on other public methods internally
    /// (`avg` on `sum`, `info` on `count`, ...) route through private
    /// `_impl` helpers so an error is logged exactly once, at the method
    /// the caller actually invoked, not once per internal hop.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, JonxError> {
        Self::from_bytes_with_decompressor(bytes, Box::new(ZstdCodec), None).map_err(JonxError::log)
    }

    /// Buffers the whole file into memory and parses it (spec §5: "the
    /// file may be memory-mapped; ... fully buffered").
    pub fn open(path: impl AsRef<Path>) -> Result<Self, JonxError> {
        (|| {
            let path = path.as_ref();
            let bytes = fs::read(path)
                .map_err(|e| JonxError::file(format!("failed to read '{}': {e}", path.display())))?;
            Self::from_bytes_with_decompressor(&bytes, Box::new(ZstdCodec), Some(path.display().to_string()))
        })()
        .map_err(JonxError::log)
    }

    fn from_bytes_with_decompressor(
        bytes: &[u8],
        decompressor: Box<dyn Decompressor>,
        path: Option<String>,
    ) -> Result<Self, JonxError> {
        let version = header::read_header(bytes)?;
        let mut pos = header::HEADER_LEN;

        let schema_block = read_block(bytes, &mut pos)?;
        let schema_bytes = decompressor.decompress(schema_block)?;
        let schema = Schema::from_json_bytes(&schema_bytes)?;

        let mut column_blocks = HashMap::with_capacity(schema.fields.len());
        for field in &schema.fields {
            let block = read_block(bytes, &mut pos)?;
            column_blocks.insert(field.clone(), block.to_vec());
        }

        if pos + 4 > bytes.len() {
            return Err(JonxError::decode("truncated file: missing index count"));
        }
        let index_count = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
        pos += 4;

        let mut index_blocks = HashMap::with_capacity(index_count);
        for _ in 0..index_count {
            if pos + 4 > bytes.len() {
                return Err(JonxError::decode("truncated file: missing index name length"));
            }
            let name_len = u32::from_le_bytes(bytes[pos..pos + 4].try_into().unwrap()) as usize;
            pos += 4;
            if pos + name_len > bytes.len() {
                return Err(JonxError::decode("truncated file: missing index name"));
            }
            let name = String::from_utf8(bytes[pos..pos + name_len].to_vec())
                .map_err(|e| JonxError::decode(format!("invalid UTF-8 in index name: {e}")))?;
            pos += name_len;

            let block = read_block(bytes, &mut pos)?;
            index_blocks.insert(name, block.to_vec());
        }

        debug!(
            target: "jonx::reader",
            num_fields = schema.fields.len(),
            num_indexes = index_blocks.len(),
            "parsed JONX file"
        );

        Ok(Reader {
            path,
            version,
            file_size: bytes.len(),
            schema,
            column_blocks,
            index_blocks,
            decompressor,
            json: Box::new(SerdeJsonCodec),
            column_cache: RefCell::new(HashMap::new()),
            index_cache: RefCell::new(HashMap::new()),
            num_rows: RefCell::new(None),
        })
    }

    fn field_type(&self, field: &str) -> Result<&PhysicalType, JonxError> {
        self.schema
            .type_of(field)
            .ok_or_else(|| JonxError::validation(format!("unknown field '{field}'")))
    }

    /// Decompresses and decodes a column, caching the result for the
    /// lifetime of this reader (spec §4.6: "amortised O(1) if cached").
    pub fn get_column(&self, field: &str) -> Result<Vec<Value>, JonxError> {
        self.get_column_impl(field).map_err(JonxError::log)
    }

    fn get_column_impl(&self, field: &str) -> Result<Vec<Value>, JonxError> {
        if let Some(cached) = self.column_cache.borrow().get(field) {
            return Ok(cached.clone());
        }

        let ty = self.field_type(field)?.clone();
        let block = self
            .column_blocks
            .get(field)
            .ok_or_else(|| JonxError::validation(format!("unknown field '{field}'")))?;
        let raw = self.decompressor.decompress(block)?;

        let values = if let Some(n) = *self.num_rows.borrow() {
            codec::decode_column(&ty, &raw, n, &*self.json)?
        } else {
            let values = codec::decode_column_self_describing(&ty, &raw, &*self.json)?;
            *self.num_rows.borrow_mut() = Some(values.len());
            values
        };

        self.column_cache
            .borrow_mut()
            .insert(field.to_string(), values.clone());
        Ok(values)
    }

    /// Equivalent to calling `get_column` per name; order of work is
    /// unspecified (spec §4.6).
    pub fn get_columns(&self, fields: &[&str]) -> Result<HashMap<String, Vec<Value>>, JonxError> {
        fields
            .iter()
            .map(|&f| self.get_column_impl(f).map(|v| (f.to_string(), v)))
            .collect::<Result<_, _>>()
            .map_err(JonxError::log)
    }

    fn get_index(&self, field: &str) -> Result<Option<Vec<u32>>, JonxError> {
        if let Some(cached) = self.index_cache.borrow().get(field) {
            return Ok(Some(cached.clone()));
        }
        let Some(block) = self.index_blocks.get(field) else {
            return Ok(None);
        };
        let raw = self.decompressor.decompress(block)?;
        let perm_value = self.json.decode(&raw)?;
        let perm: Vec<u32> = serde_json::from_value(perm_value)
            .map_err(|e| JonxError::decode(format!("malformed index block: {e}")))?;
        self.index_cache
            .borrow_mut()
            .insert(field.to_string(), perm.clone());
        Ok(Some(perm))
    }

    pub fn has_index(&self, field: &str) -> Result<bool, JonxError> {
        (|| {
            self.field_type(field)?;
            Ok(self.index_blocks.contains_key(field))
        })()
        .map_err(JonxError::log)
    }

    pub fn is_numeric(&self, field: &str) -> Result<bool, JonxError> {
        self.field_type(field).map(|t| t.is_numeric()).map_err(JonxError::log)
    }

    /// `find_min`/`find_max` with `use_index = true` decompress the index
    /// once and return the column's first/last value through the
    /// permutation (O(1) after that); with `use_index = false` (or no
    /// index present) they fall back to a linear scan using the same
    /// comparator, so both paths always agree (spec §8 "Extremum
    /// equivalence").
    ///
    /// For `nullable<T>` columns, nulls are skipped; a column that is all
    /// nulls is a `ValidationError` (spec §4.6 leaves this
    /// implementation-defined; see SPEC_FULL.md §9).
    pub fn find_min(&self, field: &str, use_index: bool) -> Result<Value, JonxError> {
        self.find_extremum(field, use_index, true).map_err(JonxError::log)
    }

    pub fn find_max(&self, field: &str, use_index: bool) -> Result<Value, JonxError> {
        self.find_extremum(field, use_index, false).map_err(JonxError::log)
    }

    fn find_extremum(&self, field: &str, use_index: bool, want_min: bool) -> Result<Value, JonxError> {
        let ty = self.field_type(field)?.clone();
        let values = self.get_column_impl(field)?;

        if use_index {
            if let Some(perm) = self.get_index(field)? {
                let non_null_perm: Vec<u32> = perm
                    .into_iter()
                    .filter(|&p| !values[p as usize].is_null())
                    .collect();
                let chosen = if want_min {
                    non_null_perm.first()
                } else {
                    non_null_perm.last()
                };
                return match chosen {
                    Some(&p) => Ok(values[p as usize].clone()),
                    None => Err(JonxError::validation(format!(
                        "field '{field}' has no non-null values"
                    ))),
                };
            }
        }

        let base_ty = ty.inner();
        let mut best: Option<&Value> = None;
        for v in values.iter() {
            if v.is_null() {
                continue;
            }
            best = Some(match best {
                None => v,
                Some(cur) => {
                    let ord = index::compare(base_ty, v, cur);
                    if (want_min && ord.is_lt()) || (!want_min && ord.is_gt()) {
                        v
                    } else {
                        cur
                    }
                }
            });
        }
        best.cloned()
            .ok_or_else(|| JonxError::validation(format!("field '{field}' has no non-null values")))
    }

    /// Defined only when `field`'s type `is_numeric` (spec §4.6).
    pub fn sum(&self, field: &str) -> Result<Aggregate, JonxError> {
        self.sum_impl(field).map_err(JonxError::log)
    }

    fn sum_impl(&self, field: &str) -> Result<Aggregate, JonxError> {
        let ty = self.field_type(field)?.clone();
        if !ty.is_numeric() {
            return Err(JonxError::validation(format!(
                "field '{field}' is not numeric"
            )));
        }
        let values = self.get_column_impl(field)?;
        let non_null: Vec<&Value> = values.iter().filter(|v| !v.is_null()).collect();
        if non_null.is_empty() {
            return Err(JonxError::validation(format!(
                "field '{field}' has no non-null values to sum"
            )));
        }

        if ty.inner().is_integer() {
            let mut acc: i128 = 0;
            for v in &non_null {
                let n = v
                    .as_i64()
                    .map(|n| n as i128)
                    .or_else(|| v.as_u64().map(|n| n as i128))
                    .ok_or_else(|| JonxError::validation(format!("non-integer value in field '{field}'")))?;
                acc += n;
            }
            Ok(Aggregate::Int(acc))
        } else {
            let mut acc = 0.0f64;
            for v in &non_null {
                acc += v
                    .as_f64()
                    .ok_or_else(|| JonxError::validation(format!("non-numeric value in field '{field}'")))?;
            }
            Ok(Aggregate::Float(acc))
        }
    }

    pub fn avg(&self, field: &str) -> Result<f64, JonxError> {
        self.avg_impl(field).map_err(JonxError::log)
    }

    /// `avg(f) = sum(f) / N`, where `N` is the column's row count (spec §8's
    /// aggregate law `avg(f)·N = sum(f)`) — not the count of non-null
    /// entries. `sum_impl` already rejects an all-null (or truly empty)
    /// column as "no non-null values", which doubles as this operation's
    /// empty-column error.
    fn avg_impl(&self, field: &str) -> Result<f64, JonxError> {
        let n = self.count_impl(None)?;
        if n == 0 {
            return Err(JonxError::validation(format!(
                "field '{field}' is empty"
            )));
        }
        Ok(self.sum_impl(field)?.as_f64() / n as f64)
    }

    /// With no field name, returns `N`; with a field name, returns that
    /// column's length, which equals `N` by invariant (spec §4.6 — kept
    /// for API symmetry).
    pub fn count(&self, field: Option<&str>) -> Result<usize, JonxError> {
        self.count_impl(field).map_err(JonxError::log)
    }

    fn count_impl(&self, field: Option<&str>) -> Result<usize, JonxError> {
        match field {
            Some(f) => Ok(self.get_column_impl(f)?.len()),
            None => {
                if let Some(n) = *self.num_rows.borrow() {
                    return Ok(n);
                }
                let first = self
                    .schema
                    .fields
                    .first()
                    .ok_or_else(|| JonxError::validation("schema has no fields"))?
                    .clone();
                Ok(self.get_column_impl(&first)?.len())
            }
        }
    }

    pub fn info(&self) -> Result<FileInfo, JonxError> {
        self.info_impl().map_err(JonxError::log)
    }

    fn info_impl(&self) -> Result<FileInfo, JonxError> {
        Ok(FileInfo {
            path: self.path.clone(),
            version: self.version,
            num_rows: self.count_impl(None)?,
            num_columns: self.schema.fields.len(),
            fields: self.schema.fields.clone(),
            types: self
                .schema
                .types
                .iter()
                .map(|(k, v)| (k.clone(), v.to_string()))
                .collect(),
            indexes: self.index_blocks.keys().cloned().collect(),
            file_size: self.file_size,
        })
    }

    pub fn check_schema(&self) -> SchemaReport {
        self.schema.check()
    }

    /// Decompresses every column block and every index block, verifying
    /// each decoded column has length `N` and each index is a permutation
    /// of `[0,N)`; aggregates rather than short-circuits (spec §4.6, §7).
    pub fn validate(&self) -> ValidateReport {
        let schema_report = self.check_schema();
        let mut errors = schema_report.errors.clone();
        let mut warnings = schema_report.warnings.clone();

        let n = match self.count(None) {
            Ok(n) => Some(n),
            Err(e) => {
                errors.push(format!("failed to determine row count: {e}"));
                None
            }
        };

        for field in &self.schema.fields {
            match self.get_column(field) {
                Ok(values) => {
                    if let Some(n) = n {
                        if values.len() != n {
                            errors.push(format!(
                                "column '{field}' has length {} but file has {n} rows",
                                values.len()
                            ));
                        }
                    }
                }
                Err(e) => errors.push(format!("column '{field}' failed to decode: {e}")),
            }
        }

        for field in self.index_blocks.keys() {
            match self.get_index(field) {
                Ok(Some(perm)) => {
                    if let Some(n) = n {
                        if !is_permutation(&perm, n) {
                            errors.push(format!("index for '{field}' is not a permutation of [0,{n})"));
                        }
                    }
                }
                Ok(None) => warnings.push(format!("index for '{field}' vanished during validation")),
                Err(e) => errors.push(format!("index for '{field}' failed to decode: {e}")),
            }
        }

        if !errors.is_empty() {
            warn!(target: "jonx::reader", errors = errors.len(), "validate() found problems");
        }

        ValidateReport {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}

fn is_permutation(perm: &[u32], n: usize) -> bool {
    if perm.len() != n {
        return false;
    }
    let mut seen = vec![false; n];
    for &p in perm {
        match seen.get_mut(p as usize) {
            Some(slot) if !*slot => *slot = true,
            _ => return false,
        }
    }
    true
}

/// Reads a 32-bit little-endian length-prefixed block, advancing `pos`.
/// Misalignment or truncation is a fatal structural error (spec §4.5).
fn read_block<'a>(bytes: &'a [u8], pos: &mut usize) -> Result<&'a [u8], JonxError> {
    if *pos + 4 > bytes.len() {
        return Err(JonxError::decode("truncated file: missing block length prefix"));
    }
    let len = u32::from_le_bytes(bytes[*pos..*pos + 4].try_into().unwrap()) as usize;
    *pos += 4;
    if *pos + len > bytes.len() {
        return Err(JonxError::decode("truncated file: block shorter than declared length"));
    }
    let block = &bytes[*pos..*pos + len];
    *pos += len;
    Ok(block)
}
