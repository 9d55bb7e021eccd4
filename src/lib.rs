//! JONX: a columnar binary container for homogeneous JSON record sets.
//!
//! A JONX file packs a list of same-shaped JSON objects column-by-column,
//! compresses each column independently, and appends sorted-ordinal
//! indexes for numeric and temporal columns so that `find_min`/`find_max`
//! can answer without a full scan. [`frame::encode_records`] builds a file
//! from records; [`reader::Reader`] opens one back up for querying.
//!
//! Layered the way the donor crate layers its storage engine: a type
//! catalogue and codec layer at the bottom, a framing layer for on-disk
//! shape, and a reader on top that never decompresses a block it hasn't
//! been asked for.

pub mod codec;
pub mod compress;
pub mod error;
pub mod frame;
pub mod index;
pub mod infer;
pub mod json;
pub mod reader;
pub mod types;

pub use compress::{Compressor, Decompressor, ZstdCodec};
pub use error::{JonxError, JonxResult};
pub use frame::{encode_records, EncodeOptions, Schema, SchemaReport};
pub use json::{JsonCodec, SerdeJsonCodec};
pub use reader::{Aggregate, FileInfo, Reader, ValidateReport};
pub use types::PhysicalType;
