//! File framing (spec §4.5, §6): bit-exact byte layout shared by the
//! encoder (`writer`) and the reader's parsing pass (`crate::reader`).

pub mod header;
pub mod schema;
pub mod writer;

pub use schema::{Schema, SchemaReport};
pub use writer::{encode_records, EncodeOptions};
