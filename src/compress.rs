//! Compression collaborator interfaces (spec §6).
//!
//! The core never hard-codes a compression backend; callers inject a
//! `Compressor`/`Decompressor` pair. `ZstdCodec` is the default, backed by
//! the `zstd` crate the same way the donor's WAL archiver compresses its
//! archive blocks (`engine::core::wal::wal_archive`).

use crate::error::JonxError;

/// The compression level the file format is specified against (spec §4.3).
/// The format's byte-exact output depends on this value; it is not
/// configurable per file.
pub const COMPRESSION_LEVEL: i32 = 7;

pub trait Compressor {
    fn compress(&self, bytes: &[u8], level: i32) -> Result<Vec<u8>, JonxError>;
}

pub trait Decompressor {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, JonxError>;
}

/// Default Zstandard-backed implementation of both collaborator traits.
#[derive(Debug, Default, Clone, Copy)]
pub struct ZstdCodec;

impl Compressor for ZstdCodec {
    fn compress(&self, bytes: &[u8], level: i32) -> Result<Vec<u8>, JonxError> {
        zstd::encode_all(bytes, level)
            .map_err(|e| JonxError::encode(format!("zstd compress failed: {e}")))
    }
}

impl Decompressor for ZstdCodec {
    fn decompress(&self, bytes: &[u8]) -> Result<Vec<u8>, JonxError> {
        zstd::decode_all(bytes).map_err(|e| JonxError::decode(format!("zstd decompress failed: {e}")))
    }
}
