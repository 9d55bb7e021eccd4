//! File header (spec §6): 4-byte signature `JONX` + 32-bit little-endian
//! version, currently `1`. Unknown versions are a fatal decode error.
//!
//! Grounded in the donor's `shared::storage_header::{BinaryHeader,
//! MagicFile}`: magic bytes validated up front, then the version checked,
//! before any further parsing is attempted. Spec §6 fixes the header at
//! exactly these 8 bytes (no flags or CRC field, unlike the donor's
//! 20-byte header), so this module keeps the donor's "validate magic, then
//! version, fail fast" discipline but drops the flags/reserved/CRC32
//! fields entirely.

use crate::error::JonxError;

pub const SIGNATURE: [u8; 4] = *b"JONX";
pub const VERSION: u32 = 1;
pub const HEADER_LEN: usize = 8;

pub fn write_header(out: &mut Vec<u8>) {
    out.extend_from_slice(&SIGNATURE);
    out.extend_from_slice(&VERSION.to_le_bytes());
}

/// Validates the signature and version, returning the version on success.
/// Any mismatch is a `JonxError::Decode` — the reader never silently
/// reinterprets a malformed header (spec §7).
pub fn read_header(bytes: &[u8]) -> Result<u32, JonxError> {
    if bytes.len() < HEADER_LEN {
        return Err(JonxError::decode("truncated file: header shorter than 8 bytes"));
    }
    let sig = &bytes[0..4];
    if sig != SIGNATURE {
        return Err(JonxError::decode(format!(
            "bad signature: expected {:?}, got {:?}",
            SIGNATURE, sig
        )));
    }
    let version = u32::from_le_bytes(bytes[4..8].try_into().unwrap());
    if version != VERSION {
        return Err(JonxError::decode(format!(
            "unsupported version: {version}"
        )));
    }
    Ok(version)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let mut buf = Vec::new();
        write_header(&mut buf);
        assert_eq!(buf.len(), HEADER_LEN);
        assert_eq!(read_header(&buf).unwrap(), VERSION);
    }

    #[test]
    fn bad_signature_is_decode_error() {
        let mut buf = vec![0u8; HEADER_LEN];
        let err = read_header(&buf).unwrap_err();
        assert!(matches!(err, JonxError::Decode(_)));
        buf[0] = b'J';
        assert!(read_header(&buf).is_err());
    }

    #[test]
    fn unknown_version_is_decode_error() {
        let mut buf = Vec::new();
        write_header(&mut buf);
        buf[4] = 0xff;
        let err = read_header(&buf).unwrap_err();
        assert!(matches!(err, JonxError::Decode(_)));
    }

    #[test]
    fn truncated_header_is_decode_error() {
        assert!(read_header(&[b'J', b'O', b'N']).is_err());
    }
}
