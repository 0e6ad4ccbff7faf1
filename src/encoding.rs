//! Text decoding for file reads
//!
//! Some native tools write text as UTF-16LE with a byte order mark. Text reads
//! recognize that marker and transcode the rest of the content to UTF-8;
//! anything else must already be UTF-8. The conversion is only ever applied
//! on read.

use crate::error::{Error, Result};
use std::path::Path;

/// Byte order mark of UTF-16 little-endian text
pub const UTF16LE_BOM: [u8; 2] = [0xFF, 0xFE];

/// Turn raw file bytes into a `String`
///
/// `path` is only used to name the file in error messages.
///
/// # Errors
///
/// Returns [`Error::Decode`] if UTF-16LE content has an odd length or an
/// unpaired surrogate, or if other content is not valid UTF-8.
pub fn decode_text(path: &Path, bytes: Vec<u8>) -> Result<String> {
    if let Some(utf16) = bytes.strip_prefix(&UTF16LE_BOM) {
        return decode_utf16le(path, utf16);
    }
    String::from_utf8(bytes).map_err(|e| Error::decode(path, e.to_string()))
}

fn decode_utf16le(path: &Path, bytes: &[u8]) -> Result<String> {
    if bytes.len() % 2 != 0 {
        return Err(Error::decode(
            path,
            format!("UTF-16LE content has odd length {}", bytes.len() + 2),
        ));
    }
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_le_bytes([pair[0], pair[1]]));
    char::decode_utf16(units)
        .collect::<std::result::Result<String, _>>()
        .map_err(|e| Error::decode(path, e.to_string()))
}
