//! Whole-file and partial file reads
//!
//! Every function exists in a byte flavor and a text flavor. The text
//! flavor runs the bytes through [`decode_text`], which transcodes
//! UTF-16LE content with a byte order mark to UTF-8.

use crate::encoding::decode_text;
use crate::error::{Error, Result};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use tracing::debug;

/// Initial buffer for partial reads of files without a meaningful length
const UNSIZED_READ_CAPACITY: usize = 64 * 1024;

/// Read the entire content of `path`
///
/// A nonzero `size_hint` is taken as the expected file size and saves a
/// `fstat` call. It only sizes the buffer; the number of bytes actually read
/// always determines the result.
///
/// # Errors
///
/// Returns `Err(Error)` if:
/// - `path` cannot be opened
/// - the file metadata cannot be retrieved (only when `size_hint` is 0)
/// - a read fails
///
/// # Examples
///
/// ```rust,no_run
/// use cachefile_util::read_file;
///
/// # fn main() -> cachefile_util::Result<()> {
/// let content = read_file("cache/a/b.o", 0)?;
/// println!("Read {} bytes", content.len());
/// # Ok(())
/// # }
/// ```
pub fn read_file(path: impl AsRef<Path>, size_hint: usize) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| Error::open(path, e))?;

    let expected = if size_hint == 0 {
        let len = file
            .metadata()
            .map_err(|e| Error::read(path.display(), e))?
            .len();
        usize::try_from(len).unwrap_or(usize::MAX)
    } else {
        size_hint
    };

    // One extra byte so the final zero-length read does not force a regrow.
    // A hint too large to allocate up front is ignored; the buffer then grows
    // with what is actually read.
    let mut content = Vec::new();
    if let Err(e) = content.try_reserve_exact(expected.saturating_add(1)) {
        debug!("Not preallocating {expected} bytes for {}: {e}", path.display());
    }
    file.read_to_end(&mut content)
        .map_err(|e| Error::read(path.display(), e))?;

    Ok(content)
}

/// Read the entire content of `path` as text
///
/// # Errors
///
/// Same as [`read_file`], plus [`Error::Decode`] when the content is
/// neither valid UTF-8 nor UTF-16LE with a byte order mark.
pub fn read_file_to_string(path: impl AsRef<Path>, size_hint: usize) -> Result<String> {
    let path = path.as_ref();
    decode_text(path, read_file(path, size_hint)?)
}

/// Read at most `count` bytes of `path` starting at byte `pos`
///
/// Reaching end of file early is not an error; a `pos` at or past the end
/// gives an empty result.
///
/// # Errors
///
/// Returns `Err(Error)` if the file cannot be opened, inspected, seeked or
/// read.
pub fn read_file_part(path: impl AsRef<Path>, pos: u64, count: usize) -> Result<Vec<u8>> {
    let path = path.as_ref();
    let mut file = File::open(path).map_err(|e| Error::open(path, e))?;
    let metadata = file
        .metadata()
        .map_err(|e| Error::read(path.display(), e))?;
    // Seeking far past the end can fail with EINVAL on some filesystems, so
    // out-of-range offsets into regular files are answered without seeking.
    if count == 0 || (metadata.is_file() && pos >= metadata.len()) {
        return Ok(Vec::new());
    }

    let capacity = if metadata.is_file() {
        usize::try_from(metadata.len() - pos).map_or(count, |a| a.min(count))
    } else {
        count.min(UNSIZED_READ_CAPACITY)
    };

    file.seek(SeekFrom::Start(pos))
        .map_err(|e| Error::read(format!("{} at offset {pos}", path.display()), e))?;

    let mut content = Vec::with_capacity(capacity);
    file.take(count as u64)
        .read_to_end(&mut content)
        .map_err(|e| Error::read(format!("{} at offset {pos}", path.display()), e))?;

    Ok(content)
}

/// Read at most `count` bytes of `path` starting at `pos`, as text
///
/// The decoding rules of [`read_file_to_string`] apply to the slice that was
/// actually read, so a byte order mark is only recognized at `pos`.
///
/// # Errors
///
/// Same as [`read_file_part`], plus [`Error::Decode`] for undecodable
/// content (including a slice that cuts a multi-byte character).
pub fn read_file_part_to_string(
    path: impl AsRef<Path>,
    pos: u64,
    count: usize,
) -> Result<String> {
    let path = path.as_ref();
    decode_text(path, read_file_part(path, pos, count)?)
}
