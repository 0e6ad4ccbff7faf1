//! File copying, optionally through a temporary file
//!
//! A direct copy truncates and rewrites the destination. A copy via a
//! temporary file writes a sibling of the destination and renames it over
//! the destination, so readers see either the old or the new content and
//! never a partial file.
//!
//! # Usage
//!
//! ```rust,no_run
//! use cachefile_util::{copy_file, ViaTmpFile};
//!
//! # fn main() -> cachefile_util::Result<()> {
//! // Atomic replace of an object file that other processes may be reading
//! copy_file("build/foo.o", "cache/f/oo.o", ViaTmpFile::Yes)?;
//! # Ok(())
//! # }
//! ```

use crate::error::{Error, Result};
use crate::temp::TemporaryFile;
use std::fs::{File, OpenOptions};
use std::path::Path;

/// Whether [`copy_file`] goes through a temporary file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ViaTmpFile {
    /// Copy to a temporary file, then rename it to the destination
    Yes,
    /// Copy straight into the destination
    #[default]
    No,
}

/// Copy the content of `src` to `dest`
///
/// # Errors
///
/// Returns `Err(Error)` if:
/// - `src` cannot be opened or read
/// - `dest` (or the temporary file) cannot be created or written
/// - the final rename fails
///
/// With [`ViaTmpFile::Yes`] the temporary file is removed on every error
/// path.
pub fn copy_file(
    src: impl AsRef<Path>,
    dest: impl AsRef<Path>,
    via_tmp_file: ViaTmpFile,
) -> Result<()> {
    let src = src.as_ref();
    let dest = dest.as_ref();
    let src_file = File::open(src).map_err(|e| Error::open(src, e))?;

    match via_tmp_file {
        ViaTmpFile::Yes => {
            let tmp = TemporaryFile::create(dest)?;
            stream(&src_file, src, tmp.as_file(), tmp.path())?;
            tmp.persist(dest)
        }
        ViaTmpFile::No => {
            let dest_file = OpenOptions::new()
                .write(true)
                .create(true)
                .truncate(true)
                .open(dest)
                .map_err(|e| Error::create(dest, e))?;
            stream(&src_file, src, &dest_file, dest)
        }
    }
}

/// Pump everything from `src` into `dest`, naming the paths in errors
#[cfg(unix)]
fn stream(src: &File, src_path: &Path, dest: &File, dest_path: &Path) -> Result<()> {
    use crate::fd::{read_fd, write_fd};

    read_fd(src, |chunk| write_fd(dest, chunk)).map_err(|e| match e {
        Error::Read { source, .. } => Error::read(src_path.display(), source),
        Error::Write { source, .. } => Error::write(dest_path.display(), source),
        other => other,
    })
}

#[cfg(not(unix))]
fn stream(mut src: &File, src_path: &Path, mut dest: &File, dest_path: &Path) -> Result<()> {
    std::io::copy(&mut src, &mut dest).map(drop).map_err(|e| {
        Error::FileSystem(format!(
            "Failed to copy {} to {}: {e}",
            src_path.display(),
            dest_path.display()
        ))
    })
}
