//! File content writes with optional hard-link breaking
//!
//! By default the destination is unlinked before it is recreated, so other
//! hard links to the old inode keep the old content. Writing in place keeps
//! the inode (and with it hard links and extended attributes) instead.

use crate::error::{Error, Result};
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use tracing::debug;

/// Whether [`write_file`] overwrites the existing inode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InPlace {
    /// Overwrite the existing file, keeping hard links and xattrs
    Yes,
    /// Unlink any existing file first (break hard links)
    #[default]
    No,
}

/// Write `data` to `path`
///
/// `data` may be text or binary; it is written verbatim. In both modes the
/// file is truncated first, so shorter content never leaves a stale tail.
///
/// With [`InPlace::No`] a failed write removes the half-written file before
/// returning. With [`InPlace::Yes`] a failed write may leave the existing
/// file partially overwritten.
///
/// # Errors
///
/// Returns `Err(Error)` if:
/// - an existing file cannot be unlinked ([`InPlace::No`])
/// - the file cannot be created or opened
/// - writing fails (e.g. disk full)
///
/// # Examples
///
/// ```rust,no_run
/// use cachefile_util::{write_file, InPlace};
///
/// # fn main() -> cachefile_util::Result<()> {
/// write_file("stats", "0 0 0\n", InPlace::No)?;
/// write_file("entry.bin", [0u8, 1, 2], InPlace::Yes)?;
/// # Ok(())
/// # }
/// ```
pub fn write_file(
    path: impl AsRef<Path>,
    data: impl AsRef<[u8]>,
    in_place: InPlace,
) -> Result<()> {
    let path = path.as_ref();
    let data = data.as_ref();

    if in_place == InPlace::No {
        match fs::remove_file(path) {
            Ok(()) => debug!("Unlinked {} before rewriting it", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => {
                return Err(Error::FileSystem(format!(
                    "Failed to remove {}: {e}",
                    path.display()
                )))
            }
        }
    }

    let mut file = OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
        .map_err(|e| Error::create(path, e))?;

    if let Err(e) = file.write_all(data) {
        drop(file);
        if in_place == InPlace::No {
            if let Err(remove_err) = fs::remove_file(path) {
                debug!("Failed to remove partial {}: {}", path.display(), remove_err);
            }
        }
        return Err(Error::write(path.display(), e));
    }

    Ok(())
}
