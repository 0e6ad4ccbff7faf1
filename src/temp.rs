//! Scoped temporary files for atomic replacement
//!
//! A [`TemporaryFile`] lives next to its final destination so that the
//! closing rename never crosses a filesystem boundary. The file is removed
//! when the guard is dropped unless [`TemporaryFile::persist`] moved it into
//! place first, so error paths cannot leave stray temporary files behind.

use crate::error::{Error, Result};
use std::ffi::OsString;
use std::fs::File;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};
use tracing::debug;

/// Marker placed between the destination name and the random suffix
pub const TMP_FILE_INFIX: &str = "tmp.";

/// Number of random characters in a temporary file name
const RANDOM_SUFFIX_LEN: usize = 6;

/// Directory that will hold a sibling of `path`
pub(crate) fn parent_dir(path: &Path) -> &Path {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."))
}

/// A uniquely named file that is deleted on drop unless persisted
#[derive(Debug)]
pub struct TemporaryFile {
    inner: NamedTempFile,
}

impl TemporaryFile {
    /// Create `<path_prefix>.tmp.<random>` in the directory of `path_prefix`
    ///
    /// On Unix the file is created with mode `0666` minus the umask, the
    /// same as an ordinary newly created file, rather than `0600`.
    ///
    /// # Errors
    ///
    /// Returns an error if `path_prefix` has no file name or the file cannot
    /// be created (missing directory, permission denied, ...).
    pub fn create(path_prefix: &Path) -> Result<Self> {
        let file_name = path_prefix.file_name().ok_or_else(|| {
            Error::FileSystem(format!("{} has no file name", path_prefix.display()))
        })?;
        let mut prefix = OsString::from(file_name);
        prefix.push(".");
        prefix.push(TMP_FILE_INFIX);

        let mut builder = Builder::new();
        builder.prefix(&prefix).rand_bytes(RANDOM_SUFFIX_LEN);
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        let inner = builder
            .tempfile_in(parent_dir(path_prefix))
            .map_err(|e| Error::create(path_prefix, e))?;
        Ok(Self { inner })
    }

    /// Current location of the temporary file
    #[must_use]
    pub fn path(&self) -> &Path {
        self.inner.path()
    }

    /// The open file, for writing
    #[must_use]
    pub fn as_file(&self) -> &File {
        self.inner.as_file()
    }

    /// Atomically rename the temporary file to `dest`
    ///
    /// # Errors
    ///
    /// Returns [`Error::Rename`] if the rename fails; the temporary file is
    /// removed in that case.
    pub fn persist(self, dest: &Path) -> Result<()> {
        let tmp_path = self.inner.path().to_path_buf();
        self.inner.persist(dest).map_err(|e| Error::Rename {
            from: tmp_path.clone(),
            to: dest.to_path_buf(),
            source: e.error,
        })?;
        debug!("Renamed {} to {}", tmp_path.display(), dest.display());
        Ok(())
    }
}
