//! Best-effort metadata operations
//!
//! Failures here never abort the caller's main task. Each function logs a
//! failure at debug level and hands it back as an optional diagnostic, which
//! callers are free to ignore.

use crate::error::Error;
use crate::write::{write_file, InPlace};
use filetime::FileTime;
use std::fs;
use std::path::Path;
use std::time::SystemTime;
use tracing::debug;

/// File name of a cache directory tag
pub const CACHEDIR_TAG_NAME: &str = "CACHEDIR.TAG";

/// Content of a cache directory tag
///
/// Backup and indexing tools look for the signature line, so this must
/// never change. See <https://bford.info/cachedir/>.
pub const CACHEDIR_TAG_CONTENT: &str = "Signature: 8a477f597d28d172789f06886806bc55\n\
# This file is a cache directory tag.\n\
# For information about cache directory tags, see:\n\
#\thttps://bford.info/cachedir/\n";

/// Set the modification and access times of `path`
///
/// `mtime` defaults to the current time and `atime` defaults to whatever
/// `mtime` resolved to.
pub fn set_timestamps(
    path: impl AsRef<Path>,
    mtime: Option<SystemTime>,
    atime: Option<SystemTime>,
) -> Option<Error> {
    let path = path.as_ref();
    let mtime = mtime.unwrap_or_else(SystemTime::now);
    let atime = atime.unwrap_or(mtime);

    let result = filetime::set_file_times(
        path,
        FileTime::from_system_time(atime),
        FileTime::from_system_time(mtime),
    );
    match result {
        Ok(()) => None,
        Err(e) => {
            debug!("Failed to set timestamps of {}: {}", path.display(), e);
            Some(Error::FileSystem(format!(
                "Failed to set timestamps of {}: {e}",
                path.display()
            )))
        }
    }
}

/// Mark `dir` as a cache directory by writing a `CACHEDIR.TAG` file
///
/// An existing tag is left untouched.
pub fn create_cachedir_tag(dir: impl AsRef<Path>) -> Option<Error> {
    let path = dir.as_ref().join(CACHEDIR_TAG_NAME);
    if fs::symlink_metadata(&path).is_ok() {
        return None;
    }

    match write_file(&path, CACHEDIR_TAG_CONTENT, InPlace::No) {
        Ok(()) => None,
        Err(e) => {
            debug!("Failed to create {}: {}", path.display(), e);
            Some(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, UNIX_EPOCH};
    use tempfile::TempDir;

    fn times(path: &Path) -> (FileTime, FileTime) {
        let metadata = fs::metadata(path).unwrap();
        (
            FileTime::from_last_modification_time(&metadata),
            FileTime::from_last_access_time(&metadata),
        )
    }

    #[test]
    fn test_set_explicit_timestamps() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("f");
        fs::write(&path, "x")?;

        let mtime = UNIX_EPOCH + Duration::from_secs(1_600_000_000);
        let atime = UNIX_EPOCH + Duration::from_secs(1_500_000_000);
        assert!(set_timestamps(&path, Some(mtime), Some(atime)).is_none());

        let (m, a) = times(&path);
        assert_eq!(m.unix_seconds(), 1_600_000_000);
        assert_eq!(a.unix_seconds(), 1_500_000_000);
        Ok(())
    }

    #[test]
    fn test_atime_defaults_to_mtime() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("f");
        fs::write(&path, "x")?;

        let mtime = UNIX_EPOCH + Duration::from_secs(1_234_567_890);
        assert!(set_timestamps(&path, Some(mtime), None).is_none());

        let (m, a) = times(&path);
        assert_eq!(m.unix_seconds(), 1_234_567_890);
        assert_eq!(a.unix_seconds(), 1_234_567_890);
        Ok(())
    }

    #[test]
    fn test_mtime_defaults_to_now() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("f");
        fs::write(&path, "x")?;
        filetime::set_file_times(&path, FileTime::zero(), FileTime::zero())?;

        let before = FileTime::now().unix_seconds();
        assert!(set_timestamps(&path, None, None).is_none());
        let after = FileTime::now().unix_seconds();

        let (m, a) = times(&path);
        assert!(m.unix_seconds() >= before - 1 && m.unix_seconds() <= after + 1);
        assert_eq!(m.unix_seconds(), a.unix_seconds());
        Ok(())
    }

    #[test]
    fn test_set_timestamps_on_missing_file_reports() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let diagnostic = set_timestamps(temp_dir.path().join("missing"), None, None);
        assert!(diagnostic.is_some());
        Ok(())
    }

    #[test]
    fn test_create_cachedir_tag() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(create_cachedir_tag(temp_dir.path()).is_none());

        let content = fs::read_to_string(temp_dir.path().join(CACHEDIR_TAG_NAME))?;
        assert_eq!(content, CACHEDIR_TAG_CONTENT);
        assert!(content.starts_with("Signature: 8a477f597d28d172789f06886806bc55\n"));
        Ok(())
    }

    #[test]
    fn test_create_cachedir_tag_keeps_existing() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let tag = temp_dir.path().join(CACHEDIR_TAG_NAME);
        fs::write(&tag, "custom")?;

        assert!(create_cachedir_tag(temp_dir.path()).is_none());
        assert_eq!(fs::read_to_string(&tag)?, "custom");
        Ok(())
    }

    #[test]
    fn test_create_cachedir_tag_in_missing_dir_reports() -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(create_cachedir_tag(temp_dir.path().join("missing")).is_some());
        Ok(())
    }
}
