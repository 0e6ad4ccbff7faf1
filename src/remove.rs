//! File removal, plain and NFS-safe
//!
//! Both variants report whether a file was actually removed. A path that
//! does not exist is a successful `Ok(false)`, which makes them idempotent.
//! Other failures come back as the raw [`io::Error`] so callers can look at
//! the system error code.
//!
//! `unlink(2)` on NFS is not atomic: when another client holds the file
//! open, the server may keep it around under a `.nfsXXXX` "silly rename"
//! name, and concurrent unlinks can race. [`remove_nfs_safe`] therefore
//! first renames the file to a unique sibling name (rename is atomic on NFS)
//! and only then unlinks that name.

use std::ffi::OsString;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Marker placed in the name a file is renamed to before it is unlinked
const RM_INFIX: &str = "rm.";

/// Whether removal failures are logged
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFailure {
    /// Emit a warning for failures
    #[default]
    Yes,
    /// Stay quiet; the caller handles the error
    No,
}

fn is_absent(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::NotFound || is_stale_handle(err)
}

// NFS reports ESTALE for files that vanished on the server.
#[cfg(unix)]
fn is_stale_handle(err: &io::Error) -> bool {
    err.raw_os_error() == Some(libc::ESTALE)
}

#[cfg(not(unix))]
fn is_stale_handle(_err: &io::Error) -> bool {
    false
}

#[cfg(unix)]
fn is_a_directory() -> io::Error {
    io::Error::from_raw_os_error(libc::EISDIR)
}

#[cfg(not(unix))]
fn is_a_directory() -> io::Error {
    io::Error::from(io::ErrorKind::IsADirectory)
}

fn report(log_failure: LogFailure, what: &str, path: &Path, err: &io::Error) {
    if log_failure == LogFailure::Yes {
        warn!("Failed to {} {}: {}", what, path.display(), err);
    }
}

/// Remove `path` (non-directory), NFS hazardous
///
/// Use only for files that are never shared with other hosts.
///
/// # Errors
///
/// Returns the underlying [`io::Error`] for anything other than a missing
/// file, e.g. permission denied or `path` being a directory.
pub fn remove(path: impl AsRef<Path>, log_failure: LogFailure) -> io::Result<bool> {
    let path = path.as_ref();
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed {}", path.display());
            Ok(true)
        }
        Err(e) if is_absent(&e) => Ok(false),
        Err(e) => {
            report(log_failure, "remove", path, &e);
            Err(e)
        }
    }
}

/// Unique sibling name `<path>.rm.<random>` for `path`
fn removal_name(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map_or_else(OsString::new, |n| n.to_os_string());
    name.push(format!(".{RM_INFIX}{:016x}", rand::random::<u64>()));
    path.with_file_name(name)
}

/// Remove `path` (non-directory), NFS safe
///
/// The file is renamed to a unique sibling name and that name is unlinked.
/// Once the rename succeeded the original name is gone, so the call reports
/// `Ok(true)` even if the final unlink fails (that failure is only logged).
///
/// # Errors
///
/// Returns the underlying [`io::Error`] for anything other than a missing
/// file. Directories are refused with `EISDIR` before anything is renamed.
pub fn remove_nfs_safe(path: impl AsRef<Path>, log_failure: LogFailure) -> io::Result<bool> {
    let path = path.as_ref();

    match fs::symlink_metadata(path) {
        Ok(metadata) if metadata.is_dir() => {
            let err = is_a_directory();
            report(log_failure, "remove", path, &err);
            return Err(err);
        }
        Ok(_) => {}
        Err(e) if is_absent(&e) => return Ok(false),
        Err(e) => {
            report(log_failure, "remove", path, &e);
            return Err(e);
        }
    }

    let tmp_name = removal_name(path);
    match fs::rename(path, &tmp_name) {
        Ok(()) => {}
        // Removed by someone else in the meantime.
        Err(e) if is_absent(&e) => return Ok(false),
        Err(e) => {
            report(log_failure, "rename for removal", path, &e);
            return Err(e);
        }
    }

    match fs::remove_file(&tmp_name) {
        Ok(()) => debug!("Removed {} via {}", path.display(), tmp_name.display()),
        Err(e) if is_absent(&e) => {}
        Err(e) => report(log_failure, "remove", &tmp_name, &e),
    }
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use tempfile::TempDir;

    type RemoveFn = fn(&Path, LogFailure) -> io::Result<bool>;

    fn plain(path: &Path, log_failure: LogFailure) -> io::Result<bool> {
        remove(path, log_failure)
    }

    fn nfs_safe(path: &Path, log_failure: LogFailure) -> io::Result<bool> {
        remove_nfs_safe(path, log_failure)
    }

    fn entries(dir: &Path) -> Vec<String> {
        let mut names: Vec<String> = fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[rstest]
    #[case::plain(plain as RemoveFn)]
    #[case::nfs_safe(nfs_safe as RemoveFn)]
    fn test_remove_is_idempotent(#[case] remove_fn: RemoveFn) -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let path = temp_dir.path().join("victim");
        fs::write(&path, "data")?;

        assert!(remove_fn(&path, LogFailure::Yes)?);
        assert!(!remove_fn(&path, LogFailure::Yes)?);
        assert!(!path.exists());
        assert!(entries(temp_dir.path()).is_empty());
        Ok(())
    }

    #[rstest]
    #[case::plain(plain as RemoveFn)]
    #[case::nfs_safe(nfs_safe as RemoveFn)]
    fn test_remove_missing_is_false(#[case] remove_fn: RemoveFn) -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        assert!(!remove_fn(&temp_dir.path().join("never-existed"), LogFailure::No)?);
        Ok(())
    }

    #[rstest]
    #[case::plain(plain as RemoveFn)]
    #[case::nfs_safe(nfs_safe as RemoveFn)]
    fn test_remove_directory_is_error(#[case] remove_fn: RemoveFn) -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let dir = temp_dir.path().join("dir");
        fs::create_dir(&dir)?;

        assert!(remove_fn(&dir, LogFailure::No).is_err());
        assert!(dir.is_dir());
        assert_eq!(entries(temp_dir.path()), vec!["dir"]);
        Ok(())
    }

    #[cfg(unix)]
    #[rstest]
    #[case::plain(plain as RemoveFn)]
    #[case::nfs_safe(nfs_safe as RemoveFn)]
    fn test_remove_symlink_keeps_target(#[case] remove_fn: RemoveFn) -> anyhow::Result<()> {
        let temp_dir = TempDir::new()?;
        let target = temp_dir.path().join("target");
        let link = temp_dir.path().join("link");
        fs::write(&target, "data")?;
        std::os::unix::fs::symlink(&target, &link)?;

        assert!(remove_fn(&link, LogFailure::Yes)?);
        assert!(target.exists());
        assert_eq!(entries(temp_dir.path()), vec!["target"]);
        Ok(())
    }

    #[cfg(unix)]
    #[rstest]
    #[case::plain(plain as RemoveFn)]
    #[case::nfs_safe(nfs_safe as RemoveFn)]
    fn test_remove_permission_denied_carries_code(
        #[case] remove_fn: RemoveFn,
    ) -> anyhow::Result<()> {
        use std::os::unix::fs::PermissionsExt;

        // Root ignores directory permissions.
        if unsafe { libc::geteuid() } == 0 {
            return Ok(());
        }
        let temp_dir = TempDir::new()?;
        let locked = temp_dir.path().join("locked");
        fs::create_dir(&locked)?;
        let path = locked.join("file");
        fs::write(&path, "data")?;
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o555))?;

        let result = remove_fn(&path, LogFailure::No);
        fs::set_permissions(&locked, fs::Permissions::from_mode(0o755))?;

        let err = result.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
        assert!(path.exists());
        Ok(())
    }

    #[test]
    fn test_removal_name_is_unique_sibling() {
        let a = removal_name(Path::new("/cache/a/b.o"));
        let b = removal_name(Path::new("/cache/a/b.o"));
        assert_ne!(a, b);
        assert_eq!(a.parent(), Some(Path::new("/cache/a")));
        assert!(a.file_name().unwrap().to_string_lossy().starts_with("b.o.rm."));
    }
}
