//! Space preallocation and size-on-disk estimation
//!
//! [`fallocate`] asks the OS to reserve space with `posix_fallocate(3)` where
//! the platform has it. When the call is unavailable, or the filesystem
//! rejects it, the file is extended by writing zeros after its current end.
//! Holes that already exist inside the file are not filled by either path.

#[cfg(unix)]
use crate::error::{Error, Result};
#[cfg(unix)]
use crate::fd::{write_fd, READ_BUFFER_SIZE};
#[cfg(unix)]
use std::io;
#[cfg(unix)]
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
#[cfg(unix)]
use tracing::debug;

/// Block size assumed by [`likely_size_on_disk`]
pub const DISK_BLOCK_SIZE: u64 = 4096;

/// Return how much space a file of `size` bytes likely takes on disk
///
/// Rounds up to the next multiple of [`DISK_BLOCK_SIZE`]. Sizes within one
/// block of `u64::MAX` saturate to the largest block-aligned value.
#[must_use]
pub const fn likely_size_on_disk(size: u64) -> u64 {
    match size.checked_add(DISK_BLOCK_SIZE - 1) {
        Some(padded) => padded & !(DISK_BLOCK_SIZE - 1),
        None => u64::MAX & !(DISK_BLOCK_SIZE - 1),
    }
}

/// Extend the file behind `fd` to at least `new_size` bytes
///
/// A file that is already at least `new_size` bytes long is left alone.
/// The descriptor's file position is unchanged afterwards.
///
/// # Errors
///
/// This function will return an error if:
/// - `new_size` does not fit the platform's `off_t`
/// - `posix_fallocate` fails for a reason other than lack of support
/// - the zero-fill fallback cannot seek or write (e.g. read-only descriptor,
///   disk full)
#[cfg(unix)]
pub fn fallocate(fd: impl AsFd, new_size: u64) -> Result<()> {
    let fd = fd.as_fd();
    if new_size == 0 {
        return Ok(());
    }
    let len = to_off_t(new_size)?;

    match posix_fallocate(fd, len) {
        Ok(()) => Ok(()),
        Err(err) if matches!(err.raw_os_error(), Some(libc::EINVAL | libc::EOPNOTSUPP)) => {
            debug!(
                "posix_fallocate unsupported on fd {} ({}), writing zeros instead",
                fd.as_raw_fd(),
                err
            );
            extend_with_zeros(fd, new_size)
        }
        Err(source) => Err(Error::Allocate { source }),
    }
}

#[cfg(unix)]
fn to_off_t(value: u64) -> Result<libc::off_t> {
    libc::off_t::try_from(value).map_err(|_| Error::Allocate {
        source: io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("size {value} exceeds the largest file offset"),
        ),
    })
}

#[cfg(any(target_os = "linux", target_os = "android", target_os = "freebsd"))]
fn posix_fallocate(fd: BorrowedFd<'_>, len: libc::off_t) -> io::Result<()> {
    loop {
        // posix_fallocate returns the error number instead of setting errno.
        // SAFETY: plain syscall wrapper on a borrowed descriptor.
        match unsafe { libc::posix_fallocate(fd.as_raw_fd(), 0, len) } {
            0 => return Ok(()),
            libc::EINTR => continue,
            errno => return Err(io::Error::from_raw_os_error(errno)),
        }
    }
}

#[cfg(all(
    unix,
    not(any(target_os = "linux", target_os = "android", target_os = "freebsd"))
))]
fn posix_fallocate(_fd: BorrowedFd<'_>, _len: libc::off_t) -> io::Result<()> {
    Err(io::Error::from_raw_os_error(libc::EOPNOTSUPP))
}

#[cfg(unix)]
fn seek(raw: RawFd, offset: libc::off_t, whence: libc::c_int) -> io::Result<u64> {
    // SAFETY: lseek only manipulates the descriptor's file offset.
    let pos = unsafe { libc::lseek(raw, offset, whence) };
    u64::try_from(pos).map_err(|_| io::Error::last_os_error())
}

#[cfg(unix)]
fn chunk_len(remaining: u64, max: usize) -> usize {
    usize::try_from(remaining).map_or(max, |r| r.min(max))
}

/// Grow the file by appending zeros, restoring the file position afterwards
#[cfg(unix)]
fn extend_with_zeros(fd: BorrowedFd<'_>, new_size: u64) -> Result<()> {
    let raw = fd.as_raw_fd();
    let allocate_error = |source: io::Error| Error::Allocate { source };

    let saved_pos = seek(raw, 0, libc::SEEK_CUR).map_err(allocate_error)?;
    let old_size = seek(raw, 0, libc::SEEK_END).map_err(allocate_error)?;

    let mut written = Ok(());
    if old_size < new_size {
        let mut remaining = new_size - old_size;
        let zeros = vec![0u8; chunk_len(remaining, READ_BUFFER_SIZE)];
        while remaining > 0 {
            let chunk = chunk_len(remaining, zeros.len());
            if let Err(e) = write_fd(fd, &zeros[..chunk]) {
                written = Err(e);
                break;
            }
            remaining -= chunk as u64;
        }
    }

    seek(raw, to_off_t(saved_pos)?, libc::SEEK_SET).map_err(allocate_error)?;
    written
}
