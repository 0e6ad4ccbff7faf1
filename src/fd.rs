//! Descriptor-level read and write loops
//!
//! These functions operate on descriptors owned by the caller. They never
//! close or duplicate the descriptor; they only read, write or adjust its
//! flags. Interrupted (`EINTR`) system calls are retried transparently.
//! [`write_fd`] also retries would-block (`EAGAIN`) writes; [`read_fd`]
//! reports them, so an empty non-blocking descriptor fails instead of
//! spinning.

use crate::error::{Error, Result};
use std::io;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd};
use tracing::debug;

/// Size of the bounded buffer used by [`read_fd`]
pub const READ_BUFFER_SIZE: usize = 64 * 1024; // 64KB buffer

/// Whether `EAGAIN` is retried along with `EINTR`
#[derive(Clone, Copy, PartialEq, Eq)]
enum RetryWouldBlock {
    Yes,
    No,
}

/// Run a read/write style syscall until it stops failing with `EINTR`
fn retry_on_interrupt<F>(retry_would_block: RetryWouldBlock, mut syscall: F) -> io::Result<usize>
where
    F: FnMut() -> libc::ssize_t,
{
    loop {
        let ret = syscall();
        if let Ok(n) = usize::try_from(ret) {
            return Ok(n);
        }
        let err = io::Error::last_os_error();
        match err.raw_os_error() {
            Some(libc::EINTR) => continue,
            Some(libc::EAGAIN) if retry_would_block == RetryWouldBlock::Yes => continue,
            _ => return Err(err),
        }
    }
}

fn describe(fd: BorrowedFd<'_>) -> String {
    format!("fd {}", fd.as_raw_fd())
}

/// Read from `fd` until end of file, handing each chunk to `receiver`
///
/// Chunks are delivered in file order. Nothing is said about chunk
/// boundaries beyond "at most [`READ_BUFFER_SIZE`] bytes each". An empty
/// file results in zero receiver calls.
///
/// # Errors
///
/// Returns an error if the underlying `read(2)` fails with anything other
/// than `EINTR` (including `EAGAIN` on a non-blocking descriptor with no
/// data), or the first error returned by `receiver`, after
/// which reading stops.
///
/// # Examples
///
/// ```rust,no_run
/// use cachefile_util::read_fd;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let file = std::fs::File::open("data.bin")?;
/// let mut total = 0;
/// read_fd(&file, |chunk| {
///     total += chunk.len();
///     Ok(())
/// })?;
/// # Ok(())
/// # }
/// ```
pub fn read_fd<F>(fd: impl AsFd, mut receiver: F) -> Result<()>
where
    F: FnMut(&[u8]) -> Result<()>,
{
    let fd = fd.as_fd();
    let raw = fd.as_raw_fd();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        // SAFETY: `buffer` is valid for writes of `buffer.len()` bytes and the
        // descriptor is borrowed for the duration of the call.
        let bytes_read = retry_on_interrupt(RetryWouldBlock::No, || unsafe {
            libc::read(raw, buffer.as_mut_ptr().cast(), buffer.len())
        })
        .map_err(|e| Error::read(describe(fd), e))?;

        if bytes_read == 0 {
            return Ok(()); // EOF
        }
        receiver(&buffer[..bytes_read])?;
    }
}

/// Write all of `data` to `fd`, looping over short writes
///
/// # Errors
///
/// Returns an error if `write(2)` fails with anything other than
/// `EINTR`/`EAGAIN`, or if it makes no progress on a non-empty remainder.
pub fn write_fd(fd: impl AsFd, data: &[u8]) -> Result<()> {
    let fd = fd.as_fd();
    let raw = fd.as_raw_fd();
    let mut remaining = data;

    while !remaining.is_empty() {
        // SAFETY: `remaining` is valid for reads of `remaining.len()` bytes.
        let bytes_written = retry_on_interrupt(RetryWouldBlock::Yes, || unsafe {
            libc::write(raw, remaining.as_ptr().cast(), remaining.len())
        })
        .map_err(|e| Error::write(describe(fd), e))?;

        if bytes_written == 0 {
            return Err(Error::write(
                describe(fd),
                io::Error::from(io::ErrorKind::WriteZero),
            ));
        }
        remaining = &remaining[bytes_written..];
    }

    Ok(())
}

/// Set `FD_CLOEXEC` on `fd` so it is closed across `exec`
///
/// Best-effort: a failure is logged and handed back as a diagnostic rather
/// than raised.
pub fn set_cloexec_flag(fd: impl AsFd) -> Option<Error> {
    let raw = fd.as_fd().as_raw_fd();

    // SAFETY: F_GETFD takes no extra argument and only inspects the descriptor.
    let flags = unsafe { libc::fcntl(raw, libc::F_GETFD) };
    if flags == -1 {
        return Some(cloexec_failure(raw, &io::Error::last_os_error()));
    }
    if flags & libc::FD_CLOEXEC != 0 {
        return None;
    }

    // SAFETY: F_SETFD takes an int flag set.
    if unsafe { libc::fcntl(raw, libc::F_SETFD, flags | libc::FD_CLOEXEC) } == -1 {
        return Some(cloexec_failure(raw, &io::Error::last_os_error()));
    }
    None
}

fn cloexec_failure(raw: i32, err: &io::Error) -> Error {
    debug!("Failed to set FD_CLOEXEC on fd {}: {}", raw, err);
    Error::FileSystem(format!("Failed to set FD_CLOEXEC on fd {raw}: {err}"))
}
