//! # cachefile-util
//!
//! Low-level file I/O utilities for build caches:
//! - Descriptor-level read/write loops (`read_fd`, `write_fd`)
//! - Whole-file and partial reads, in byte and text flavors, with UTF-16LE
//!   byte order mark transcoding for text
//! - Writes that break hard links unless asked to write in place
//! - Copies that atomically replace the destination via a temporary file
//! - Plain and NFS-safe removal that treat a missing file as success
//! - Space preallocation and size-on-disk estimation
//! - Best-effort timestamp, `FD_CLOEXEC` and `CACHEDIR.TAG` helpers
//!
//! All functions are synchronous and stateless. Descriptors passed in are
//! borrowed and never closed; temporary files created internally are always
//! cleaned up before a call returns.
//!
//! ## Example
//!
//! ```rust,no_run
//! use cachefile_util::{copy_file, read_file, remove, write_file, InPlace, LogFailure, ViaTmpFile};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! write_file("cache/manifest", b"entry", InPlace::No)?;
//! copy_file("build/foo.o", "cache/foo.o", ViaTmpFile::Yes)?;
//! let content = read_file("cache/foo.o", 0)?;
//! println!("cached {} bytes", content.len());
//! let removed = remove("cache/stale.o", LogFailure::Yes)?;
//! # let _ = removed;
//! # Ok(())
//! # }
//! ```
//!
//! ## Errors
//!
//! Removal returns [`std::io::Error`] so the system error code can be
//! inspected. Everything else returns [`Error`], whose message names the file
//! involved. Best-effort helpers return `Option<Error>` instead of failing.

pub mod copy;
pub mod encoding;
pub mod error;
pub mod fallocate;
#[cfg(unix)]
pub mod fd;
pub mod metadata;
pub mod read;
pub mod remove;
pub mod temp;
pub mod write;

// Re-export main types
pub use copy::{copy_file, ViaTmpFile};
pub use error::{Error, Result};
#[cfg(unix)]
pub use fallocate::fallocate;
pub use fallocate::{likely_size_on_disk, DISK_BLOCK_SIZE};
#[cfg(unix)]
pub use fd::{read_fd, set_cloexec_flag, write_fd, READ_BUFFER_SIZE};
pub use metadata::{create_cachedir_tag, set_timestamps, CACHEDIR_TAG_CONTENT, CACHEDIR_TAG_NAME};
pub use read::{read_file, read_file_part, read_file_part_to_string, read_file_to_string};
pub use remove::{remove, remove_nfs_safe, LogFailure};
pub use temp::TemporaryFile;
pub use write::{write_file, InPlace};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
