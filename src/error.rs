//! Error types for file utility operations
//!
//! Everything except removal reports failures through [`Error`], whose
//! `Display` output is a single descriptive line suitable for logging.
//! Removal returns [`std::io::Error`] directly so callers can branch on the
//! system error code.

use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Message-based error for read, write, copy and allocation operations
#[derive(Debug, Error)]
pub enum Error {
    /// Generic filesystem failure with a preformatted message
    #[error("{0}")]
    FileSystem(String),

    /// A file could not be opened
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        /// Path that was being opened
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// A file could not be created
    #[error("Failed to create {}: {source}", path.display())]
    Create {
        /// Path that was being created
        path: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Reading failed
    #[error("Failed to read {what}: {source}")]
    Read {
        /// Description of what was being read (a path or a descriptor)
        what: String,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Writing failed
    #[error("Failed to write {what}: {source}")]
    Write {
        /// Description of what was being written (a path or a descriptor)
        what: String,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Renaming a temporary file into place failed
    #[error("Failed to rename {} to {}: {source}", from.display(), to.display())]
    Rename {
        /// Temporary file
        from: PathBuf,
        /// Final destination
        to: PathBuf,
        /// Underlying I/O error
        source: io::Error,
    },

    /// Space preallocation failed
    #[error("Failed to allocate file space: {source}")]
    Allocate {
        /// Underlying I/O error
        source: io::Error,
    },

    /// Text content could not be decoded
    #[error("Failed to decode {} as text: {reason}", path.display())]
    Decode {
        /// File the content came from
        path: PathBuf,
        /// What was wrong with the content
        reason: String,
    },
}

impl Error {
    pub(crate) fn open(path: &Path, source: io::Error) -> Self {
        Self::Open {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn create(path: &Path, source: io::Error) -> Self {
        Self::Create {
            path: path.to_path_buf(),
            source,
        }
    }

    pub(crate) fn read(what: impl std::fmt::Display, source: io::Error) -> Self {
        Self::Read {
            what: what.to_string(),
            source,
        }
    }

    pub(crate) fn write(what: impl std::fmt::Display, source: io::Error) -> Self {
        Self::Write {
            what: what.to_string(),
            source,
        }
    }

    pub(crate) fn decode(path: &Path, reason: impl Into<String>) -> Self {
        Self::Decode {
            path: path.to_path_buf(),
            reason: reason.into(),
        }
    }

    /// The underlying I/O error, if this failure came from a system call
    #[must_use]
    pub fn io_error(&self) -> Option<&io::Error> {
        match self {
            Self::Open { source, .. }
            | Self::Create { source, .. }
            | Self::Read { source, .. }
            | Self::Write { source, .. }
            | Self::Rename { source, .. }
            | Self::Allocate { source } => Some(source),
            Self::FileSystem(_) | Self::Decode { .. } => None,
        }
    }
}
