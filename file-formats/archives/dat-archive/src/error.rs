//! Error types for the container library

use std::io;
use std::path::PathBuf;
use thiserror::Error;

use crate::ContainerKind;

/// Result type alias for container operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for container operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Invalid container format or corrupted container
    #[error("Invalid container format: {0}")]
    InvalidFormat(String),

    /// Unsupported container version
    #[error("Unsupported container version: {0}")]
    UnsupportedVersion(u16),

    /// The container is of a different kind than requested
    #[error("Expected {expected} container, found {found} container")]
    WrongKind {
        /// Kind the caller asked for
        expected: ContainerKind,
        /// Kind found in the header
        found: ContainerKind,
    },

    /// Entry not found in container
    #[error("Entry not found: {0:016x}")]
    EntryNotFound(u64),

    /// Source file for a container entry is missing on disk
    #[error("Source file missing for entry {name}: {path}")]
    MissingSource {
        /// Logical name of the entry
        name: String,
        /// Location that was expected to hold the file
        path: PathBuf,
    },

    /// Entry path would escape the extraction directory
    #[error("Directory traversal attempt: {0}")]
    DirectoryTraversal(String),

    /// Container capacity exceeded
    #[error("Container capacity exceeded: {0}")]
    CapacityExceeded(String),

    /// Checksum mismatch
    #[error("Checksum mismatch for {name}: expected {expected:08x}, got {actual:08x}")]
    ChecksumMismatch {
        /// Entry name
        name: String,
        /// Expected checksum
        expected: u32,
        /// Actual checksum
        actual: u32,
    },

    /// Invalid UTF-8 in an entry name
    #[error("Invalid UTF-8 in entry name")]
    InvalidUtf8,
}

impl Error {
    /// Create a new InvalidFormat error
    pub fn invalid_format<S: Into<String>>(msg: S) -> Self {
        Error::InvalidFormat(msg.into())
    }

    /// Create a new DirectoryTraversal error
    pub fn directory_traversal<S: Into<String>>(msg: S) -> Self {
        Error::DirectoryTraversal(msg.into())
    }

    /// Create a new CapacityExceeded error
    pub fn capacity_exceeded<S: Into<String>>(msg: S) -> Self {
        Error::CapacityExceeded(msg.into())
    }

    /// Check if this error indicates the container is corrupted
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::InvalidFormat(_)
                | Error::ChecksumMismatch { .. }
                | Error::InvalidUtf8
                | Error::WrongKind { .. }
        )
    }
}
