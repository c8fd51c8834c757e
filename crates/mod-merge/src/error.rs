//! Error types for merge operations

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for merge operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for merge operations
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error occurred
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Container could not be read
    #[error("Container error: {0}")]
    Archive(#[from] dat_archive::Error),

    /// Mod bundle is missing its metadata or the metadata is unusable
    #[error("Invalid mod bundle: {0}")]
    BundleFormat(String),

    /// Primary base tier changed since the baseline was recorded
    #[error("Base tier digest mismatch: expected {expected}, found {actual}")]
    IntegrityMismatch {
        /// Digest recorded at the last reconcile or migration
        expected: String,
        /// Digest of the file on disk
        actual: String,
    },

    /// Rebuilding a container failed
    #[error("Failed to write container {}: {source}", path.display())]
    ContainerWrite {
        /// Container being written
        path: PathBuf,
        /// Underlying codec error
        source: dat_archive::Error,
    },

    /// Manifest could not be parsed or serialized
    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    /// Configuration is invalid
    #[error("Configuration error: {0}")]
    Config(String),

    /// No installed mod has this name
    #[error("Mod not installed: {0}")]
    ModNotInstalled(String),

    /// A mod with this name is already installed
    #[error("Mod already installed: {0}")]
    AlreadyInstalled(String),

    /// The installation has no recorded baseline
    #[error("Installation is not set up, run setup first")]
    NotConfigured,

    /// Files in the bundle are already owned by other mods
    #[error("Mod {name} conflicts with installed mods on {} file(s)", conflicts.len())]
    ModConflict {
        /// Mod being installed
        name: String,
        /// Conflicting files, formatted for display
        conflicts: Vec<String>,
    },
}

impl Error {
    /// Create a new BundleFormat error
    pub fn bundle_format<S: Into<String>>(msg: S) -> Self {
        Error::BundleFormat(msg.into())
    }

    /// Create a new Config error
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Error::Config(msg.into())
    }

    /// Check if the operation stopped before touching any container
    pub fn aborts_before_mutation(&self) -> bool {
        matches!(
            self,
            Error::BundleFormat(_)
                | Error::IntegrityMismatch { .. }
                | Error::Config(_)
                | Error::ModNotInstalled(_)
                | Error::AlreadyInstalled(_)
                | Error::NotConfigured
                | Error::ModConflict { .. }
        )
    }

    /// Check if this error indicates corrupted on-disk data
    pub fn is_corruption(&self) -> bool {
        match self {
            Error::Archive(e) | Error::ContainerWrite { source: e, .. } => e.is_corruption(),
            Error::Manifest(_) => true,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::IntegrityMismatch {
            expected: "aa".to_string(),
            actual: "bb".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Base tier digest mismatch: expected aa, found bb"
        );

        let err = Error::ModConflict {
            name: "Camo".to_string(),
            conflicts: vec!["a".to_string(), "b".to_string()],
        };
        assert_eq!(
            err.to_string(),
            "Mod Camo conflicts with installed mods on 2 file(s)"
        );
    }

    #[test]
    fn test_error_classification() {
        assert!(Error::bundle_format("no metadata").aborts_before_mutation());
        assert!(Error::NotConfigured.aborts_before_mutation());
        assert!(!Error::Io(io::Error::other("disk")).aborts_before_mutation());

        let err = Error::ContainerWrite {
            path: PathBuf::from("01.dat"),
            source: dat_archive::Error::invalid_format("truncated"),
        };
        assert!(err.is_corruption());
        assert!(!err.aborts_before_mutation());
    }
}
