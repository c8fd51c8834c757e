//! Input validation for untrusted containers
//!
//! Containers and mod payloads come from third parties. Every size read from
//! a header is checked before allocation and every entry name is checked
//! before it is joined onto an extraction directory.

use crate::{Error, Result};
use std::path::{Component, Path};

/// Limits applied while reading containers
#[derive(Debug, Clone)]
pub struct Limits {
    /// Maximum number of entries in one container (default: 1M)
    pub max_entries: u32,
    /// Maximum size of one entry (default: 2GB)
    pub max_entry_size: u64,
    /// Maximum entry path length (default: 1024)
    pub max_path_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_entries: 1_000_000,
            max_entry_size: 2 * 1024 * 1024 * 1024,
            max_path_length: 1024,
        }
    }
}

/// Validate a logical entry path before it touches the filesystem
pub fn validate_entry_path(path: &str, limits: &Limits) -> Result<()> {
    if path.is_empty() {
        return Err(Error::invalid_format("Empty entry path not allowed"));
    }

    if path.len() > limits.max_path_length {
        return Err(Error::invalid_format(format!(
            "Entry path too long: {} bytes",
            path.len()
        )));
    }

    if path.contains('\0') {
        return Err(Error::invalid_format("Entry path contains null bytes"));
    }

    let normalized = path.replace('\\', "/");
    for component in Path::new(&normalized).components() {
        match component {
            Component::ParentDir => {
                return Err(Error::directory_traversal(format!(
                    "Entry path contains parent directory reference: {path}"
                )));
            }
            Component::RootDir | Component::Prefix(_) => {
                return Err(Error::directory_traversal(format!(
                    "Absolute entry paths not allowed: {path}"
                )));
            }
            Component::Normal(name) => {
                if name
                    .to_string_lossy()
                    .chars()
                    .any(|ch| matches!(ch, '\0'..='\x1f' | '\x7f'))
                {
                    return Err(Error::invalid_format(
                        "Entry path contains control characters",
                    ));
                }
            }
            Component::CurDir => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_paths() {
        let limits = Limits::default();
        assert!(validate_entry_path("Assets/a.dat", &limits).is_ok());
        assert!(validate_entry_path("Assets\\pack\\weapon.fpk", &limits).is_ok());
        assert!(validate_entry_path("0123456789abcdef.fpk", &limits).is_ok());
    }

    #[test]
    fn test_traversal_rejected() {
        let limits = Limits::default();
        assert!(matches!(
            validate_entry_path("../evil.dat", &limits),
            Err(Error::DirectoryTraversal(_))
        ));
        assert!(matches!(
            validate_entry_path("Assets\\..\\..\\evil.dat", &limits),
            Err(Error::DirectoryTraversal(_))
        ));
        assert!(matches!(
            validate_entry_path("/etc/passwd", &limits),
            Err(Error::DirectoryTraversal(_))
        ));
    }

    #[test]
    fn test_malformed_paths_rejected() {
        let limits = Limits {
            max_path_length: 8,
            ..Limits::default()
        };
        assert!(validate_entry_path("", &limits).is_err());
        assert!(validate_entry_path("a\0b", &limits).is_err());
        assert!(validate_entry_path("a\x01b", &limits).is_err());
        assert!(validate_entry_path("very/long/path.dat", &limits).is_err());
    }
}
