//! Ordered logical file lists keyed by path hash
//!
//! Container rebuilds preserve list order, so every working list is a plain
//! ordered `Vec` of logical paths. All membership tests go through the path
//! hash because the same entry may appear under a real name or a placeholder.

use dat_archive::path_hash;
use std::collections::HashSet;
use std::fs;
use std::io;
use std::path::Path;

/// Ordered list of logical paths
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileList {
    files: Vec<String>,
}

impl FileList {
    /// Create an empty list
    pub fn new() -> Self {
        Self::default()
    }

    /// Entry with the same path hash as `path`
    pub fn find(&self, path: &str) -> Option<&str> {
        let hash = path_hash(path);
        self.files
            .iter()
            .find(|f| path_hash(f) == hash)
            .map(String::as_str)
    }

    /// Entry with the given path hash
    pub fn find_hash(&self, hash: u64) -> Option<&str> {
        self.files
            .iter()
            .find(|f| path_hash(f) == hash)
            .map(String::as_str)
    }

    /// Whether an entry with the same path hash exists
    pub fn contains(&self, path: &str) -> bool {
        self.find(path).is_some()
    }

    /// Append `path` unless its hash is already present
    pub fn push_unique(&mut self, path: &str) -> bool {
        if self.contains(path) {
            return false;
        }
        self.files.push(path.to_string());
        true
    }

    /// Remove every entry with the same path hash, returning whether any was removed
    pub fn remove(&mut self, path: &str) -> bool {
        let hash = path_hash(path);
        let before = self.files.len();
        self.files.retain(|f| path_hash(f) != hash);
        self.files.len() != before
    }

    /// Replace the entry at `index` with a new name
    pub fn rename(&mut self, index: usize, name: &str) {
        if let Some(slot) = self.files.get_mut(index) {
            *slot = name.to_string();
        }
    }

    /// Drop later entries whose hash repeats an earlier one
    ///
    /// Returns the number of entries removed.
    pub fn dedup(&mut self) -> usize {
        let mut seen = HashSet::new();
        let before = self.files.len();
        self.files.retain(|f| seen.insert(path_hash(f)));
        before - self.files.len()
    }

    /// Entries in order
    pub fn as_slice(&self) -> &[String] {
        &self.files
    }

    /// Iterate over entries
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(String::as_str)
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.files.len()
    }

    /// Whether the list is empty
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Set of path hashes
    pub fn hashes(&self) -> HashSet<u64> {
        self.files.iter().map(|f| path_hash(f)).collect()
    }
}

impl From<Vec<String>> for FileList {
    fn from(files: Vec<String>) -> Self {
        Self { files }
    }
}

impl<'a> IntoIterator for &'a FileList {
    type Item = &'a String;
    type IntoIter = std::slice::Iter<'a, String>;

    fn into_iter(self) -> Self::IntoIter {
        self.files.iter()
    }
}

/// Copy one logical file between two trees, creating parent directories
pub fn copy_logical(src_root: &Path, src_name: &str, dst_root: &Path, dst_name: &str) -> io::Result<()> {
    let dest = dst_root.join(dst_name);
    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    fs::copy(src_root.join(src_name), dest)?;
    Ok(())
}

/// Whether two logical files hold the same bytes
pub fn same_contents(a_root: &Path, a_name: &str, b_root: &Path, b_name: &str) -> io::Result<bool> {
    let a = a_root.join(a_name);
    let b = b_root.join(b_name);
    if fs::metadata(&a)?.len() != fs::metadata(&b)?.len() {
        return Ok(false);
    }
    Ok(fs::read(a)? == fs::read(b)?)
}
