//! Name dictionary for hash-only containers
//!
//! Outer containers store only path hashes. A dictionary maps known hashes
//! back to their logical paths so extraction can restore real names. The
//! text format is one path per line:
//!
//! - Comments start with ';' or '#'
//! - Anything after a ';' on a line is ignored
//! - Empty lines are ignored

use crate::Result;
use crate::hash::{normalize_path, path_hash};
use std::collections::HashMap;
use std::path::Path;

/// Hash to path lookup table
#[derive(Debug, Clone, Default)]
pub struct Dictionary {
    names: HashMap<u64, String>,
}

impl Dictionary {
    /// Create an empty dictionary
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a dictionary document
    pub fn parse(data: &[u8]) -> Result<Self> {
        let content = match std::str::from_utf8(data) {
            Ok(s) => s.to_string(),
            Err(_) => {
                log::warn!("Dictionary contains invalid UTF-8, using lossy conversion");
                String::from_utf8_lossy(data).into_owned()
            }
        };

        let mut dictionary = Self::new();
        for line in content.lines() {
            let line = line.trim();

            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            let name = match line.find(';') {
                Some(pos) => line[..pos].trim(),
                None => line,
            };

            if !name.is_empty() {
                dictionary.insert(name);
            }
        }

        log::debug!("Parsed {} names from dictionary", dictionary.len());
        Ok(dictionary)
    }

    /// Load a dictionary file from disk
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let data = std::fs::read(path.as_ref())?;
        Self::parse(&data)
    }

    /// Add a known path
    ///
    /// The first name registered for a hash wins.
    pub fn insert(&mut self, path: &str) {
        let normalized = normalize_path(path);
        self.names.entry(path_hash(&normalized)).or_insert(normalized);
    }

    /// Look up the path for a hash
    pub fn resolve(&self, hash: u64) -> Option<&str> {
        self.names.get(&hash).map(String::as_str)
    }

    /// Number of known names
    pub fn len(&self) -> usize {
        self.names.len()
    }

    /// Whether the dictionary knows no names
    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Dictionary {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut dictionary = Self::new();
        for path in iter {
            dictionary.insert(path.as_ref());
        }
        dictionary
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_dictionary() {
        let dict = Dictionary::parse(b"Assets/a.dat\nAssets/b.dat\nconfig.bin").unwrap();
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.resolve(path_hash("Assets/a.dat")), Some("Assets/a.dat"));
        assert_eq!(dict.resolve(path_hash("config.bin")), Some("config.bin"));
    }

    #[test]
    fn test_parse_dictionary_with_comments_and_metadata() {
        let content = b"; comment\n\
                        # another comment\n\
                        Assets/a.dat;12345\n\
                        \n\
                        \tAssets\\b.dat\t\n";
        let dict = Dictionary::parse(content).unwrap();
        assert_eq!(dict.len(), 2);
        assert_eq!(dict.resolve(path_hash("Assets/a.dat")), Some("Assets/a.dat"));
        // Backslashes are normalized on insert
        assert_eq!(dict.resolve(path_hash("Assets/b.dat")), Some("Assets/b.dat"));
    }

    #[test]
    fn test_first_name_wins() {
        let dict: Dictionary = ["Assets/A.dat", "assets/a.dat"].into_iter().collect();
        assert_eq!(dict.len(), 1);
        assert_eq!(dict.resolve(path_hash("assets/a.dat")), Some("Assets/A.dat"));
    }

    #[test]
    fn test_empty_dictionary() {
        let dict = Dictionary::parse(b"").unwrap();
        assert!(dict.is_empty());
        assert_eq!(dict.resolve(1), None);
    }
}
