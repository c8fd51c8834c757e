//! Merge configuration and on-disk layout
//!
//! Every setting has a default matching the stock game layout, so a config
//! file only needs the keys that differ:
//!
//! ```yaml
//! secondary_bases:
//!   - master/chunk0.dat
//!   - master/chunk1.dat
//! dictionary: dictionary.txt
//! conflict_check: false
//! ```

use crate::manifest::Tier;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Loader base offset of the patch tier container
pub const PATCH_BASE_OFFSET: u32 = 3_150_048;

/// Loader base offset of the primary base tier container
pub const PRIMARY_BASE_OFFSET: u32 = 3_150_304;

/// Tunable merge settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Base offset used when rebuilding the patch tier
    pub patch_base_offset: u32,
    /// Base offset used when rebuilding the primary base tier
    pub primary_base_offset: u32,
    /// Base offset used when rebuilding nested containers
    pub nested_base_offset: u32,
    /// File extensions that mark an entry as a nested container
    pub nested_extensions: Vec<String>,
    /// Primary base tier, relative to the game directory
    pub primary_base: PathBuf,
    /// Patch tier, relative to the game directory
    pub patch: PathBuf,
    /// Further base tiers in search order; missing files are skipped
    pub secondary_bases: Vec<PathBuf>,
    /// Manifest location, relative to the game directory
    pub manifest: PathBuf,
    /// Scratch root, relative to the game directory
    pub scratch: PathBuf,
    /// Optional name dictionary for outer containers
    pub dictionary: Option<PathBuf>,
    /// Refuse installs that overwrite files owned by another mod
    pub conflict_check: bool,
    /// Installed game version, compared against bundle metadata
    pub game_version: Option<String>,
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self {
            patch_base_offset: PATCH_BASE_OFFSET,
            primary_base_offset: PRIMARY_BASE_OFFSET,
            nested_base_offset: 0,
            nested_extensions: vec!["fpk".to_string(), "fpkd".to_string()],
            primary_base: PathBuf::from("master/0/00.dat"),
            patch: PathBuf::from("master/0/01.dat"),
            secondary_bases: vec![PathBuf::from("master/chunk0.dat")],
            manifest: PathBuf::from("modpatch.json"),
            scratch: PathBuf::from(".modpatch"),
            dictionary: None,
            conflict_check: true,
            game_version: None,
        }
    }
}

impl MergeConfig {
    /// Parse a YAML document
    pub fn from_yaml(text: &str) -> Result<Self> {
        let config: Self = serde_yaml_ng::from_str(text)
            .map_err(|e| Error::config(format!("Invalid configuration: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a YAML configuration file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            Error::config(format!("Cannot read configuration {}: {e}", path.display()))
        })?;
        Self::from_yaml(&text)
    }

    /// Check that the layout is usable
    pub fn validate(&self) -> Result<()> {
        if self.primary_base == self.patch {
            return Err(Error::config(
                "Primary base tier and patch tier must be different files",
            ));
        }
        if self.secondary_bases.iter().any(|p| *p == self.patch) {
            return Err(Error::config("Patch tier cannot also be a secondary base tier"));
        }
        if self.nested_extensions.iter().any(|e| e.is_empty() || e.contains('.')) {
            return Err(Error::config(
                "Nested extensions must be non-empty and given without a dot",
            ));
        }
        Ok(())
    }

    /// Whether a logical path names a nested container
    pub fn is_nested(&self, path: &str) -> bool {
        let ext = dat_archive::hash::extension(path);
        self.nested_extensions
            .iter()
            .any(|n| n.eq_ignore_ascii_case(ext))
    }
}

/// Absolute locations of everything the engine touches
#[derive(Debug, Clone)]
pub struct Layout {
    /// Game installation directory
    pub root: PathBuf,
    /// Primary base tier container
    pub primary_base: PathBuf,
    /// Patch tier container
    pub patch: PathBuf,
    /// Secondary base tiers with their configured relative names
    pub secondary_bases: Vec<(String, PathBuf)>,
    /// Manifest file
    pub manifest: PathBuf,
    /// Scratch root
    pub scratch: PathBuf,
}

impl Layout {
    /// Resolve the configured paths against a game directory
    pub fn new<P: AsRef<Path>>(root: P, config: &MergeConfig) -> Self {
        let root = root.as_ref().to_path_buf();
        Self {
            primary_base: root.join(&config.primary_base),
            patch: root.join(&config.patch),
            secondary_bases: config
                .secondary_bases
                .iter()
                .map(|p| (p.to_string_lossy().replace('\\', "/"), root.join(p)))
                .collect(),
            manifest: root.join(&config.manifest),
            scratch: root.join(&config.scratch),
            root,
        }
    }

    /// Container file backing a tier
    pub fn tier_path(&self, tier: &Tier) -> Option<PathBuf> {
        match tier {
            Tier::Patch => Some(self.patch.clone()),
            Tier::Base => Some(self.primary_base.clone()),
            Tier::Secondary(name) => self
                .secondary_bases
                .iter()
                .find(|(n, _)| n == name)
                .map(|(_, p)| p.clone()),
        }
    }

    /// Base tiers in search order, skipping files that do not exist
    pub fn base_tiers(&self) -> Vec<(Tier, PathBuf)> {
        let mut tiers = Vec::new();
        if self.primary_base.is_file() {
            tiers.push((Tier::Base, self.primary_base.clone()));
        }
        for (name, path) in &self.secondary_bases {
            if path.is_file() {
                tiers.push((Tier::Secondary(name.clone()), path.clone()));
            }
        }
        tiers
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = MergeConfig::default();
        assert_eq!(config.patch_base_offset, 3_150_048);
        assert_eq!(config.primary_base_offset, 3_150_304);
        assert!(config.is_nested("Assets/weapon.fpk"));
        assert!(config.is_nested("Assets/weapon.FPKD"));
        assert!(!config.is_nested("config.bin"));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml() {
        let config = MergeConfig::from_yaml(
            "secondary_bases:\n  - master/chunk0.dat\n  - master/chunk1.dat\nconflict_check: false\n",
        )
        .unwrap();
        assert_eq!(config.secondary_bases.len(), 2);
        assert!(!config.conflict_check);
        assert_eq!(config.patch, PathBuf::from("master/0/01.dat"));
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            MergeConfig::from_yaml("patch: master/0/00.dat\n"),
            Err(Error::Config(_))
        ));
        assert!(matches!(
            MergeConfig::from_yaml("patch_base_offset: [1, 2]\n"),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_layout_tiers() {
        let temp = tempfile::TempDir::new().unwrap();
        let layout = Layout::new(temp.path(), &MergeConfig::default());
        assert!(layout.base_tiers().is_empty());

        std::fs::create_dir_all(layout.primary_base.parent().unwrap()).unwrap();
        std::fs::write(&layout.primary_base, b"").unwrap();
        let tiers = layout.base_tiers();
        assert_eq!(tiers.len(), 1);
        assert_eq!(tiers[0].0, Tier::Base);

        assert_eq!(
            layout.tier_path(&Tier::Secondary("master/chunk0.dat".to_string())),
            Some(temp.path().join("master/chunk0.dat"))
        );
        assert_eq!(layout.tier_path(&Tier::Secondary("nope".to_string())), None);
    }
}
