//! Installation manifest
//!
//! The manifest records which entries of the patch tier belong to the base
//! game and which belong to each installed mod. It is loaded at the start of
//! every operation, passed explicitly through the engine, and replaced as a
//! whole at the end.

use crate::{Error, Result};
use dat_archive::path_hash;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Current manifest schema version
pub const SCHEMA_VERSION: u32 = 1;

/// Where an entry came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provenance {
    /// Shipped with the game
    System,
    /// Base game container with mod content merged into it
    Merged,
    /// Supplied by a mod
    Mod,
}

impl std::fmt::Display for Provenance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Provenance::System => f.write_str("system"),
            Provenance::Merged => f.write_str("merged"),
            Provenance::Mod => f.write_str("mod"),
        }
    }
}

/// Container tier an entry lives in
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    /// The mutable patch tier
    Patch,
    /// The primary base tier
    Base,
    /// A secondary base tier, by configured relative path
    Secondary(String),
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Tier::Patch => f.write_str("patch"),
            Tier::Base => f.write_str("base"),
            Tier::Secondary(name) => write!(f, "secondary ({name})"),
        }
    }
}

/// An entry directly in the patch tier owned by a mod
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectEntry {
    /// Path hash
    pub hash: u64,
    /// Logical path
    pub path: String,
    /// Origin of the entry
    pub provenance: Provenance,
    /// Owning mod
    pub owner: String,
}

/// An entry inside a nested container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedEntry {
    /// Logical path of the owning nested container
    pub container: String,
    /// Path hash of the member
    pub hash: u64,
    /// Member path inside the container
    pub path: String,
    /// Origin of the entry
    pub provenance: Provenance,
    /// Owning mod, empty for base game members
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub owner: String,
}

impl NestedEntry {
    /// Whether this entry names `path` inside `container`
    pub fn matches(&self, container: &str, path: &str) -> bool {
        self.hash == path_hash(path) && path_hash(&self.container) == path_hash(container)
    }
}

/// One base game entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineEntry {
    /// Path hash
    pub hash: u64,
    /// Logical path, or a placeholder when the name is unknown
    pub path: String,
    /// Tier holding the entry
    pub tier: Tier,
    /// Whether the entry is itself a nested container
    pub compressed: bool,
}

/// Canonical record of base game content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BaselineIndex {
    /// Entries of the base tiers and unclaimed entries of the patch tier
    pub entries: Vec<BaselineEntry>,
    /// Unclaimed members of nested containers in the patch tier
    pub nested: Vec<NestedEntry>,
    /// MD5 of the primary base tier when the baseline was recorded
    pub base_digest: Option<String>,
}

impl BaselineIndex {
    /// First entry with this hash in the given tier
    pub fn find_in(&self, hash: u64, tier: &Tier) -> Option<&BaselineEntry> {
        self.entries.iter().find(|e| e.hash == hash && e.tier == *tier)
    }

    /// Whether any tier holds this hash
    pub fn contains(&self, hash: u64) -> bool {
        self.entries.iter().any(|e| e.hash == hash)
    }

    /// Entries recorded for the patch tier
    pub fn patch_entries(&self) -> impl Iterator<Item = &BaselineEntry> {
        self.entries.iter().filter(|e| e.tier == Tier::Patch)
    }
}

/// One installed mod
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModRecord {
    /// Unique mod name
    pub name: String,
    /// Mod version
    #[serde(default)]
    pub version: String,
    /// Author
    #[serde(default)]
    pub author: String,
    /// Website
    #[serde(default)]
    pub website: String,
    /// Free-form description
    #[serde(default)]
    pub description: String,
    /// Game version the mod was built for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,
    /// Entries placed directly in the patch tier
    pub direct: Vec<DirectEntry>,
    /// Entries placed inside nested containers
    pub nested: Vec<NestedEntry>,
}

impl ModRecord {
    /// Whether the mod no longer owns anything
    pub fn is_empty(&self) -> bool {
        self.direct.is_empty() && self.nested.is_empty()
    }

    /// Whether the mod owns a direct entry with this hash
    pub fn owns_direct(&self, hash: u64) -> bool {
        self.direct.iter().any(|e| e.hash == hash)
    }

    /// Whether the mod owns `path` inside `container`
    pub fn owns_nested(&self, container: &str, path: &str) -> bool {
        self.nested.iter().any(|e| e.matches(container, path))
    }

    /// Distinct nested containers touched by the mod, in first-seen order
    pub fn containers(&self) -> Vec<String> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for entry in &self.nested {
            let hash = path_hash(&entry.container);
            if !seen.contains(&hash) {
                seen.push(hash);
                out.push(entry.container.clone());
            }
        }
        out
    }
}

/// The durable installation record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Manifest {
    /// Schema version of this document
    pub schema_version: u32,
    /// Version of the tool that last wrote it
    pub tool_version: String,
    /// Base game content
    pub baseline: BaselineIndex,
    /// Installed mods in install order
    pub mods: Vec<ModRecord>,
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            baseline: BaselineIndex::default(),
            mods: Vec::new(),
        }
    }
}

impl Manifest {
    /// Look up an installed mod
    pub fn find_mod(&self, name: &str) -> Option<&ModRecord> {
        self.mods.iter().find(|m| m.name == name)
    }

    /// Remove an installed mod, returning its record
    pub fn remove_mod(&mut self, name: &str) -> Option<ModRecord> {
        let index = self.mods.iter().position(|m| m.name == name)?;
        Some(self.mods.remove(index))
    }

    /// Provenance of a direct patch tier entry
    ///
    /// The most recently installed claim wins. Unclaimed entries known to
    /// the baseline are System.
    pub fn provenance_of(&self, hash: u64) -> Option<Provenance> {
        self.mods
            .iter()
            .rev()
            .flat_map(|m| m.direct.iter())
            .find(|e| e.hash == hash)
            .map(|e| e.provenance)
            .or_else(|| self.baseline.contains(hash).then_some(Provenance::System))
    }

    /// Mod that most recently claimed a direct entry
    pub fn owner_of(&self, hash: u64) -> Option<&str> {
        self.mods
            .iter()
            .rev()
            .find(|m| m.owns_direct(hash))
            .map(|m| m.name.as_str())
    }

    /// Mod that most recently claimed a nested member
    pub fn nested_owner_of(&self, container: &str, path: &str) -> Option<&str> {
        self.mods
            .iter()
            .rev()
            .find(|m| m.owns_nested(container, path))
            .map(|m| m.name.as_str())
    }

    /// Hash to path table of every direct entry claimed by a mod
    ///
    /// The first claim of a hash wins.
    pub fn claimed_paths(&self) -> HashMap<u64, String> {
        let mut table = HashMap::new();
        for entry in self.mods.iter().flat_map(|m| m.direct.iter()) {
            table.entry(entry.hash).or_insert_with(|| entry.path.clone());
        }
        table
    }

    /// Every direct entry owned by a mod
    pub fn mod_direct_files(&self) -> Vec<&DirectEntry> {
        self.mods.iter().flat_map(|m| m.direct.iter()).collect()
    }

    /// Every nested entry owned by a mod
    pub fn mod_nested_files(&self) -> Vec<&NestedEntry> {
        self.mods.iter().flat_map(|m| m.nested.iter()).collect()
    }

    /// Whether a baseline with a base digest has been recorded
    pub fn is_configured(&self) -> bool {
        self.baseline.base_digest.is_some()
    }
}

/// Durable storage for the manifest
pub trait ManifestStore {
    /// Load the manifest; a store that was never written yields an empty one
    fn load(&self) -> Result<Manifest>;

    /// Replace the stored manifest
    fn save(&self, manifest: &Manifest) -> Result<()>;

    /// Whether a manifest has been written
    fn exists(&self) -> bool;
}

/// Manifest stored as a JSON document
#[derive(Debug, Clone)]
pub struct JsonManifestStore {
    path: PathBuf,
}

impl JsonManifestStore {
    /// Store backed by the file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Location of the manifest file
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ManifestStore for JsonManifestStore {
    fn load(&self) -> Result<Manifest> {
        if !self.path.exists() {
            log::debug!("No manifest at {}, starting empty", self.path.display());
            return Ok(Manifest::default());
        }

        let data = fs::read(&self.path)?;
        let manifest: Manifest = serde_json::from_slice(&data)?;
        if manifest.schema_version > SCHEMA_VERSION {
            return Err(Error::config(format!(
                "Manifest schema {} is newer than supported schema {}",
                manifest.schema_version, SCHEMA_VERSION
            )));
        }
        Ok(manifest)
    }

    fn save(&self, manifest: &Manifest) -> Result<()> {
        let parent = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut stamped = manifest.clone();
        stamped.schema_version = SCHEMA_VERSION;
        stamped.tool_version = env!("CARGO_PKG_VERSION").to_string();

        let mut temp_file = NamedTempFile::new_in(parent)?;
        serde_json::to_writer_pretty(temp_file.as_file_mut(), &stamped)?;
        temp_file.as_file_mut().write_all(b"\n")?;
        temp_file.as_file().sync_all()?;
        temp_file
            .persist(&self.path)
            .map_err(|e| Error::Io(e.error))?;

        log::debug!("Saved manifest to {}", self.path.display());
        Ok(())
    }

    fn exists(&self) -> bool {
        self.path.is_file()
    }
}
