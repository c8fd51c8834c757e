//! Mod bundles
//!
//! A bundle is a zip file or a directory holding `metadata.json` plus the
//! payload files at their logical paths. Files inside nested containers ship
//! as a nested container holding only the mod's members.
//!
//! ```json
//! {
//!   "name": "Camo",
//!   "version": "1.2",
//!   "author": "someone",
//!   "direct": [{ "path": "config.bin" }],
//!   "nested": [{ "container": "Assets/weapon.fpk", "path": "c.dat" }]
//! }
//! ```

use crate::report::Warning;
use crate::{Error, Result};
use dat_archive::limits::{Limits, validate_entry_path};
use dat_archive::{normalize_path, path_hash};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the metadata document inside a bundle
pub const METADATA_FILE: &str = "metadata.json";

/// A file placed directly in the patch tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectFile {
    /// Logical path
    pub path: String,
}

/// A file placed inside a nested container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NestedFile {
    /// Logical path of the nested container
    pub container: String,
    /// Member path inside the container
    pub path: String,
}

/// Bundle metadata document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModMetadata {
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
    #[serde(default)]
    pub game_version: Option<String>,
    /// Oldest tool version able to install the mod
    #[serde(default)]
    pub min_tool_version: Option<String>,
    /// Files placed directly in the patch tier
    #[serde(default)]
    pub direct: Vec<DirectFile>,
    /// Files placed inside nested containers
    #[serde(default)]
    pub nested: Vec<NestedFile>,
}

impl ModMetadata {
    /// Parse and validate a metadata document
    pub fn from_json(data: &[u8]) -> Result<Self> {
        let mut metadata: Self = serde_json::from_slice(data)
            .map_err(|e| Error::bundle_format(format!("Unparsable {METADATA_FILE}: {e}")))?;
        metadata.normalize();
        metadata.validate()?;
        Ok(metadata)
    }

    fn normalize(&mut self) {
        self.name = self.name.trim().to_string();
        for file in &mut self.direct {
            file.path = normalize_path(&file.path);
        }
        for file in &mut self.nested {
            file.container = normalize_path(&file.container);
            file.path = normalize_path(&file.path);
        }
    }

    /// Reject empty names and unsafe paths
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(Error::bundle_format("Mod name is empty"));
        }

        let limits = Limits::default();
        let paths = self
            .direct
            .iter()
            .map(|f| f.path.as_str())
            .chain(self.nested.iter().flat_map(|f| [f.container.as_str(), f.path.as_str()]));
        for path in paths {
            validate_entry_path(path, &limits)
                .map_err(|e| Error::bundle_format(format!("Bad path {path:?}: {e}")))?;
        }
        Ok(())
    }

    /// Distinct nested containers, in first-seen order
    pub fn containers(&self) -> Vec<&str> {
        let mut seen = Vec::new();
        let mut out = Vec::new();
        for file in &self.nested {
            let hash = path_hash(&file.container);
            if !seen.contains(&hash) {
                seen.push(hash);
                out.push(file.container.as_str());
            }
        }
        out
    }

    /// Declared members of one nested container
    pub fn members_of(&self, container: &str) -> Vec<&str> {
        let hash = path_hash(container);
        self.nested
            .iter()
            .filter(|f| path_hash(&f.container) == hash)
            .map(|f| f.path.as_str())
            .collect()
    }

    /// Whether `path` is one of the nested containers the mod merges into
    pub fn is_container(&self, path: &str) -> bool {
        let hash = path_hash(path);
        self.nested.iter().any(|f| path_hash(&f.container) == hash)
    }

    /// Compare version requirements against the running tool and game
    pub fn version_warnings(&self, game_version: Option<&str>) -> Vec<Warning> {
        let mut warnings = Vec::new();
        let tool = env!("CARGO_PKG_VERSION");

        if let Some(required) = &self.min_tool_version {
            if version_less(tool, required) {
                warnings.push(Warning::VersionMismatch {
                    subject: "tool version".to_string(),
                    required: required.clone(),
                    found: tool.to_string(),
                });
            }
        }

        if let (Some(required), Some(found)) = (&self.game_version, game_version) {
            if required != found {
                warnings.push(Warning::VersionMismatch {
                    subject: "game version".to_string(),
                    required: required.clone(),
                    found: found.to_string(),
                });
            }
        }
        warnings
    }
}

/// Compare dotted numeric versions; non-numeric parts count as zero
fn version_less(a: &str, b: &str) -> bool {
    let parse = |v: &str| -> Vec<u64> {
        v.split('.')
            .map(|part| part.trim().parse().unwrap_or(0))
            .collect()
    };
    let (mut a, mut b) = (parse(a), parse(b));
    let len = a.len().max(b.len());
    a.resize(len, 0);
    b.resize(len, 0);
    a < b
}

/// Source of a mod bundle
pub trait BundleSource {
    /// Read and validate the metadata document
    fn metadata(&self) -> Result<ModMetadata>;

    /// Copy every payload file into `dest`
    fn unpack(&self, dest: &Path) -> Result<()>;

    /// Human readable location, for logging
    fn describe(&self) -> String;
}

/// An unpacked bundle directory
#[derive(Debug, Clone)]
pub struct DirectoryBundle {
    root: PathBuf,
}

impl DirectoryBundle {
    /// Bundle rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }
}

impl BundleSource for DirectoryBundle {
    fn metadata(&self) -> Result<ModMetadata> {
        let path = self.root.join(METADATA_FILE);
        let data = fs::read(&path).map_err(|e| {
            Error::bundle_format(format!("Cannot read {}: {e}", path.display()))
        })?;
        ModMetadata::from_json(&data)
    }

    fn unpack(&self, dest: &Path) -> Result<()> {
        for entry in WalkDir::new(&self.root).follow_links(false) {
            let entry = entry.map_err(|e| Error::Io(e.into()))?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.root)
                .map_err(|e| Error::bundle_format(e.to_string()))?;
            let target = dest.join(relative);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::copy(entry.path(), &target)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.root.display().to_string()
    }
}

/// A zipped bundle
#[derive(Debug, Clone)]
pub struct ZipBundle {
    path: PathBuf,
}

impl ZipBundle {
    /// Bundle stored in the zip file at `path`
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    fn open(&self) -> Result<zip::ZipArchive<fs::File>> {
        let file = fs::File::open(&self.path).map_err(|e| {
            Error::bundle_format(format!("Cannot open {}: {e}", self.path.display()))
        })?;
        zip::ZipArchive::new(file).map_err(|e| {
            Error::bundle_format(format!("Cannot read {}: {e}", self.path.display()))
        })
    }
}

impl BundleSource for ZipBundle {
    fn metadata(&self) -> Result<ModMetadata> {
        let mut archive = self.open()?;
        let mut file = archive.by_name(METADATA_FILE).map_err(|e| {
            Error::bundle_format(format!("{METADATA_FILE} not found in bundle: {e}"))
        })?;
        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        ModMetadata::from_json(&data)
    }

    fn unpack(&self, dest: &Path) -> Result<()> {
        let mut archive = self.open()?;
        for i in 0..archive.len() {
            let mut file = archive
                .by_index(i)
                .map_err(|e| Error::bundle_format(format!("Bad bundle entry {i}: {e}")))?;
            let Some(relative) = file.enclosed_name() else {
                log::warn!("Skipping unsafe bundle entry {}", file.name());
                continue;
            };

            let target = dest.join(relative);
            if file.is_dir() {
                fs::create_dir_all(&target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = fs::File::create(&target)?;
            std::io::copy(&mut file, &mut out)?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Open a bundle from a directory or a zip file
pub fn open_bundle<P: AsRef<Path>>(path: P) -> Result<Box<dyn BundleSource>> {
    let path = path.as_ref();
    if path.is_dir() {
        Ok(Box::new(DirectoryBundle::new(path)))
    } else if path.is_file() {
        Ok(Box::new(ZipBundle::new(path)))
    } else {
        Err(Error::bundle_format(format!(
            "Bundle not found: {}",
            path.display()
        )))
    }
}
