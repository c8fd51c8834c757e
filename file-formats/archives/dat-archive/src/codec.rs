//! Directory-level extract and rebuild operations
//!
//! The merge engine never touches entries one at a time. It extracts a whole
//! container into a scratch directory, edits the tree and an ordered list of
//! logical paths, then writes the container back from that list.

use crate::limits::{Limits, validate_entry_path};
use crate::{Container, ContainerInfo, ContainerKind, ContainerWriter, Dictionary, Result};
use std::fs;
use std::path::Path;

/// Extracts containers to directories and rebuilds them from directories
#[derive(Debug, Clone, Default)]
pub struct DatCodec {
    dictionary: Dictionary,
    limits: Limits,
}

impl DatCodec {
    /// Codec with an empty dictionary and default limits
    pub fn new() -> Self {
        Self::default()
    }

    /// Codec that names outer entries from a dictionary
    pub fn with_dictionary(dictionary: Dictionary) -> Self {
        Self {
            dictionary,
            limits: Limits::default(),
        }
    }

    /// Replace the read limits
    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// The dictionary used for outer containers
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    fn open(&self, container: &Path, kind: ContainerKind) -> Result<Container> {
        Container::open_with_limits(container, kind, &self.limits)
    }

    fn entry_name(&self, kind: ContainerKind, entry: &crate::Entry) -> String {
        match kind {
            ContainerKind::Outer => entry.display_name(Some(&self.dictionary)),
            ContainerKind::Nested => entry.display_name(None),
        }
    }

    /// Extract every entry into `dest`, returning logical paths in stored order
    ///
    /// Outer entries without a dictionary name are written under their hash
    /// placeholder.
    pub fn extract(&self, container: &Path, kind: ContainerKind, dest: &Path) -> Result<Vec<String>> {
        let mut archive = self.open(container, kind)?;
        let entries = archive.entries().to_vec();
        let mut names = Vec::with_capacity(entries.len());

        fs::create_dir_all(dest)?;
        for entry in &entries {
            let name = self.entry_name(kind, entry);
            validate_entry_path(&name, &self.limits)?;

            let data = archive.read_entry(entry)?;
            let target = dest.join(&name);
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::write(&target, data)?;
            names.push(name);
        }

        log::debug!(
            "Extracted {} entries from {} to {}",
            names.len(),
            container.display(),
            dest.display()
        );
        Ok(names)
    }

    /// Logical paths of every entry, without extracting anything
    pub fn list_contents(&self, container: &Path, kind: ContainerKind) -> Result<Vec<String>> {
        let archive = self.open(container, kind)?;
        Ok(archive
            .entries()
            .iter()
            .map(|entry| self.entry_name(kind, entry))
            .collect())
    }

    /// Extract the entry with the given hash to `dest`
    ///
    /// Returns `false` when the container has no such entry.
    pub fn extract_entry(
        &self,
        container: &Path,
        kind: ContainerKind,
        hash: u64,
        dest: &Path,
    ) -> Result<bool> {
        let mut archive = self.open(container, kind)?;
        let Some(entry) = archive.find(hash).cloned() else {
            return Ok(false);
        };

        let data = archive.read_entry(&entry)?;
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(dest, data)?;
        Ok(true)
    }

    /// Rebuild `container` from `files` found under `source_dir`
    ///
    /// Entry order follows `files`. A later file whose hash repeats an earlier
    /// one is skipped.
    pub fn write(
        &self,
        container: &Path,
        kind: ContainerKind,
        source_dir: &Path,
        files: &[String],
        base_offset: u32,
    ) -> Result<()> {
        let mut writer = ContainerWriter::new(kind).base_offset(base_offset);
        for name in files {
            validate_entry_path(name, &self.limits)?;
            writer = writer.add_file(source_dir.join(name), name);
        }
        writer.write(container)
    }

    /// Summary of a container
    pub fn info(&self, container: &Path, kind: ContainerKind) -> Result<ContainerInfo> {
        Ok(self.open(container, kind)?.info())
    }
}
