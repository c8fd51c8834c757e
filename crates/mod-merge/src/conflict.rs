//! Conflict detection between a bundle and installed mods

use crate::bundle::ModMetadata;
use crate::manifest::{Manifest, Provenance};
use dat_archive::path_hash;
use std::fmt;

/// A file the bundle would take over from an installed mod
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    /// Logical path of the file
    pub path: String,
    /// Owning nested container, for nested members
    pub container: Option<String>,
    /// Installed mod that owns the file
    pub owner: String,
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.container {
            Some(c) => write!(f, "{c}/{} (owned by {})", self.path, self.owner),
            None => write!(f, "{} (owned by {})", self.path, self.owner),
        }
    }
}

/// Files in `metadata` already owned by installed mods
///
/// Nested containers shared between mods are not conflicts; only their
/// members are compared.
pub fn find_conflicts(manifest: &Manifest, metadata: &ModMetadata) -> Vec<Conflict> {
    let mut conflicts = Vec::new();

    for file in &metadata.direct {
        if metadata.is_container(&file.path) {
            continue;
        }
        let hash = path_hash(&file.path);
        let owner = manifest.mods.iter().find(|m| {
            m.direct
                .iter()
                .any(|e| e.hash == hash && e.provenance == Provenance::Mod)
        });
        if let Some(owner) = owner {
            conflicts.push(Conflict {
                path: file.path.clone(),
                container: None,
                owner: owner.name.clone(),
            });
        }
    }

    for file in &metadata.nested {
        if let Some(owner) = manifest.nested_owner_of(&file.container, &file.path) {
            conflicts.push(Conflict {
                path: file.path.clone(),
                container: Some(file.container.clone()),
                owner: owner.to_string(),
            });
        }
    }

    conflicts
}
