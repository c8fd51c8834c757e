//! Filename recovery for extracted outer containers
//!
//! Outer containers store hashes only, so an extracted patch tier is full of
//! placeholder names. Mod records remember the real path of everything they
//! installed. Recovery runs in two passes: build a hash to path table from
//! the manifest, then relabel the extracted list and move the files on disk.

use crate::Result;
use crate::files::FileList;
use crate::manifest::Manifest;
use dat_archive::path_hash;
use std::collections::HashMap;
use std::fs;
use std::path::Path;

/// Pass one: hash to real path for every mod-claimed entry
pub fn name_table(manifest: &Manifest) -> HashMap<u64, String> {
    manifest.claimed_paths()
}

/// Pass two: rename extracted files under `dir` to their recorded paths
///
/// Returns the relabelled list in the original order.
pub fn apply_names(files: &FileList, dir: &Path, table: &HashMap<u64, String>) -> Result<FileList> {
    let mut renamed = files.clone();
    let mut count = 0usize;

    for (index, name) in files.iter().enumerate() {
        let Some(real) = table.get(&path_hash(name)) else {
            continue;
        };
        if real == name {
            continue;
        }

        let source = dir.join(name);
        let target = dir.join(real);
        if source.exists() {
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            fs::rename(&source, &target)?;
        }
        renamed.rename(index, real);
        count += 1;
    }

    if count > 0 {
        log::debug!("Recovered {count} file names in {}", dir.display());
    }
    Ok(renamed)
}

/// Run both passes
pub fn recover_names(files: &FileList, dir: &Path, manifest: &Manifest) -> Result<FileList> {
    apply_names(files, dir, &name_table(manifest))
}
