//! Container codec seam
//!
//! The merge engine only needs four directory-level operations from a
//! container codec. Keeping them behind a trait lets tests and other
//! container formats plug in without touching the engine.

use dat_archive::{ContainerKind, DatCodec};
use std::path::Path;

/// Directory-level container operations used by the merge engine
pub trait ArchiveCodec {
    /// Extract every entry into `dest`, returning logical paths in stored order
    fn extract(
        &self,
        container: &Path,
        kind: ContainerKind,
        dest: &Path,
    ) -> dat_archive::Result<Vec<String>>;

    /// Logical paths of every entry without extracting
    fn list_contents(&self, container: &Path, kind: ContainerKind)
    -> dat_archive::Result<Vec<String>>;

    /// Extract one entry by path hash, returning `false` if it is absent
    fn extract_entry(
        &self,
        container: &Path,
        kind: ContainerKind,
        hash: u64,
        dest: &Path,
    ) -> dat_archive::Result<bool>;

    /// Rebuild a container from `files` under `source_dir`
    fn write(
        &self,
        container: &Path,
        kind: ContainerKind,
        source_dir: &Path,
        files: &[String],
        base_offset: u32,
    ) -> dat_archive::Result<()>;
}

impl ArchiveCodec for DatCodec {
    fn extract(
        &self,
        container: &Path,
        kind: ContainerKind,
        dest: &Path,
    ) -> dat_archive::Result<Vec<String>> {
        DatCodec::extract(self, container, kind, dest)
    }

    fn list_contents(
        &self,
        container: &Path,
        kind: ContainerKind,
    ) -> dat_archive::Result<Vec<String>> {
        DatCodec::list_contents(self, container, kind)
    }

    fn extract_entry(
        &self,
        container: &Path,
        kind: ContainerKind,
        hash: u64,
        dest: &Path,
    ) -> dat_archive::Result<bool> {
        DatCodec::extract_entry(self, container, kind, hash, dest)
    }

    fn write(
        &self,
        container: &Path,
        kind: ContainerKind,
        source_dir: &Path,
        files: &[String],
        base_offset: u32,
    ) -> dat_archive::Result<()> {
        DatCodec::write(self, container, kind, source_dir, files, base_offset)
    }
}
