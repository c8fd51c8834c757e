//! The merge engine
//!
//! `MergeEngine` owns the codec, the layout and the scratch arena. Every
//! operation takes the manifest explicitly and mutates it in memory; saving
//! it is the caller's job (see [`crate::ModManager`]).
//!
//! Operations are split across submodules:
//!
//! - [`install`](MergeEngine::install) and [`uninstall`](MergeEngine::uninstall)
//! - [`reconcile`](MergeEngine::reconcile)
//! - [`migrate`](MergeEngine::migrate)
//! - [`verify`](MergeEngine::verify)
//! - [`nested_contents`](MergeEngine::nested_contents)

mod inspect;
mod install;
mod integrity;
mod migrate;
mod reconcile;
mod uninstall;

pub use inspect::{NestedListing, NestedMember};
pub use integrity::digest_file;
pub use migrate::MigrationSelection;

use crate::codec::ArchiveCodec;
use crate::config::{Layout, MergeConfig};
use crate::files::FileList;
use crate::fixup;
use crate::manifest::Manifest;
use crate::scratch::ScratchArena;
use crate::{Error, Result};
use dat_archive::ContainerKind;
use std::path::Path;

/// Installs, removes and reconciles mods in the patch tier
#[derive(Debug)]
pub struct MergeEngine<C> {
    codec: C,
    config: MergeConfig,
    layout: Layout,
    scratch: ScratchArena,
}

impl<C: ArchiveCodec> MergeEngine<C> {
    /// Engine for the game installed in `game_dir`
    pub fn new<P: AsRef<Path>>(codec: C, game_dir: P, config: MergeConfig) -> Result<Self> {
        config.validate()?;
        let layout = Layout::new(game_dir, &config);
        let scratch = ScratchArena::new(&layout.scratch);
        Ok(Self {
            codec,
            config,
            layout,
            scratch,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &MergeConfig {
        &self.config
    }

    /// Resolved file locations
    pub fn layout(&self) -> &Layout {
        &self.layout
    }

    /// Container codec
    pub fn codec(&self) -> &C {
        &self.codec
    }

    /// Run `op` between acquiring and releasing the scratch arena
    ///
    /// A failed operation leaves the arena as it is; the next acquire clears it.
    fn with_scratch<T>(&self, op: impl FnOnce() -> Result<T>) -> Result<T> {
        self.scratch.acquire()?;
        let out = op()?;
        self.scratch.release()?;
        Ok(out)
    }

    /// Extract the patch tier into the working directory
    ///
    /// Names claimed by mods are recovered and later duplicates dropped.
    /// Returns the list and the number of duplicates removed. A missing
    /// patch tier yields an empty list.
    fn extract_patch(&self, manifest: &Manifest) -> Result<(FileList, usize)> {
        let working = self.scratch.working();
        self.scratch.reset(&working)?;

        if !self.layout.patch.is_file() {
            log::debug!("No patch tier at {}", self.layout.patch.display());
            return Ok((FileList::new(), 0));
        }

        let names = self
            .codec
            .extract(&self.layout.patch, ContainerKind::Outer, &working)?;
        let mut files = fixup::recover_names(&FileList::from(names), &working, manifest)?;
        let duplicates = files.dedup();
        if duplicates > 0 {
            log::debug!("Dropped {duplicates} duplicate patch tier entries");
        }
        Ok((files, duplicates))
    }

    /// Extract a nested container into `dir`, replacing its contents
    fn extract_nested(&self, container: &Path, dir: &Path) -> Result<FileList> {
        self.scratch.reset(dir)?;
        let members = self.codec.extract(container, ContainerKind::Nested, dir)?;
        Ok(FileList::from(members))
    }

    fn write_container(
        &self,
        path: &Path,
        kind: ContainerKind,
        source_dir: &Path,
        files: &FileList,
        base_offset: u32,
    ) -> Result<()> {
        self.codec
            .write(path, kind, source_dir, files.as_slice(), base_offset)
            .map_err(|source| Error::ContainerWrite {
                path: path.to_path_buf(),
                source,
            })
    }

    fn write_nested(&self, path: &Path, source_dir: &Path, files: &FileList) -> Result<()> {
        self.write_container(
            path,
            ContainerKind::Nested,
            source_dir,
            files,
            self.config.nested_base_offset,
        )
    }

    fn write_patch(&self, files: &FileList) -> Result<()> {
        log::info!(
            "Rebuilding patch tier {} with {} entries",
            self.layout.patch.display(),
            files.len()
        );
        self.write_container(
            &self.layout.patch,
            ContainerKind::Outer,
            &self.scratch.working(),
            files,
            self.config.patch_base_offset,
        )
    }

    fn require_primary_base(&self) -> Result<()> {
        if self.layout.primary_base.is_file() {
            Ok(())
        } else {
            Err(Error::config(format!(
                "Primary base tier not found at {}",
                self.layout.primary_base.display()
            )))
        }
    }
}
