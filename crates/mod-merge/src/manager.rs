//! Persistence boundary around the merge engine
//!
//! Each operation loads the manifest, checks the base tier digest where the
//! operation depends on it, runs the engine and saves the manifest once at
//! the end. Nothing is saved when an operation fails, except the baseline
//! of an install that had already moved base game files.

use crate::bundle::BundleSource;
use crate::codec::ArchiveCodec;
use crate::config::MergeConfig;
use crate::conflict::find_conflicts;
use crate::engine::{MergeEngine, MigrationSelection, NestedListing};
use crate::manifest::{JsonManifestStore, Manifest, ManifestStore, ModRecord};
use crate::report::{MergeReport, MigrationReport, ReconcileReport};
use crate::{Error, Result};
use dat_archive::{DatCodec, Dictionary};
use std::path::Path;

/// Result of first-time setup
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupReport {
    /// Baseline reconcile
    pub reconcile: ReconcileReport,
    /// Migration of base game files out of the patch tier, if requested
    pub migration: Option<MigrationReport>,
}

/// Mod manager for one game installation
#[derive(Debug)]
pub struct ModManager<C, S> {
    engine: MergeEngine<C>,
    store: S,
}

impl ModManager<DatCodec, JsonManifestStore> {
    /// Manager using the container codec and a JSON manifest in `game_dir`
    pub fn open<P: AsRef<Path>>(game_dir: P, config: MergeConfig) -> Result<Self> {
        let game_dir = game_dir.as_ref();
        let codec = match &config.dictionary {
            Some(path) => {
                let dictionary = Dictionary::load(game_dir.join(path))?;
                log::debug!("Loaded {} dictionary names", dictionary.len());
                DatCodec::with_dictionary(dictionary)
            }
            None => DatCodec::new(),
        };
        let engine = MergeEngine::new(codec, game_dir, config)?;
        let store = JsonManifestStore::new(&engine.layout().manifest);
        Ok(Self::new(engine, store))
    }
}

impl<C: ArchiveCodec, S: ManifestStore> ModManager<C, S> {
    /// Manager over an engine and a manifest store
    pub fn new(engine: MergeEngine<C>, store: S) -> Self {
        Self { engine, store }
    }

    /// The underlying engine
    pub fn engine(&self) -> &MergeEngine<C> {
        &self.engine
    }

    /// Whether setup has recorded a baseline for this installation
    ///
    /// A stored manifest without a base tier digest does not count.
    pub fn is_configured(&self) -> bool {
        self.store.exists() && self.store.load().is_ok_and(|m| m.is_configured())
    }

    /// Current manifest
    pub fn manifest(&self) -> Result<Manifest> {
        self.store.load()
    }

    /// Installed mods in install order
    pub fn installed(&self) -> Result<Vec<ModRecord>> {
        Ok(self.store.load()?.mods)
    }

    fn load_verified(&self) -> Result<Manifest> {
        let manifest = self.store.load()?;
        self.engine.verify(&manifest)?;
        Ok(manifest)
    }

    /// Record the baseline and optionally move base game files out of the patch tier
    pub fn setup(&self, migrate: bool) -> Result<SetupReport> {
        let mut manifest = self.store.load()?;
        let reconcile = self.engine.reconcile(&mut manifest)?;
        let migration = if migrate {
            Some(
                self.engine
                    .migrate(&mut manifest, &MigrationSelection::AllPatchTier)?,
            )
        } else {
            None
        };
        self.store.save(&manifest)?;
        Ok(SetupReport {
            reconcile,
            migration,
        })
    }

    /// Install a bundle
    ///
    /// Unless `force` is set, files owned by installed mods are a conflict
    /// when conflict checking is enabled.
    pub fn install(&self, bundle: &dyn BundleSource, force: bool) -> Result<MergeReport> {
        let mut manifest = self.load_verified()?;
        let metadata = bundle.metadata()?;
        if manifest.find_mod(&metadata.name).is_some() {
            return Err(Error::AlreadyInstalled(metadata.name));
        }

        if self.engine.config().conflict_check && !force {
            let conflicts = find_conflicts(&manifest, &metadata);
            if !conflicts.is_empty() {
                return Err(Error::ModConflict {
                    name: metadata.name,
                    conflicts: conflicts.iter().map(ToString::to_string).collect(),
                });
            }
        }

        let digest = manifest.baseline.base_digest.clone();
        match self.engine.install(&mut manifest, bundle) {
            Ok(report) => {
                self.store.save(&manifest)?;
                Ok(report)
            }
            Err(err) => {
                // Base game files were already folded into the base tier
                if manifest.baseline.base_digest != digest {
                    log::warn!("Install failed after the base tier changed, saving the new baseline");
                    self.store.save(&manifest)?;
                }
                Err(err)
            }
        }
    }

    /// Uninstall a mod by name
    pub fn uninstall(&self, name: &str) -> Result<MergeReport> {
        let mut manifest = self.load_verified()?;
        if manifest.find_mod(name).is_none() {
            return Err(Error::ModNotInstalled(name.to_string()));
        }
        let report = self.engine.uninstall(&mut manifest, name)?;
        self.store.save(&manifest)?;
        Ok(report)
    }

    /// Resynchronize the manifest with the containers on disk
    pub fn reconcile(&self) -> Result<ReconcileReport> {
        let mut manifest = self.store.load()?;
        let report = self.engine.reconcile(&mut manifest)?;
        self.store.save(&manifest)?;
        Ok(report)
    }

    /// Move base game files from the patch tier to the primary base tier
    pub fn migrate(&self, selection: &MigrationSelection) -> Result<MigrationReport> {
        let mut manifest = self.load_verified()?;
        let report = self.engine.migrate(&mut manifest, selection)?;
        self.store.save(&manifest)?;
        Ok(report)
    }

    /// Check the primary base tier against the recorded digest
    pub fn verify(&self) -> Result<()> {
        let manifest = self.store.load()?;
        self.engine.verify(&manifest)
    }

    /// Effective contents of a nested container
    pub fn nested_contents(&self, container: &str) -> Result<NestedListing> {
        let manifest = self.store.load()?;
        self.engine.nested_contents(&manifest, container)
    }
}
