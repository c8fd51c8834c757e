use super::MergeEngine;
use super::integrity::digest_file;
use crate::codec::ArchiveCodec;
use crate::files::{FileList, copy_logical};
use crate::manifest::{BaselineEntry, Manifest, Tier};
use crate::report::MigrationReport;
use crate::Result;
use dat_archive::{ContainerKind, path_hash};

/// Which base game files to move from the patch tier to the primary base tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MigrationSelection {
    /// Every unclaimed patch tier file in the baseline
    AllPatchTier,
    /// Only these logical paths
    Paths(Vec<String>),
}

impl<C: ArchiveCodec> MergeEngine<C> {
    /// Move base game files out of the patch tier into the primary base tier
    ///
    /// Only baseline patch tier entries that no mod claims are eligible. Both
    /// containers are rebuilt and the base tier digest is refreshed.
    pub fn migrate(
        &self,
        manifest: &mut Manifest,
        selection: &MigrationSelection,
    ) -> Result<MigrationReport> {
        let eligible: Vec<u64> = manifest
            .baseline
            .patch_entries()
            .filter(|e| manifest.owner_of(e.hash).is_none())
            .map(|e| e.hash)
            .collect();

        let mut skipped = Vec::new();
        let hashes: Vec<u64> = match selection {
            MigrationSelection::AllPatchTier => eligible,
            MigrationSelection::Paths(paths) => paths
                .iter()
                .filter_map(|p| {
                    let hash = path_hash(p);
                    if eligible.contains(&hash) {
                        Some(hash)
                    } else {
                        log::warn!("{p} is not an unclaimed base game file in the patch tier");
                        skipped.push(p.clone());
                        None
                    }
                })
                .collect(),
        };

        if hashes.is_empty() {
            log::info!("Nothing to migrate");
            return Ok(MigrationReport {
                skipped,
                base_digest: manifest.baseline.base_digest.clone(),
                ..MigrationReport::default()
            });
        }

        let mut report = self.with_scratch(|| self.migrate_hashes(manifest, &hashes))?;
        report.skipped.extend(skipped);
        Ok(report)
    }

    /// Move the given patch tier entries; the scratch arena must be acquired
    pub(super) fn migrate_hashes(
        &self,
        manifest: &mut Manifest,
        hashes: &[u64],
    ) -> Result<MigrationReport> {
        self.require_primary_base()?;
        log::info!(
            "Migrating {} files to {}",
            hashes.len(),
            self.layout.primary_base.display()
        );

        let base_dir = self.scratch.base();
        self.scratch.reset(&base_dir)?;
        let mut zero = FileList::from(self.codec.extract(
            &self.layout.primary_base,
            ContainerKind::Outer,
            &base_dir,
        )?);
        let (mut one, _) = self.extract_patch(manifest)?;
        let working = self.scratch.working();

        let mut report = MigrationReport::default();
        for &hash in hashes {
            let Some(name) = one.find_hash(hash).map(str::to_string) else {
                log::warn!("{hash:016x} is not in the patch tier, skipping");
                report.skipped.push(format!("{hash:016x}"));
                continue;
            };

            let dest = zero.find(&name).unwrap_or(&name).to_string();
            copy_logical(&working, &name, &base_dir, &dest)?;
            zero.push_unique(&dest);
            one.remove(&name);

            let baseline = &mut manifest.baseline;
            let path = baseline
                .find_in(hash, &Tier::Patch)
                .map_or_else(|| name.clone(), |e| e.path.clone());
            baseline
                .entries
                .retain(|e| !(e.hash == hash && matches!(e.tier, Tier::Patch | Tier::Base)));
            baseline.nested.retain(|n| path_hash(&n.container) != hash);
            baseline.entries.push(BaselineEntry {
                hash,
                path: path.clone(),
                tier: Tier::Base,
                compressed: self.config.is_nested(&path),
            });

            log::debug!("Migrated {path}");
            report.migrated.push(path);
        }

        if report.migrated.is_empty() {
            report.base_digest = manifest.baseline.base_digest.clone();
            return Ok(report);
        }

        zero.dedup();
        self.write_container(
            &self.layout.primary_base,
            ContainerKind::Outer,
            &base_dir,
            &zero,
            self.config.primary_base_offset,
        )?;
        self.write_patch(&one)?;

        let digest = digest_file(&self.layout.primary_base)?;
        manifest.baseline.base_digest = Some(digest.clone());
        report.base_digest = Some(digest);
        Ok(report)
    }
}
