use super::MergeEngine;
use crate::bundle::{BundleSource, ModMetadata};
use crate::codec::ArchiveCodec;
use crate::files::{FileList, copy_logical};
use crate::manifest::{DirectEntry, Manifest, ModRecord, NestedEntry, Provenance};
use crate::report::{MergeReport, Warning};
use crate::tier::{TierResolver, TierSource};
use crate::{Error, Result};
use dat_archive::path_hash;
use std::collections::HashSet;

impl<C: ArchiveCodec> MergeEngine<C> {
    /// Merge a bundle into the patch tier and record it in `manifest`
    ///
    /// The bundle metadata is read and checked before anything on disk
    /// changes, and the bundle's nested containers are parsed before any
    /// tier is rewritten. Base game files in the patch tier that the bundle
    /// would overwrite are then moved to the primary base tier so uninstall
    /// can restore them.
    pub fn install(&self, manifest: &mut Manifest, bundle: &dyn BundleSource) -> Result<MergeReport> {
        let metadata = bundle.metadata()?;
        if manifest.find_mod(&metadata.name).is_some() {
            return Err(Error::AlreadyInstalled(metadata.name));
        }

        log::info!("Installing {} from {}", metadata.name, bundle.describe());
        let report = self.with_scratch(|| self.install_bundle(manifest, bundle, &metadata))?;
        log::info!(
            "Installed {}: {} direct, {} nested",
            report.mod_name,
            report.direct_files,
            report.nested_files
        );
        Ok(report)
    }

    fn install_bundle(
        &self,
        manifest: &mut Manifest,
        bundle: &dyn BundleSource,
        metadata: &ModMetadata,
    ) -> Result<MergeReport> {
        let mut report = MergeReport {
            mod_name: metadata.name.clone(),
            ..MergeReport::default()
        };
        for warning in metadata.version_warnings(self.config.game_version.as_deref()) {
            report.warnings.push(warning);
        }

        let extracted = self.scratch.extracted();
        self.scratch.reset(&extracted)?;
        bundle.unpack(&extracted)?;
        self.check_nested_payloads(metadata)?;

        self.fold_system_files(manifest, metadata, &mut report)?;

        let (mut files, _) = self.extract_patch(manifest)?;

        let mut record = ModRecord {
            name: metadata.name.clone(),
            version: metadata.version.clone(),
            author: metadata.author.clone(),
            website: metadata.website.clone(),
            description: metadata.description.clone(),
            game_version: metadata.game_version.clone(),
            direct: Vec::new(),
            nested: Vec::new(),
        };

        for container in metadata.containers() {
            self.merge_container(manifest, metadata, container, &mut files, &mut record, &mut report)?;
        }

        let working = self.scratch.working();
        for file in &metadata.direct {
            let hash = path_hash(&file.path);
            if metadata.is_container(&file.path) || record.owns_direct(hash) {
                continue;
            }
            if !extracted.join(&file.path).is_file() {
                report.warnings.push(Warning::MissingSource {
                    path: file.path.clone(),
                    container: None,
                });
                continue;
            }

            let dest = files.find(&file.path).unwrap_or(&file.path).to_string();
            copy_logical(&extracted, &file.path, &working, &dest)?;
            files.push_unique(&dest);
            log::debug!("Added {}", file.path);

            record.direct.push(DirectEntry {
                hash,
                path: file.path.clone(),
                provenance: Provenance::Mod,
                owner: metadata.name.clone(),
            });
            report.direct_files += 1;
        }

        self.write_patch(&files)?;
        manifest.mods.push(record);
        Ok(report)
    }

    /// Merge the mod's copy of one nested container into the winning tier copy
    fn merge_container(
        &self,
        manifest: &Manifest,
        metadata: &ModMetadata,
        container: &str,
        files: &mut FileList,
        record: &mut ModRecord,
        report: &mut MergeReport,
    ) -> Result<()> {
        let working = self.scratch.working();
        let extracted = self.scratch.extracted();
        let declared = metadata.members_of(container);

        if !extracted.join(container).is_file() {
            for member in declared {
                report.warnings.push(Warning::MissingSource {
                    path: member.to_string(),
                    container: Some(container.to_string()),
                });
            }
            return Ok(());
        }

        let mod_dir = self.scratch.mod_nested();
        let mod_members = self.extract_nested(&extracted.join(container), &mod_dir)?;

        let resolver = TierResolver::new(&manifest.baseline, &self.layout).with_working(files);
        let (target, provenance) = match resolver.resolve(container) {
            Some(TierSource::Working(name)) => (name, Provenance::Merged),
            Some(source) => {
                log::debug!("Using {container} from the {} tier", source.tier());
                resolver.materialize(&self.codec, &source, &working, &working.join(container))?;
                (container.to_string(), Provenance::Merged)
            }
            None => {
                report.warnings.push(Warning::UnresolvedSubContainer {
                    container: container.to_string(),
                });
                copy_logical(&extracted, container, &working, container)?;
                (container.to_string(), Provenance::Mod)
            }
        };

        if provenance == Provenance::Merged {
            let game_dir = self.scratch.game_nested();
            let mut game = self.extract_nested(&working.join(&target), &game_dir)?;
            for member in &mod_members {
                let dest = game.find(member).unwrap_or(member).to_string();
                copy_logical(&mod_dir, member, &game_dir, &dest)?;
                game.push_unique(&dest);
            }
            self.write_nested(&working.join(&target), &game_dir, &game)?;
            report.containers_rebuilt.push(container.to_string());
            log::debug!("Merged {} files into {container}", mod_members.len());
        }
        files.push_unique(&target);

        let merged: HashSet<u64> = mod_members.hashes();
        for member in &mod_members {
            record.nested.push(NestedEntry {
                container: container.to_string(),
                hash: path_hash(member),
                path: member.clone(),
                provenance: Provenance::Mod,
                owner: metadata.name.clone(),
            });
            report.nested_files += 1;
        }
        for member in declared {
            if !merged.contains(&path_hash(member)) {
                report.warnings.push(Warning::MissingSource {
                    path: member.to_string(),
                    container: Some(container.to_string()),
                });
            }
        }

        let hash = path_hash(container);
        if !record.owns_direct(hash) {
            record.direct.push(DirectEntry {
                hash,
                path: container.to_string(),
                provenance,
                owner: metadata.name.clone(),
            });
        }
        Ok(())
    }

    /// Parse every nested container shipped by the bundle
    ///
    /// Folding rewrites both tiers, so a bad payload has to be caught first.
    fn check_nested_payloads(&self, metadata: &ModMetadata) -> Result<()> {
        let extracted = self.scratch.extracted();
        let mod_dir = self.scratch.mod_nested();
        for container in metadata.containers() {
            let path = extracted.join(container);
            if path.is_file() {
                let members = self.extract_nested(&path, &mod_dir)?;
                log::debug!("{container} carries {} members", members.len());
            }
        }
        Ok(())
    }

    /// Move unclaimed base game files the bundle touches out of the patch tier
    fn fold_system_files(
        &self,
        manifest: &mut Manifest,
        metadata: &ModMetadata,
        report: &mut MergeReport,
    ) -> Result<()> {
        let touched: HashSet<u64> = metadata
            .direct
            .iter()
            .map(|f| path_hash(&f.path))
            .chain(metadata.containers().into_iter().map(path_hash))
            .collect();

        let hashes: Vec<u64> = manifest
            .baseline
            .patch_entries()
            .filter(|e| touched.contains(&e.hash) && manifest.owner_of(e.hash).is_none())
            .map(|e| e.hash)
            .collect();
        if hashes.is_empty() {
            return Ok(());
        }

        let migration = self.migrate_hashes(manifest, &hashes)?;
        for path in migration.migrated {
            report.warnings.push(Warning::FoldedSystemFile { path });
        }
        Ok(())
    }
}
