use super::MergeEngine;
use crate::codec::ArchiveCodec;
use crate::files::{FileList, copy_logical, same_contents};
use crate::manifest::{Manifest, ModRecord, Tier};
use crate::report::{MergeReport, Warning};
use crate::tier::TierResolver;
use crate::{Error, Result};
use dat_archive::path_hash;

impl<C: ArchiveCodec> MergeEngine<C> {
    /// Remove an installed mod from the patch tier and from `manifest`
    ///
    /// Files other mods contributed to the same nested containers are kept.
    /// Claims that are no longer in the live containers are reported as
    /// warnings.
    pub fn uninstall(&self, manifest: &mut Manifest, name: &str) -> Result<MergeReport> {
        let record = manifest
            .find_mod(name)
            .cloned()
            .ok_or_else(|| Error::ModNotInstalled(name.to_string()))?;

        log::info!("Uninstalling {name}");
        let report = self.with_scratch(|| self.remove_record(manifest, &record))?;
        manifest.remove_mod(name);
        log::info!(
            "Uninstalled {name}: {} direct, {} nested",
            report.direct_files,
            report.nested_files
        );
        Ok(report)
    }

    fn remove_record(&self, manifest: &Manifest, record: &ModRecord) -> Result<MergeReport> {
        let mut report = MergeReport {
            mod_name: record.name.clone(),
            ..MergeReport::default()
        };
        let (mut files, _) = self.extract_patch(manifest)?;

        let containers = record.containers();
        for container in &containers {
            self.unmerge_container(manifest, record, container, &mut files, &mut report)?;
        }

        for entry in &record.direct {
            if containers.iter().any(|c| path_hash(c) == entry.hash) {
                continue;
            }
            let shared = manifest
                .mods
                .iter()
                .any(|m| m.name != record.name && m.owns_direct(entry.hash));
            if shared {
                log::debug!("Keeping {}, also claimed by another mod", entry.path);
                continue;
            }
            if files.remove(&entry.path) {
                report.direct_files += 1;
            } else {
                report.warnings.push(Warning::UnresolvedClaim {
                    mod_name: record.name.clone(),
                    path: entry.path.clone(),
                    container: None,
                });
            }
        }

        self.write_patch(&files)?;
        Ok(report)
    }

    /// Take the mod's members out of one nested container
    fn unmerge_container(
        &self,
        manifest: &Manifest,
        record: &ModRecord,
        container: &str,
        files: &mut FileList,
        report: &mut MergeReport,
    ) -> Result<()> {
        let claims: Vec<_> = record
            .nested
            .iter()
            .filter(|e| path_hash(&e.container) == path_hash(container))
            .collect();

        let Some(name) = files.find(container).map(str::to_string) else {
            for claim in claims {
                report.warnings.push(Warning::UnresolvedClaim {
                    mod_name: record.name.clone(),
                    path: claim.path.clone(),
                    container: Some(container.to_string()),
                });
            }
            return Ok(());
        };

        let working = self.scratch.working();
        let mod_dir = self.scratch.mod_nested();
        let mut members = self.extract_nested(&working.join(&name), &mod_dir)?;
        for claim in claims {
            if members.remove(&claim.path) {
                report.nested_files += 1;
            } else {
                report.warnings.push(Warning::UnresolvedClaim {
                    mod_name: record.name.clone(),
                    path: claim.path.clone(),
                    container: Some(container.to_string()),
                });
            }
        }

        if members.is_empty() {
            files.remove(&name);
            report.containers_removed.push(container.to_string());
            log::debug!("Dropped empty {container}");
            return Ok(());
        }

        let resolver = TierResolver::new(&manifest.baseline, &self.layout);
        let Some(source) = resolver.resolve(container) else {
            // No base original; keep what is left
            self.write_nested(&working.join(&name), &mod_dir, &members)?;
            report.containers_rebuilt.push(container.to_string());
            return Ok(());
        };

        let base_dir = self.scratch.base();
        self.scratch.reset(&base_dir)?;
        let original = base_dir.join(container);
        resolver.materialize(&self.codec, &source, &working, &original)?;

        let game_dir = self.scratch.game_nested();
        let mut game = self.extract_nested(&original, &game_dir)?;

        let claimed_elsewhere = members.iter().any(|m| {
            manifest
                .mods
                .iter()
                .any(|r| r.name != record.name && r.owns_nested(container, m))
        });
        let mut redundant = !claimed_elsewhere
            && manifest
                .baseline
                .find_in(path_hash(container), &Tier::Patch)
                .is_none();
        for member in &members {
            if !redundant {
                break;
            }
            redundant = match game.find(member) {
                Some(original) => same_contents(&mod_dir, member, &game_dir, original)?,
                None => false,
            };
        }
        if redundant {
            files.remove(&name);
            report.containers_removed.push(container.to_string());
            log::debug!("{container} matches its {} original, dropped", source.tier());
            return Ok(());
        }

        for member in &members {
            let dest = game.find(member).unwrap_or(member).to_string();
            copy_logical(&mod_dir, member, &game_dir, &dest)?;
            game.push_unique(&dest);
        }
        self.write_nested(&working.join(&name), &game_dir, &game)?;
        report.containers_rebuilt.push(container.to_string());
        Ok(())
    }
}
