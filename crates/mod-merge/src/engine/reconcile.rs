use super::MergeEngine;
use super::integrity::digest_file;
use crate::codec::ArchiveCodec;
use crate::manifest::{BaselineEntry, BaselineIndex, Manifest, NestedEntry, Provenance, Tier};
use crate::report::ReconcileReport;
use crate::Result;
use dat_archive::{ContainerKind, path_hash};
use std::collections::HashSet;

impl<C: ArchiveCodec> MergeEngine<C> {
    /// Resynchronize `manifest` with the containers on disk
    ///
    /// Claims no longer present in the patch tier are pruned, mods left with
    /// nothing are dropped, and the baseline is rebuilt from the base tiers
    /// plus every unclaimed patch tier entry. Running it twice without an
    /// intervening change yields the same manifest.
    pub fn reconcile(&self, manifest: &mut Manifest) -> Result<ReconcileReport> {
        self.require_primary_base()?;
        log::info!("Reconciling manifest with {}", self.layout.patch.display());
        let report = self.with_scratch(|| self.reconcile_manifest(manifest))?;
        log::info!(
            "Baseline has {} entries and {} nested entries, pruned {} claims",
            report.baseline_entries,
            report.baseline_nested,
            report.pruned.len()
        );
        Ok(report)
    }

    fn reconcile_manifest(&self, manifest: &mut Manifest) -> Result<ReconcileReport> {
        let mut report = ReconcileReport::default();
        let (files, duplicates) = self.extract_patch(manifest)?;
        report.duplicates = duplicates;

        // Flat index of every nested member in the patch tier
        let working = self.scratch.working();
        let mut nested_index: Vec<(String, String)> = Vec::new();
        for name in files.iter().filter(|f| self.config.is_nested(f)) {
            match self
                .codec
                .list_contents(&working.join(name), ContainerKind::Nested)
            {
                Ok(members) => {
                    nested_index.extend(members.into_iter().map(|m| (name.to_string(), m)));
                }
                Err(e) => log::warn!("Cannot list nested container {name}: {e}"),
            }
        }

        let live = files.hashes();
        let live_nested: HashSet<(u64, u64)> = nested_index
            .iter()
            .map(|(c, m)| (path_hash(c), path_hash(m)))
            .collect();

        for record in &mut manifest.mods {
            let owner = record.name.clone();
            let mut pruned_containers = HashSet::new();

            record.direct.retain(|entry| {
                let keep = live.contains(&entry.hash);
                if !keep {
                    pruned_containers.insert(entry.hash);
                    report.pruned.push(format!("{owner}: {}", entry.path));
                }
                keep
            });
            record.nested.retain(|entry| {
                let container = path_hash(&entry.container);
                let keep = !pruned_containers.contains(&container)
                    && live_nested.contains(&(container, entry.hash));
                if !keep {
                    report
                        .pruned
                        .push(format!("{owner}: {}/{}", entry.container, entry.path));
                }
                keep
            });
        }

        manifest.mods.retain(|record| {
            if record.is_empty() {
                log::warn!("Dropping {}, none of its files remain", record.name);
                report.dropped_mods.push(record.name.clone());
                false
            } else {
                true
            }
        });

        let mut baseline = BaselineIndex::default();
        for (tier, path) in self.layout.base_tiers() {
            for name in self.codec.list_contents(&path, ContainerKind::Outer)? {
                baseline.entries.push(BaselineEntry {
                    hash: path_hash(&name),
                    compressed: self.config.is_nested(&name),
                    path: name,
                    tier: tier.clone(),
                });
            }
        }

        for name in &files {
            let hash = path_hash(name);
            if manifest.mods.iter().any(|m| m.owns_direct(hash)) {
                continue;
            }
            baseline.entries.push(BaselineEntry {
                hash,
                path: name.clone(),
                tier: Tier::Patch,
                compressed: self.config.is_nested(name),
            });
        }

        for (container, member) in nested_index {
            if manifest.mods.iter().any(|m| m.owns_nested(&container, &member)) {
                continue;
            }
            baseline.nested.push(NestedEntry {
                container,
                hash: path_hash(&member),
                path: member,
                provenance: Provenance::System,
                owner: String::new(),
            });
        }

        baseline.base_digest = Some(digest_file(&self.layout.primary_base)?);
        report.baseline_entries = baseline.entries.len();
        report.baseline_nested = baseline.nested.len();
        manifest.baseline = baseline;
        Ok(report)
    }
}
