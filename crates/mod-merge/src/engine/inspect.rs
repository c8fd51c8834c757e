use super::MergeEngine;
use crate::codec::ArchiveCodec;
use crate::manifest::{Manifest, Provenance, Tier};
use crate::tier::TierResolver;
use crate::{Error, Result};
use dat_archive::limits::{Limits, validate_entry_path};
use dat_archive::{ContainerKind, normalize_path, path_hash};

/// One member of a nested container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedMember {
    /// Member path
    pub path: String,
    /// Origin of the member
    pub provenance: Provenance,
    /// Mod that supplied the member
    pub owner: Option<String>,
}

/// Effective contents of a nested container
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NestedListing {
    /// Logical path of the container
    pub container: String,
    /// Tier the game loads it from
    pub tier: Tier,
    /// Members in stored order
    pub members: Vec<NestedMember>,
}

impl<C: ArchiveCodec> MergeEngine<C> {
    /// List a nested container as the game sees it
    ///
    /// The patch tier copy wins over base tier copies.
    pub fn nested_contents(&self, manifest: &Manifest, container: &str) -> Result<NestedListing> {
        let container = normalize_path(container);
        validate_entry_path(&container, &Limits::default())?;
        let container = container.as_str();

        self.with_scratch(|| {
            let hash = path_hash(container);
            let dest = self.scratch.base().join(container);

            let in_patch = self.layout.patch.is_file()
                && self
                    .codec
                    .extract_entry(&self.layout.patch, ContainerKind::Outer, hash, &dest)?;
            let tier = if in_patch {
                Tier::Patch
            } else {
                let resolver = TierResolver::new(&manifest.baseline, &self.layout);
                let source = resolver
                    .resolve(container)
                    .ok_or(Error::Archive(dat_archive::Error::EntryNotFound(hash)))?;
                resolver.materialize(&self.codec, &source, &self.scratch.working(), &dest)?;
                source.tier()
            };

            let members = self
                .codec
                .list_contents(&dest, ContainerKind::Nested)?
                .into_iter()
                .map(|path| {
                    let owner = manifest
                        .nested_owner_of(container, &path)
                        .map(str::to_string);
                    NestedMember {
                        provenance: if owner.is_some() {
                            Provenance::Mod
                        } else {
                            Provenance::System
                        },
                        owner,
                        path,
                    }
                })
                .collect();

            Ok(NestedListing {
                container: container.to_string(),
                tier,
                members,
            })
        })
    }
}
