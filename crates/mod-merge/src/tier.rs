//! Tier resolution
//!
//! Install, uninstall, migration and inspection all need to answer the same
//! question: which copy of a logical file wins? The search order is the
//! working patch tier list (when one is given), then the primary base tier,
//! then each secondary base tier in configured order.

use crate::codec::ArchiveCodec;
use crate::config::Layout;
use crate::files::FileList;
use crate::manifest::{BaselineIndex, Tier};
use crate::{Error, Result};
use dat_archive::{ContainerKind, path_hash};
use std::path::Path;

/// Where a resolved file lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TierSource {
    /// Already extracted into the working tree under this name
    Working(String),
    /// Stored in a base tier container
    Stored {
        /// Tier holding the file
        tier: Tier,
        /// Path hash of the file
        hash: u64,
        /// Name recorded in the baseline
        path: String,
    },
}

impl TierSource {
    /// Tier the source belongs to
    pub fn tier(&self) -> Tier {
        match self {
            TierSource::Working(_) => Tier::Patch,
            TierSource::Stored { tier, .. } => tier.clone(),
        }
    }
}

/// Priority search over the working list and the base tiers
#[derive(Debug)]
pub struct TierResolver<'a> {
    baseline: &'a BaselineIndex,
    layout: &'a Layout,
    working: Option<&'a FileList>,
}

impl<'a> TierResolver<'a> {
    /// Search the base tiers recorded in `baseline`
    pub fn new(baseline: &'a BaselineIndex, layout: &'a Layout) -> Self {
        Self {
            baseline,
            layout,
            working: None,
        }
    }

    /// Search the working patch tier list first
    pub fn with_working(mut self, working: &'a FileList) -> Self {
        self.working = Some(working);
        self
    }

    /// Base tiers in priority order
    fn base_order(&self) -> Vec<Tier> {
        std::iter::once(Tier::Base)
            .chain(
                self.layout
                    .secondary_bases
                    .iter()
                    .map(|(name, _)| Tier::Secondary(name.clone())),
            )
            .collect()
    }

    /// First source holding `path`, if any
    pub fn resolve(&self, path: &str) -> Option<TierSource> {
        if let Some(name) = self.working.and_then(|w| w.find(path)) {
            return Some(TierSource::Working(name.to_string()));
        }

        let hash = path_hash(path);
        self.base_order().into_iter().find_map(|tier| {
            self.baseline.find_in(hash, &tier).map(|entry| TierSource::Stored {
                tier,
                hash,
                path: entry.path.clone(),
            })
        })
    }

    /// Make the source available as the file `dest`
    ///
    /// Working sources are copied from `working_dir`; stored sources are
    /// extracted from their tier container.
    pub fn materialize<C: ArchiveCodec>(
        &self,
        codec: &C,
        source: &TierSource,
        working_dir: &Path,
        dest: &Path,
    ) -> Result<()> {
        match source {
            TierSource::Working(name) => {
                let from = working_dir.join(name);
                if from != dest {
                    if let Some(parent) = dest.parent() {
                        std::fs::create_dir_all(parent)?;
                    }
                    std::fs::copy(from, dest)?;
                }
                Ok(())
            }
            TierSource::Stored { tier, hash, path } => {
                let container = self.layout.tier_path(tier).ok_or_else(|| {
                    Error::config(format!("No container configured for tier {tier}"))
                })?;
                if codec.extract_entry(&container, ContainerKind::Outer, *hash, dest)? {
                    log::debug!("Materialized {path} from {tier} tier");
                    Ok(())
                } else {
                    Err(Error::Archive(dat_archive::Error::EntryNotFound(*hash)))
                }
            }
        }
    }
}
