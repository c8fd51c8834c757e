//! # mod_merge - Mod merge engine for hash-indexed game containers
//!
//! Installs third-party mods into a game's patch tier container and removes
//! them again without disturbing unrelated content.
//!
//! The game keeps its assets in two kinds of container. Outer containers sit
//! on disk in tiers: an immutable primary base tier, optional secondary base
//! tiers, and a mutable patch tier that the game prefers. Some outer entries
//! are nested containers holding further files. A mod may replace outer
//! entries outright or add members to nested containers; the engine merges
//! those members into whichever tier copy of the nested container wins and
//! records every claim in a manifest so the install can be reversed.
//!
//! ## Examples
//!
//! ```no_run
//! use mod_merge::{MergeConfig, ModManager, open_bundle};
//!
//! # fn main() -> Result<(), mod_merge::Error> {
//! let manager = ModManager::open("/games/tpp", MergeConfig::default())?;
//! if !manager.is_configured() {
//!     manager.setup(true)?;
//! }
//!
//! let bundle = open_bundle("camo.zip")?;
//! let report = manager.install(bundle.as_ref(), false)?;
//! for warning in report.warnings.as_slice() {
//!     println!("warning: {warning}");
//! }
//!
//! manager.uninstall("Camo")?;
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod bundle;
pub mod codec;
pub mod config;
pub mod conflict;
pub mod engine;
pub mod error;
pub mod files;
pub mod fixup;
pub mod manager;
pub mod manifest;
pub mod report;
pub mod scratch;
pub mod tier;

pub use bundle::{BundleSource, DirectoryBundle, ModMetadata, ZipBundle, open_bundle};
pub use codec::ArchiveCodec;
pub use config::{Layout, MergeConfig};
pub use conflict::{Conflict, find_conflicts};
pub use engine::{MergeEngine, MigrationSelection, NestedListing, NestedMember};
pub use error::{Error, Result};
pub use manager::{ModManager, SetupReport};
pub use manifest::{
    BaselineEntry, BaselineIndex, DirectEntry, JsonManifestStore, Manifest, ManifestStore,
    ModRecord, NestedEntry, Provenance, Tier,
};
pub use report::{MergeReport, MigrationReport, ReconcileReport, Warning, Warnings};
pub use scratch::ScratchArena;
