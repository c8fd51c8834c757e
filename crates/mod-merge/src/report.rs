//! Operation reports
//!
//! Conditions that do not abort an operation are collected as warnings and
//! handed back to the caller instead of being skipped silently.

use std::fmt;

/// A non-fatal condition met during an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A file the bundle declares is not in its payload
    MissingSource {
        /// Logical path of the file
        path: String,
        /// Owning nested container, if any
        container: Option<String>,
    },
    /// A mod claims an entry that is not in the live container
    UnresolvedClaim {
        /// Mod holding the claim
        mod_name: String,
        /// Logical path of the entry
        path: String,
        /// Owning nested container, if any
        container: Option<String>,
    },
    /// A nested container was not found in any tier and was added as a plain file
    UnresolvedSubContainer {
        /// Logical path of the container
        container: String,
    },
    /// A base game file was moved from the patch tier to the primary base tier
    FoldedSystemFile {
        /// Logical path of the file
        path: String,
    },
    /// A bundle targets a different game or tool version
    VersionMismatch {
        /// What was compared
        subject: String,
        /// Version the bundle asks for
        required: String,
        /// Version actually present
        found: String,
    },
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Warning::MissingSource {
                path,
                container: Some(c),
            } => write!(f, "Bundle is missing {path} for {c}"),
            Warning::MissingSource { path, container: None } => {
                write!(f, "Bundle is missing {path}")
            }
            Warning::UnresolvedClaim {
                mod_name,
                path,
                container: Some(c),
            } => write!(f, "{mod_name} claims {path} in {c}, which is not present"),
            Warning::UnresolvedClaim {
                mod_name,
                path,
                container: None,
            } => write!(f, "{mod_name} claims {path}, which is not present"),
            Warning::UnresolvedSubContainer { container } => write!(
                f,
                "{container} is not in any tier, installed as an independent file"
            ),
            Warning::FoldedSystemFile { path } => {
                write!(f, "Moved base game file {path} to the base tier")
            }
            Warning::VersionMismatch {
                subject,
                required,
                found,
            } => write!(f, "Bundle expects {subject} {required}, found {found}"),
        }
    }
}

/// Collects warnings and logs each one as it arrives
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Warnings(Vec<Warning>);

impl Warnings {
    /// Record a warning
    pub fn push(&mut self, warning: Warning) {
        log::warn!("{warning}");
        self.0.push(warning);
    }

    /// Append warnings from another operation
    pub fn extend(&mut self, other: Warnings) {
        self.0.extend(other.0);
    }

    /// Recorded warnings
    pub fn as_slice(&self) -> &[Warning] {
        &self.0
    }

    /// Whether nothing was recorded
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of warnings
    pub fn len(&self) -> usize {
        self.0.len()
    }
}

/// Result of an install or uninstall
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// Mod that was installed or removed
    pub mod_name: String,
    /// Direct entries added or removed
    pub direct_files: usize,
    /// Nested members added or removed
    pub nested_files: usize,
    /// Nested containers rebuilt
    pub containers_rebuilt: Vec<String>,
    /// Nested containers dropped from the patch tier
    pub containers_removed: Vec<String>,
    /// Non-fatal conditions
    pub warnings: Warnings,
}

/// Result of a reconcile
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    /// Duplicate patch tier entries ignored
    pub duplicates: usize,
    /// Claims removed from mod records, as `mod: path`
    pub pruned: Vec<String>,
    /// Mods dropped because nothing they own remains
    pub dropped_mods: Vec<String>,
    /// Baseline entries recorded
    pub baseline_entries: usize,
    /// Baseline nested entries recorded
    pub baseline_nested: usize,
    /// Non-fatal conditions
    pub warnings: Warnings,
}

/// Result of a tier migration
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MigrationReport {
    /// Files moved to the primary base tier
    pub migrated: Vec<String>,
    /// Requested files that were not eligible or not present
    pub skipped: Vec<String>,
    /// Digest of the rebuilt primary base tier
    pub base_digest: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_warning_display() {
        let w = Warning::MissingSource {
            path: "c.dat".to_string(),
            container: Some("Assets/weapon.fpk".to_string()),
        };
        assert_eq!(w.to_string(), "Bundle is missing c.dat for Assets/weapon.fpk");

        let w = Warning::UnresolvedClaim {
            mod_name: "Camo".to_string(),
            path: "config.bin".to_string(),
            container: None,
        };
        assert_eq!(w.to_string(), "Camo claims config.bin, which is not present");
    }

    #[test]
    fn test_warnings_collect() {
        let mut warnings = Warnings::default();
        assert!(warnings.is_empty());
        warnings.push(Warning::FoldedSystemFile {
            path: "config.bin".to_string(),
        });
        let mut more = Warnings::default();
        more.push(Warning::UnresolvedSubContainer {
            container: "x.fpk".to_string(),
        });
        warnings.extend(more);
        assert_eq!(warnings.len(), 2);
    }
}
