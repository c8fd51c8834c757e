//! Mod management command implementations

use anyhow::{Context, Result, bail};
use clap::Subcommand;
use dat_archive::{DatCodec, path_hash};
use mod_merge::{
    Error, JsonManifestStore, MergeConfig, MigrationSelection, ModManager, open_bundle,
};
use std::fs;
use std::path::{Path, PathBuf};

use crate::utils::{
    add_table_row, create_spinner, create_table, format_bytes, format_hash, print_warnings,
};

type Manager = ModManager<DatCodec, JsonManifestStore>;

#[derive(Subcommand)]
pub enum ModCommands {
    /// Record the game baseline; run once before installing mods
    Setup {
        /// Leave base game files in the patch tier
        #[arg(long)]
        no_migrate: bool,
    },

    /// Install a mod bundle (directory or zip file)
    Install {
        /// Path to the bundle
        bundle: PathBuf,

        /// Install even when files are owned by other mods
        #[arg(short, long)]
        force: bool,
    },

    /// Uninstall a mod
    Uninstall {
        /// Name of the installed mod
        name: String,
    },

    /// List installed mods
    List {
        /// Show details for each mod
        #[arg(short, long)]
        long: bool,

        /// List every file claimed by a mod
        #[arg(long)]
        files: bool,
    },

    /// Resynchronize the manifest with the game files
    Reconcile,

    /// Move base game files from the patch tier to the base tier
    Migrate {
        /// Logical paths to move (all unclaimed base game files if not specified)
        paths: Vec<String>,
    },

    /// Check the base tier against the digest recorded at setup
    Verify,

    /// Show the effective contents of a nested container
    Show {
        /// Logical path of the container
        container: String,
    },
}

pub fn execute(command: ModCommands, game_dir: &Path, config: Option<&Path>) -> Result<()> {
    let manager = open_manager(game_dir, config)?;

    match command {
        ModCommands::Setup { no_migrate } => setup(&manager, !no_migrate),
        ModCommands::Install { bundle, force } => install(&manager, &bundle, force),
        ModCommands::Uninstall { name } => uninstall(&manager, &name),
        ModCommands::List { long, files } => list_mods(&manager, long, files),
        ModCommands::Reconcile => reconcile(&manager),
        ModCommands::Migrate { paths } => migrate(&manager, paths),
        ModCommands::Verify => verify(&manager),
        ModCommands::Show { container } => show_container(&manager, &container),
    }
}

fn open_manager(game_dir: &Path, config: Option<&Path>) -> Result<Manager> {
    let config = match config {
        Some(path) => MergeConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => MergeConfig::default(),
    };
    ModManager::open(game_dir, config)
        .with_context(|| format!("Failed to open game directory {}", game_dir.display()))
}

/// Turn the gate errors into instructions
fn explain(err: Error) -> anyhow::Error {
    match err {
        Error::NotConfigured => {
            anyhow::anyhow!("Game directory is not set up; run `modpatch setup` first")
        }
        Error::IntegrityMismatch { expected, actual } => anyhow::anyhow!(
            "Base tier changed since setup (expected {expected}, found {actual}); \
             the game was probably updated, run `modpatch setup` again"
        ),
        other => other.into(),
    }
}

fn setup(manager: &Manager, migrate: bool) -> Result<()> {
    if manager.is_configured() {
        log::info!("Already set up, recording the baseline again");
    }

    let spinner = create_spinner("Recording baseline...");
    let result = manager.setup(migrate);
    spinner.finish_and_clear();
    let report = result.context("Setup failed")?;

    println!(
        "Baseline: {} entries, {} nested entries",
        report.reconcile.baseline_entries, report.reconcile.baseline_nested
    );
    if let Some(migration) = &report.migration {
        println!(
            "Moved {} base game files to the base tier",
            migration.migrated.len()
        );
    }
    for name in &report.reconcile.dropped_mods {
        println!("⚠ Dropped {name}, none of its files remain");
    }
    println!("✓ Setup complete");
    Ok(())
}

fn install(manager: &Manager, path: &Path, force: bool) -> Result<()> {
    let bundle = open_bundle(path).map_err(explain)?;

    let spinner = create_spinner("Installing...");
    let result = manager.install(bundle.as_ref(), force);
    spinner.finish_and_clear();

    let report = match result {
        Ok(report) => report,
        Err(Error::ModConflict { name, conflicts }) => {
            for conflict in &conflicts {
                println!("  {conflict}");
            }
            bail!(
                "{name} conflicts with {} installed files; use --force to install anyway",
                conflicts.len()
            );
        }
        Err(err) => return Err(explain(err).context("Install failed")),
    };

    print_warnings(&report.warnings);
    println!(
        "✓ Installed {} ({} files, {} nested files)",
        report.mod_name, report.direct_files, report.nested_files
    );
    Ok(())
}

fn uninstall(manager: &Manager, name: &str) -> Result<()> {
    let spinner = create_spinner("Uninstalling...");
    let result = manager.uninstall(name);
    spinner.finish_and_clear();
    let report = result.map_err(explain).context("Uninstall failed")?;

    print_warnings(&report.warnings);
    println!(
        "✓ Uninstalled {} ({} files, {} nested files)",
        report.mod_name, report.direct_files, report.nested_files
    );
    Ok(())
}

fn list_mods(manager: &Manager, long: bool, files: bool) -> Result<()> {
    let manifest = manager.manifest()?;
    if manifest.mods.is_empty() {
        println!("No mods installed");
        return Ok(());
    }

    if long {
        let mut table = create_table(vec!["Name", "Version", "Author", "Files", "Nested"]);
        for record in &manifest.mods {
            add_table_row(
                &mut table,
                vec![
                    record.name.clone(),
                    record.version.clone(),
                    record.author.clone(),
                    record.direct.len().to_string(),
                    record.nested.len().to_string(),
                ],
            );
        }
        table.printstd();

        let patch = &manager.engine().layout().patch;
        if let Ok(metadata) = fs::metadata(patch) {
            println!(
                "Patch tier: {} ({})",
                patch.display(),
                format_bytes(metadata.len())
            );
        }
    } else {
        for record in &manifest.mods {
            println!("{} {}", record.name, record.version);
        }
    }

    if files {
        println!();
        for entry in manifest.mod_direct_files() {
            println!("{}  {} [{}]", entry.owner, entry.path, entry.provenance);
        }
        for entry in manifest.mod_nested_files() {
            println!("{}  {}/{}", entry.owner, entry.container, entry.path);
        }
    }
    Ok(())
}

fn reconcile(manager: &Manager) -> Result<()> {
    let spinner = create_spinner("Reconciling...");
    let result = manager.reconcile();
    spinner.finish_and_clear();
    let report = result.context("Reconcile failed")?;

    for claim in &report.pruned {
        println!("Pruned {claim}");
    }
    for name in &report.dropped_mods {
        println!("Dropped {name}");
    }
    if report.duplicates > 0 {
        println!("Removed {} duplicate patch tier entries", report.duplicates);
    }
    println!(
        "✓ Baseline: {} entries, {} nested entries",
        report.baseline_entries, report.baseline_nested
    );
    Ok(())
}

fn migrate(manager: &Manager, paths: Vec<String>) -> Result<()> {
    let selection = if paths.is_empty() {
        MigrationSelection::AllPatchTier
    } else {
        MigrationSelection::Paths(paths)
    };

    let spinner = create_spinner("Migrating...");
    let result = manager.migrate(&selection);
    spinner.finish_and_clear();
    let report = result.map_err(explain).context("Migration failed")?;

    for path in &report.migrated {
        println!("Moved {path}");
    }
    for path in &report.skipped {
        println!("⚠ Skipped {path}");
    }
    println!("✓ Moved {} files", report.migrated.len());
    Ok(())
}

fn verify(manager: &Manager) -> Result<()> {
    let primary = &manager.engine().layout().primary_base;
    manager.verify().map_err(explain)?;

    let size = fs::metadata(primary).map(|m| m.len()).unwrap_or(0);
    println!(
        "✓ {} ({}) matches the recorded baseline",
        primary.display(),
        format_bytes(size)
    );
    Ok(())
}

fn show_container(manager: &Manager, container: &str) -> Result<()> {
    let listing = manager
        .nested_contents(container)
        .with_context(|| format!("Failed to read {container}"))?;

    println!(
        "{} [{}] from the {} tier",
        listing.container,
        format_hash(path_hash(&listing.container)),
        listing.tier
    );

    let mut table = create_table(vec!["Member", "Origin", "Owner"]);
    for member in &listing.members {
        add_table_row(
            &mut table,
            vec![
                member.path.clone(),
                member.provenance.to_string(),
                member.owner.clone().unwrap_or_default(),
            ],
        );
    }
    table.printstd();
    Ok(())
}
