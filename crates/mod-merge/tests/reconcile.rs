//! Manifest reconciliation

mod common;

use common::{BundleBuilder, Game, WEAPON, nested_bytes, write_outer};
use dat_archive::path_hash;
use mod_merge::engine::digest_file;
use mod_merge::{DirectoryBundle, Error, Manifest, Tier};
use pretty_assertions::assert_eq;
use std::fs;

#[test]
fn test_baseline_covers_every_tier() {
    let ui = nested_bytes(&[("menu.dat", b"M0")]);
    let game = Game::with_patch(&[("Assets/ui.fpk", ui.as_slice())]);
    let mut manifest = Manifest::default();
    let report = game.engine().reconcile(&mut manifest).unwrap();

    let baseline = &manifest.baseline;
    assert!(baseline.find_in(path_hash("init.lua"), &Tier::Base).is_some());
    assert!(baseline.find_in(path_hash(WEAPON), &Tier::Base).is_some());
    assert!(baseline.find_in(path_hash("patch_only.bin"), &Tier::Patch).is_some());

    let ui_entry = baseline
        .find_in(path_hash("Assets/ui.fpk"), &Tier::Patch)
        .unwrap();
    assert!(ui_entry.compressed);
    assert!(
        baseline
            .nested
            .iter()
            .any(|n| n.path == "menu.dat" && path_hash(&n.container) == path_hash("Assets/ui.fpk"))
    );

    assert_eq!(report.baseline_entries, 4);
    assert_eq!(report.baseline_nested, 1);
    assert_eq!(
        baseline.base_digest.as_deref(),
        Some(digest_file(&game.primary()).unwrap().as_str())
    );
}

#[test]
fn test_reconcile_is_idempotent() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = Manifest::default();
    engine.reconcile(&mut manifest).unwrap();

    let dir = BundleBuilder::new("Camo")
        .direct("config.bin", b"mod config")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("camo"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    let patch = fs::read(game.patch()).unwrap();
    let first = engine.reconcile(&mut manifest).unwrap();
    let once = manifest.clone();
    let second = engine.reconcile(&mut manifest).unwrap();

    assert_eq!(manifest, once);
    assert_eq!(first, second);
    assert!(first.pruned.is_empty());
    assert_eq!(fs::read(game.patch()).unwrap(), patch);
}

#[test]
fn test_claimed_files_stay_out_of_baseline() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = Manifest::default();
    engine.reconcile(&mut manifest).unwrap();

    let dir = BundleBuilder::new("Camo")
        .direct("config.bin", b"mod config")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("camo"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();
    engine.reconcile(&mut manifest).unwrap();

    let baseline = &manifest.baseline;
    assert!(baseline.find_in(path_hash("config.bin"), &Tier::Patch).is_none());
    assert!(baseline.find_in(path_hash(WEAPON), &Tier::Patch).is_none());
    assert!(!baseline.nested.iter().any(|n| n.path == "c.dat"));
    assert_eq!(manifest.find_mod("Camo").unwrap().nested.len(), 1);
}

#[test]
fn test_drifted_claims_are_pruned() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = Manifest::default();
    engine.reconcile(&mut manifest).unwrap();

    let dir = BundleBuilder::new("Tweaks")
        .direct("config.bin", b"mod config")
        .direct("extra.bin", b"extra")
        .write(&game.bundle_dir("tweaks"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    write_outer(
        &game.patch(),
        3_150_048,
        &[
            ("patch_only.bin", b"patch system".to_vec()),
            ("extra.bin", b"extra".to_vec()),
        ],
    );
    let report = engine.reconcile(&mut manifest).unwrap();

    assert_eq!(report.pruned, vec!["Tweaks: config.bin".to_string()]);
    assert!(report.dropped_mods.is_empty());
    let record = manifest.find_mod("Tweaks").unwrap();
    assert_eq!(record.direct.len(), 1);
    assert_eq!(record.direct[0].path, "extra.bin");
}

#[test]
fn test_mods_without_files_are_dropped() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = Manifest::default();
    engine.reconcile(&mut manifest).unwrap();

    let dir = BundleBuilder::new("Camo")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("camo"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    write_outer(
        &game.patch(),
        3_150_048,
        &[("patch_only.bin", b"patch system".to_vec())],
    );
    let report = engine.reconcile(&mut manifest).unwrap();

    assert_eq!(report.dropped_mods, vec!["Camo".to_string()]);
    assert_eq!(report.pruned.len(), 2);
    assert!(manifest.mods.is_empty());
}

#[test]
fn test_missing_patch_tier_is_empty() {
    let game = Game::new();
    fs::remove_file(game.patch()).unwrap();

    let mut manifest = Manifest::default();
    let report = game.engine().reconcile(&mut manifest).unwrap();
    assert_eq!(report.baseline_entries, 2);
    assert_eq!(manifest.baseline.patch_entries().count(), 0);
}

#[test]
fn test_missing_primary_base_is_a_config_error() {
    let game = Game::new();
    fs::remove_file(game.primary()).unwrap();

    let mut manifest = Manifest::default();
    let err = game.engine().reconcile(&mut manifest).unwrap_err();
    assert!(matches!(err, Error::Config(_)));
    assert_eq!(manifest, Manifest::default());
}
