//! Install and uninstall against a fake game installation

mod common;

use common::{BundleBuilder, Game, WEAPON, nested_bytes, nested_in, outer_contents, write_outer};
use dat_archive::path_hash;
use mod_merge::{DirectoryBundle, Error, Manifest, Provenance, Tier, Warning};
use pretty_assertions::assert_eq;
use std::collections::BTreeMap;
use std::fs;

fn members(pairs: &[(&str, &[u8])]) -> BTreeMap<String, Vec<u8>> {
    pairs
        .iter()
        .map(|(n, d)| (n.to_string(), d.to_vec()))
        .collect()
}

fn reconciled(game: &Game) -> Manifest {
    let mut manifest = Manifest::default();
    game.engine().reconcile(&mut manifest).unwrap();
    manifest
}

#[test]
fn test_merge_member_into_base_container() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Camo")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("camo"));
    let report = engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    assert_eq!(report.nested_files, 1);
    assert_eq!(report.containers_rebuilt, vec![WEAPON.to_string()]);
    assert!(report.warnings.is_empty());
    assert_eq!(
        nested_in(&game.patch(), WEAPON).unwrap(),
        members(&[("a.dat", b"A0"), ("b.dat", b"B0"), ("c.dat", b"C1")])
    );

    let record = manifest.find_mod("Camo").unwrap();
    assert_eq!(record.direct.len(), 1);
    assert_eq!(record.direct[0].provenance, Provenance::Merged);
    assert_eq!(record.nested.len(), 1);
    assert_eq!(record.nested[0].path, "c.dat");
    assert_eq!(manifest.nested_owner_of(WEAPON, "c.dat"), Some("Camo"));

    let report = engine.uninstall(&mut manifest, "Camo").unwrap();
    assert_eq!(report.containers_removed, vec![WEAPON.to_string()]);
    assert!(nested_in(&game.patch(), WEAPON).is_none());
    assert!(manifest.mods.is_empty());

    let listing = engine.nested_contents(&manifest, WEAPON).unwrap();
    assert_eq!(listing.tier, Tier::Base);
    let paths: Vec<_> = listing.members.iter().map(|m| m.path.as_str()).collect();
    assert_eq!(paths, vec!["a.dat", "b.dat"]);
}

#[test]
fn test_uninstall_restores_patch_tier() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);
    let before = fs::read(game.patch()).unwrap();

    let dir = BundleBuilder::new("Camo")
        .direct("config.bin", b"mod config")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("camo"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();
    assert_ne!(fs::read(game.patch()).unwrap(), before);

    engine.uninstall(&mut manifest, "Camo").unwrap();
    assert_eq!(fs::read(game.patch()).unwrap(), before);
    assert_eq!(manifest, reconciled(&game));
}

#[test]
fn test_new_direct_file() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Tweaks")
        .direct("config.bin", b"mod config")
        .write(&game.bundle_dir("tweaks"));
    let report = engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();
    assert_eq!(report.direct_files, 1);

    let hash = path_hash("config.bin");
    assert_eq!(
        outer_contents(&game.patch()).get(&hash).map(Vec::as_slice),
        Some(&b"mod config"[..])
    );
    assert_eq!(manifest.provenance_of(hash), Some(Provenance::Mod));
    assert_eq!(manifest.owner_of(hash), Some("Tweaks"));

    engine.uninstall(&mut manifest, "Tweaks").unwrap();
    assert!(!outer_contents(&game.patch()).contains_key(&hash));
    assert_eq!(manifest.provenance_of(hash), None);
}

#[test]
fn test_overwritten_base_file_is_folded_and_restored() {
    let game = Game::with_patch(&[("config.bin", b"system config")]);
    let engine = game.engine();
    let mut manifest = reconciled(&game);
    let hash = path_hash("config.bin");
    assert_eq!(manifest.provenance_of(hash), Some(Provenance::System));

    let dir = BundleBuilder::new("Tweaks")
        .direct("config.bin", b"mod config")
        .write(&game.bundle_dir("tweaks"));
    let report = engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    assert!(
        report
            .warnings
            .as_slice()
            .iter()
            .any(|w| matches!(w, Warning::FoldedSystemFile { .. }))
    );
    assert_eq!(
        outer_contents(&game.primary()).get(&hash).map(Vec::as_slice),
        Some(&b"system config"[..])
    );
    assert_eq!(
        outer_contents(&game.patch()).get(&hash).map(Vec::as_slice),
        Some(&b"mod config"[..])
    );
    assert!(manifest.baseline.find_in(hash, &Tier::Base).is_some());
    assert!(manifest.baseline.find_in(hash, &Tier::Patch).is_none());
    engine.verify(&manifest).unwrap();

    engine.uninstall(&mut manifest, "Tweaks").unwrap();
    assert!(!outer_contents(&game.patch()).contains_key(&hash));
    assert_eq!(manifest.provenance_of(hash), Some(Provenance::System));
    assert_eq!(
        outer_contents(&game.primary()).get(&hash).map(Vec::as_slice),
        Some(&b"system config"[..])
    );
}

#[test]
fn test_two_mods_share_a_container() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let first = BundleBuilder::new("First")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("first"));
    let second = BundleBuilder::new("Second")
        .nested(WEAPON, &[("d.dat", b"D1")])
        .write(&game.bundle_dir("second"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(first))
        .unwrap();
    engine
        .install(&mut manifest, &DirectoryBundle::new(second))
        .unwrap();
    assert_eq!(
        nested_in(&game.patch(), WEAPON).unwrap(),
        members(&[
            ("a.dat", b"A0"),
            ("b.dat", b"B0"),
            ("c.dat", b"C1"),
            ("d.dat", b"D1"),
        ])
    );

    let report = engine.uninstall(&mut manifest, "First").unwrap();
    assert_eq!(report.containers_rebuilt, vec![WEAPON.to_string()]);
    assert_eq!(
        nested_in(&game.patch(), WEAPON).unwrap(),
        members(&[("a.dat", b"A0"), ("b.dat", b"B0"), ("d.dat", b"D1")])
    );
    assert_eq!(manifest.nested_owner_of(WEAPON, "d.dat"), Some("Second"));

    engine.uninstall(&mut manifest, "Second").unwrap();
    assert!(nested_in(&game.patch(), WEAPON).is_none());
}

#[test]
fn test_override_base_member() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Retexture")
        .nested(WEAPON, &[("a.dat", b"A1")])
        .write(&game.bundle_dir("retexture"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();
    assert_eq!(
        nested_in(&game.patch(), WEAPON).unwrap(),
        members(&[("a.dat", b"A1"), ("b.dat", b"B0")])
    );

    engine.uninstall(&mut manifest, "Retexture").unwrap();
    assert!(nested_in(&game.patch(), WEAPON).is_none());
    assert_eq!(
        nested_in(&game.primary(), WEAPON).unwrap(),
        members(&[("a.dat", b"A0"), ("b.dat", b"B0")])
    );
}

#[test]
fn test_container_missing_from_every_tier() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Extra")
        .nested("Assets/new.fpk", &[("x.dat", b"X1")])
        .write(&game.bundle_dir("extra"));
    let report = engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    assert_eq!(
        report.warnings.as_slice(),
        &[Warning::UnresolvedSubContainer {
            container: "Assets/new.fpk".to_string()
        }]
    );
    assert_eq!(
        nested_in(&game.patch(), "Assets/new.fpk").unwrap(),
        members(&[("x.dat", b"X1")])
    );
    let record = manifest.find_mod("Extra").unwrap();
    assert_eq!(record.direct[0].provenance, Provenance::Mod);

    let report = engine.uninstall(&mut manifest, "Extra").unwrap();
    assert_eq!(report.containers_removed, vec!["Assets/new.fpk".to_string()]);
    assert!(nested_in(&game.patch(), "Assets/new.fpk").is_none());
}

#[test]
fn test_declared_files_missing_from_payload() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Sloppy")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .declare_missing(Some(WEAPON), "ghost.dat")
        .declare_missing(None, "ghost.lua")
        .write(&game.bundle_dir("sloppy"));
    let report = engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    let warnings = report.warnings.as_slice();
    assert!(warnings.contains(&Warning::MissingSource {
        path: "ghost.dat".to_string(),
        container: Some(WEAPON.to_string()),
    }));
    assert!(warnings.contains(&Warning::MissingSource {
        path: "ghost.lua".to_string(),
        container: None,
    }));

    let record = manifest.find_mod("Sloppy").unwrap();
    assert!(!record.owns_nested(WEAPON, "ghost.dat"));
    assert!(!record.owns_direct(path_hash("ghost.lua")));
    assert!(record.owns_nested(WEAPON, "c.dat"));
}

#[test]
fn test_bad_bundle_changes_nothing() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);
    let before = fs::read(game.patch()).unwrap();
    let snapshot = manifest.clone();

    let dir = game.bundle_dir("broken");
    fs::create_dir_all(&dir).unwrap();
    fs::write(
        dir.join("metadata.json"),
        br#"{"name": "Broken", "direct": [{"path": "../escape.bin"}]}"#,
    )
    .unwrap();

    let err = engine
        .install(&mut manifest, &DirectoryBundle::new(&dir))
        .unwrap_err();
    assert!(matches!(err, Error::BundleFormat(_)));
    assert!(err.aborts_before_mutation());

    fs::write(dir.join("metadata.json"), b"not json").unwrap();
    let err = engine
        .install(&mut manifest, &DirectoryBundle::new(&dir))
        .unwrap_err();
    assert!(matches!(err, Error::BundleFormat(_)));

    assert_eq!(fs::read(game.patch()).unwrap(), before);
    assert_eq!(manifest, snapshot);
}

#[test]
fn test_duplicate_install_and_unknown_uninstall() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Tweaks")
        .direct("config.bin", b"mod config")
        .write(&game.bundle_dir("tweaks"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(&dir))
        .unwrap();
    let after_install = fs::read(game.patch()).unwrap();

    let err = engine
        .install(&mut manifest, &DirectoryBundle::new(&dir))
        .unwrap_err();
    assert!(matches!(err, Error::AlreadyInstalled(ref name) if name == "Tweaks"));

    let err = engine.uninstall(&mut manifest, "Nobody").unwrap_err();
    assert!(matches!(err, Error::ModNotInstalled(ref name) if name == "Nobody"));

    assert_eq!(fs::read(game.patch()).unwrap(), after_install);
    assert_eq!(manifest.mods.len(), 1);
}

#[test]
fn test_uninstall_reports_drifted_claims() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Tweaks")
        .direct("config.bin", b"mod config")
        .write(&game.bundle_dir("tweaks"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    // Another tool rewrote the patch tier behind our back
    write_outer(
        &game.patch(),
        3_150_048,
        &[("patch_only.bin", b"patch system".to_vec())],
    );

    let report = engine.uninstall(&mut manifest, "Tweaks").unwrap();
    assert_eq!(
        report.warnings.as_slice(),
        &[Warning::UnresolvedClaim {
            mod_name: "Tweaks".to_string(),
            path: "config.bin".to_string(),
            container: None,
        }]
    );
    assert!(manifest.find_mod("Tweaks").is_none());
}

#[test]
fn test_uninstall_keeps_edited_base_member() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Camo")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("camo"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    // Another tool edited an unclaimed member of the merged container
    write_outer(
        &game.patch(),
        3_150_048,
        &[
            ("patch_only.bin", b"patch system".to_vec()),
            (
                WEAPON,
                nested_bytes(&[("a.dat", b"A9"), ("b.dat", b"B0"), ("c.dat", b"C1")]),
            ),
        ],
    );

    let report = engine.uninstall(&mut manifest, "Camo").unwrap();
    assert_eq!(report.nested_files, 1);
    assert_eq!(report.containers_rebuilt, vec![WEAPON.to_string()]);
    assert!(report.containers_removed.is_empty());
    assert_eq!(
        nested_in(&game.patch(), WEAPON).unwrap(),
        members(&[("a.dat", b"A9"), ("b.dat", b"B0")])
    );
}

#[test]
fn test_scratch_arena_removed_after_success() {
    let game = Game::new();
    let engine = game.engine();
    let mut manifest = reconciled(&game);

    let dir = BundleBuilder::new("Camo")
        .nested(WEAPON, &[("c.dat", b"C1")])
        .write(&game.bundle_dir("camo"));
    engine
        .install(&mut manifest, &DirectoryBundle::new(dir))
        .unwrap();

    assert!(!engine.layout().scratch.join("_working").exists());
    assert!(!engine.layout().scratch.join("_extr").exists());
}
