//! Shared fixtures: a fake game installation and mod bundles

#![allow(dead_code)]

use dat_archive::{Container, ContainerKind, ContainerWriter, DatCodec, path_hash};
use mod_merge::{JsonManifestStore, MergeConfig, MergeEngine, ModManager};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

pub const PRIMARY: &str = "master/0/00.dat";
pub const PATCH: &str = "master/0/01.dat";
pub const WEAPON: &str = "Assets/weapon.fpk";

/// Build a nested container in memory
pub fn nested_bytes(members: &[(&str, &[u8])]) -> Vec<u8> {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("pack.fpk");
    let mut writer = ContainerWriter::new(ContainerKind::Nested);
    for (name, data) in members {
        writer = writer.add_data(data.to_vec(), name);
    }
    writer.write(&path).unwrap();
    fs::read(path).unwrap()
}

/// Write an outer container
pub fn write_outer(path: &Path, base_offset: u32, entries: &[(&str, Vec<u8>)]) {
    let mut writer = ContainerWriter::new(ContainerKind::Outer).base_offset(base_offset);
    for (name, data) in entries {
        writer = writer.add_data(data.clone(), name);
    }
    writer.write(path).unwrap();
}

/// Every entry of an outer container, keyed by path hash
pub fn outer_contents(path: &Path) -> BTreeMap<u64, Vec<u8>> {
    if !path.exists() {
        return BTreeMap::new();
    }
    let mut container = Container::open(path, ContainerKind::Outer).unwrap();
    let entries = container.entries().to_vec();
    entries
        .iter()
        .map(|e| (e.hash, container.read_entry(e).unwrap()))
        .collect()
}

/// Members of a nested container stored in an outer container, keyed by name
pub fn nested_in(outer: &Path, container: &str) -> Option<BTreeMap<String, Vec<u8>>> {
    let temp = TempDir::new().unwrap();
    let dest = temp.path().join("pack.fpk");
    let found = DatCodec::new()
        .extract_entry(outer, ContainerKind::Outer, path_hash(container), &dest)
        .unwrap();
    if !found {
        return None;
    }
    let mut pack = Container::open(&dest, ContainerKind::Nested).unwrap();
    let entries = pack.entries().to_vec();
    Some(
        entries
            .iter()
            .map(|e| (e.name.clone().unwrap(), pack.read_entry(e).unwrap()))
            .collect(),
    )
}

/// A fake game installation
///
/// The primary base tier holds `Assets/weapon.fpk` with `a.dat` and `b.dat`
/// plus a plain `init.lua`. The patch tier holds one base game file,
/// `patch_only.bin`, and whatever extra entries the test asks for.
pub struct Game {
    pub dir: TempDir,
}

impl Game {
    pub fn new() -> Self {
        Self::with_patch(&[])
    }

    pub fn with_patch(extra: &[(&str, &[u8])]) -> Self {
        let _ = env_logger::builder().is_test(true).try_init();
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("master/0")).unwrap();

        write_outer(
            &dir.path().join(PRIMARY),
            3_150_304,
            &[
                (WEAPON, nested_bytes(&[("a.dat", b"A0"), ("b.dat", b"B0")])),
                ("init.lua", b"base init".to_vec()),
            ],
        );

        let mut patch = vec![("patch_only.bin", b"patch system".to_vec())];
        patch.extend(extra.iter().map(|(n, d)| (*n, d.to_vec())));
        write_outer(&dir.path().join(PATCH), 3_150_048, &patch);

        Self { dir }
    }

    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    pub fn primary(&self) -> PathBuf {
        self.dir.path().join(PRIMARY)
    }

    pub fn patch(&self) -> PathBuf {
        self.dir.path().join(PATCH)
    }

    pub fn engine(&self) -> MergeEngine<DatCodec> {
        MergeEngine::new(DatCodec::new(), self.root(), MergeConfig::default()).unwrap()
    }

    pub fn manager(&self) -> ModManager<DatCodec, JsonManifestStore> {
        ModManager::open(self.root(), MergeConfig::default()).unwrap()
    }

    pub fn manager_with(&self, config: MergeConfig) -> ModManager<DatCodec, JsonManifestStore> {
        ModManager::open(self.root(), config).unwrap()
    }

    pub fn bundle_dir(&self, name: &str) -> PathBuf {
        self.dir.path().join("bundles").join(name)
    }
}

/// Builder for an unpacked mod bundle
pub struct BundleBuilder {
    name: String,
    direct: Vec<(String, Vec<u8>)>,
    nested: Vec<(String, Vec<(String, Vec<u8>)>)>,
    declared_only: Vec<(Option<String>, String)>,
}

impl BundleBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            direct: Vec::new(),
            nested: Vec::new(),
            declared_only: Vec::new(),
        }
    }

    pub fn direct(mut self, path: &str, data: &[u8]) -> Self {
        self.direct.push((path.to_string(), data.to_vec()));
        self
    }

    pub fn nested(mut self, container: &str, members: &[(&str, &[u8])]) -> Self {
        self.nested.push((
            container.to_string(),
            members
                .iter()
                .map(|(n, d)| (n.to_string(), d.to_vec()))
                .collect(),
        ));
        self
    }

    /// Declare a file in the metadata without shipping it
    pub fn declare_missing(mut self, container: Option<&str>, path: &str) -> Self {
        self.declared_only
            .push((container.map(str::to_string), path.to_string()));
        self
    }

    pub fn write(self, root: &Path) -> PathBuf {
        fs::create_dir_all(root).unwrap();

        let mut direct = Vec::new();
        let mut nested = Vec::new();

        for (path, data) in &self.direct {
            let target = root.join(path);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, data).unwrap();
            direct.push(serde_json::json!({ "path": path }));
        }

        for (container, members) in &self.nested {
            let refs: Vec<(&str, &[u8])> = members
                .iter()
                .map(|(n, d)| (n.as_str(), d.as_slice()))
                .collect();
            let target = root.join(container);
            fs::create_dir_all(target.parent().unwrap()).unwrap();
            fs::write(target, nested_bytes(&refs)).unwrap();

            direct.push(serde_json::json!({ "path": container }));
            for (member, _) in members {
                nested.push(serde_json::json!({ "container": container, "path": member }));
            }
        }

        for (container, path) in &self.declared_only {
            match container {
                Some(c) => nested.push(serde_json::json!({ "container": c, "path": path })),
                None => direct.push(serde_json::json!({ "path": path })),
            }
        }

        let metadata = serde_json::json!({
            "name": self.name,
            "version": "1.0",
            "author": "tester",
            "direct": direct,
            "nested": nested,
        });
        fs::write(
            root.join("metadata.json"),
            serde_json::to_vec_pretty(&metadata).unwrap(),
        )
        .unwrap();
        root.to_path_buf()
    }
}
