//! Scratch working directories
//!
//! Operations exchange data through a fixed set of directories under one
//! scratch root. They are cleared when an operation starts and again when it
//! finishes. Nothing is cleaned up on drop: a crashed run leaves them behind
//! and the next `acquire` clears them.

use crate::Result;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

const WORKING: &str = "_working";
const EXTRACTED: &str = "_extr";
const GAME_NESTED: &str = "_gamenested";
const MOD_NESTED: &str = "_modnested";
const BASE: &str = "_base";

const ALL: [&str; 5] = [WORKING, EXTRACTED, GAME_NESTED, MOD_NESTED, BASE];

/// The well-known scratch directories
#[derive(Debug, Clone)]
pub struct ScratchArena {
    root: PathBuf,
}

impl ScratchArena {
    /// Arena rooted at `root`
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Clear leftovers and create every directory
    pub fn acquire(&self) -> Result<()> {
        for name in ALL {
            self.reset(&self.root.join(name))?;
        }
        log::debug!("Acquired scratch arena at {}", self.root.display());
        Ok(())
    }

    /// Remove every directory
    pub fn release(&self) -> Result<()> {
        for name in ALL {
            remove_dir(&self.root.join(name))?;
        }
        // Only removes the root if nothing else lives there
        let _ = fs::remove_dir(&self.root);
        Ok(())
    }

    /// Empty one directory and recreate it
    pub fn reset(&self, dir: &Path) -> Result<()> {
        remove_dir(dir)?;
        fs::create_dir_all(dir)?;
        Ok(())
    }

    /// Extracted patch tier
    pub fn working(&self) -> PathBuf {
        self.root.join(WORKING)
    }

    /// Unpacked mod bundle
    pub fn extracted(&self) -> PathBuf {
        self.root.join(EXTRACTED)
    }

    /// Game copy of the nested container being merged
    pub fn game_nested(&self) -> PathBuf {
        self.root.join(GAME_NESTED)
    }

    /// Mod copy of the nested container being merged
    pub fn mod_nested(&self) -> PathBuf {
        self.root.join(MOD_NESTED)
    }

    /// Extracted base tier
    pub fn base(&self) -> PathBuf {
        self.root.join(BASE)
    }
}

fn remove_dir(dir: &Path) -> io::Result<()> {
    match fs::remove_dir_all(dir) {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
