//! Path hash lookup

use anyhow::Result;
use dat_archive::{normalize_path, path_hash};

use crate::utils::format_hash;

pub fn execute(paths: &[String]) -> Result<()> {
    for path in paths {
        let normalized = normalize_path(path);
        println!("{}  {}", format_hash(path_hash(&normalized)), normalized);
    }
    Ok(())
}
