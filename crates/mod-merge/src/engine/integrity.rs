use super::MergeEngine;
use crate::codec::ArchiveCodec;
use crate::manifest::Manifest;
use crate::{Error, Result};
use md5::{Digest, Md5};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

/// MD5 of a file as lowercase hex
pub fn digest_file(path: &Path) -> Result<String> {
    let mut reader = BufReader::new(File::open(path)?);
    let mut hasher = Md5::new();
    let mut buffer = [0u8; 64 * 1024];
    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }
    Ok(hex::encode(hasher.finalize()))
}

impl<C: ArchiveCodec> MergeEngine<C> {
    /// Digest of the primary base tier as it is on disk now
    pub fn base_digest(&self) -> Result<String> {
        self.require_primary_base()?;
        digest_file(&self.layout.primary_base)
    }

    /// Refuse to continue if the primary base tier changed behind our back
    pub fn verify(&self, manifest: &Manifest) -> Result<()> {
        let expected = manifest
            .baseline
            .base_digest
            .as_ref()
            .ok_or(Error::NotConfigured)?;
        let actual = self.base_digest()?;
        if *expected != actual {
            log::error!(
                "{} changed since the baseline was recorded",
                self.layout.primary_base.display()
            );
            return Err(Error::IntegrityMismatch {
                expected: expected.clone(),
                actual,
            });
        }
        log::debug!("Base tier digest {actual} matches");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_digest_file() {
        let temp = tempfile::TempDir::new().unwrap();
        let path = temp.path().join("00.dat");
        std::fs::write(&path, b"abc").unwrap();
        assert_eq!(
            digest_file(&path).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72"
        );
    }
}
