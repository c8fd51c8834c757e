//! Writing containers
//!
//! A container is always rebuilt in full from a list of logical names and a
//! source directory holding one file per name. The new container is written
//! to a temporary file next to the destination and atomically renamed over
//! it, so a failed rebuild leaves the previous container untouched.

use crate::hash::{extension, normalize_path, path_hash};
use crate::header::{Entry, FORMAT_VERSION, HEADER_SIZE, Header, align_offset};
use crate::{ContainerKind, Error, Result};
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

#[derive(Debug)]
enum PendingSource {
    Path(PathBuf),
    Data(Vec<u8>),
}

#[derive(Debug)]
struct PendingEntry {
    name: String,
    source: PendingSource,
}

/// Builder for a container file
///
/// ```no_run
/// use dat_archive::{ContainerKind, ContainerWriter};
///
/// # fn main() -> Result<(), dat_archive::Error> {
/// ContainerWriter::new(ContainerKind::Nested)
///     .add_data(b"hello".to_vec(), "Assets/a.dat")
///     .add_file("scratch/Assets/b.dat", "Assets/b.dat")
///     .write("weapon.fpk")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct ContainerWriter {
    kind: ContainerKind,
    base_offset: u32,
    pending: Vec<PendingEntry>,
}

impl ContainerWriter {
    /// Create a writer for the given container kind
    pub fn new(kind: ContainerKind) -> Self {
        Self {
            kind,
            base_offset: 0,
            pending: Vec::new(),
        }
    }

    /// Set the loader base offset recorded in the header
    pub fn base_offset(mut self, base_offset: u32) -> Self {
        self.base_offset = base_offset;
        self
    }

    /// Add a file from disk under a logical name
    pub fn add_file<P: AsRef<Path>>(mut self, path: P, name: &str) -> Self {
        self.pending.push(PendingEntry {
            name: normalize_path(name),
            source: PendingSource::Path(path.as_ref().to_path_buf()),
        });
        self
    }

    /// Add in-memory data under a logical name
    pub fn add_data(mut self, data: Vec<u8>, name: &str) -> Self {
        self.pending.push(PendingEntry {
            name: normalize_path(name),
            source: PendingSource::Data(data),
        });
        self
    }

    /// Write the container, replacing any existing file at `path`
    pub fn write<P: AsRef<Path>>(self, path: P) -> Result<()> {
        let path = path.as_ref();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        fs::create_dir_all(parent)?;

        let mut temp_file = NamedTempFile::new_in(parent)?;
        let count = {
            let mut writer = BufWriter::new(temp_file.as_file_mut());
            let count = self.write_to(&mut writer)?;
            writer.flush()?;
            count
        };
        temp_file.as_file().sync_all()?;
        temp_file.persist(path).map_err(|e| Error::Io(e.error))?;

        log::debug!(
            "Wrote {} container {} with {} entries",
            self.kind,
            path.display(),
            count
        );
        Ok(())
    }

    fn write_to<W: Write + Seek>(&self, writer: &mut W) -> Result<usize> {
        // Header is rewritten once the index position is known
        let mut header = Header {
            kind: self.kind,
            version: FORMAT_VERSION,
            base_offset: self.base_offset,
            entry_count: 0,
            index_offset: 0,
        };
        header.write(writer)?;

        let mut position = HEADER_SIZE;
        let mut seen = HashSet::new();
        let mut entries = Vec::with_capacity(self.pending.len());

        for pending in &self.pending {
            let hash = path_hash(&pending.name);
            if !seen.insert(hash) {
                log::debug!("Skipping duplicate entry {}", pending.name);
                continue;
            }

            let data = match &pending.source {
                PendingSource::Data(data) => data.clone(),
                PendingSource::Path(source) => fs::read(source).map_err(|e| {
                    if e.kind() == std::io::ErrorKind::NotFound {
                        Error::MissingSource {
                            name: pending.name.clone(),
                            path: source.clone(),
                        }
                    } else {
                        Error::Io(e)
                    }
                })?,
            };

            let aligned = align_offset(position);
            if aligned > position {
                writer.write_all(&vec![0u8; (aligned - position) as usize])?;
            }

            writer.write_all(&data)?;
            entries.push(Entry {
                hash,
                offset: aligned,
                size: data.len() as u64,
                crc32: crc32fast::hash(&data),
                extension: extension(&pending.name).to_string(),
                name: self.kind.stores_names().then(|| pending.name.clone()),
            });
            position = aligned + data.len() as u64;
        }

        let index_offset = align_offset(position);
        if index_offset > position {
            writer.write_all(&vec![0u8; (index_offset - position) as usize])?;
        }
        for entry in &entries {
            entry.write(writer)?;
        }

        header.entry_count = u32::try_from(entries.len())
            .map_err(|_| Error::capacity_exceeded("Too many entries for one container"))?;
        header.index_offset = index_offset;
        writer.seek(SeekFrom::Start(0))?;
        header.write(writer)?;
        writer.seek(SeekFrom::End(0))?;

        Ok(entries.len())
    }
}
