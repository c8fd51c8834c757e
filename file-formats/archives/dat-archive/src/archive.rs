//! Reading containers

use crate::header::{Entry, HEADER_SIZE, Header};
use crate::limits::Limits;
use crate::{ContainerKind, Error, Result};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

/// Summary information about an open container
#[derive(Debug, Clone)]
pub struct ContainerInfo {
    /// Path of the container file
    pub path: PathBuf,
    /// Container kind
    pub kind: ContainerKind,
    /// Loader base offset stored in the header
    pub base_offset: u32,
    /// Number of entries
    pub entry_count: usize,
    /// Size of the container file
    pub file_size: u64,
    /// Sum of all payload sizes
    pub payload_size: u64,
}

/// An opened container
///
/// The index is read eagerly; payloads are read on demand.
///
/// ```no_run
/// use dat_archive::{Container, ContainerKind};
///
/// # fn main() -> Result<(), dat_archive::Error> {
/// let mut container = Container::open("master/0/01.dat", ContainerKind::Outer)?;
/// for entry in container.entries().to_vec() {
///     let data = container.read_entry(&entry)?;
///     println!("{:016x}: {} bytes", entry.hash, data.len());
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct Container {
    path: PathBuf,
    reader: BufReader<File>,
    header: Header,
    entries: Vec<Entry>,
    file_size: u64,
}

impl Container {
    /// Open a container of the given kind with default limits
    pub fn open<P: AsRef<Path>>(path: P, kind: ContainerKind) -> Result<Self> {
        Self::open_with_limits(path, kind, &Limits::default())
    }

    /// Open a container of the given kind with explicit limits
    pub fn open_with_limits<P: AsRef<Path>>(
        path: P,
        kind: ContainerKind,
        limits: &Limits,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path)?;
        let file_size = file.metadata()?.len();
        let mut reader = BufReader::new(file);

        if file_size < HEADER_SIZE {
            return Err(Error::invalid_format(format!(
                "{} is too small to be a container ({} bytes)",
                path.display(),
                file_size
            )));
        }

        let header = Header::read(&mut reader)?;
        if header.kind != kind {
            return Err(Error::WrongKind {
                expected: kind,
                found: header.kind,
            });
        }

        if header.entry_count > limits.max_entries {
            return Err(Error::capacity_exceeded(format!(
                "{} entries exceeds the limit of {}",
                header.entry_count, limits.max_entries
            )));
        }

        if header.index_offset < HEADER_SIZE || header.index_offset > file_size {
            return Err(Error::invalid_format(format!(
                "Index offset {:#x} outside container of {} bytes",
                header.index_offset, file_size
            )));
        }

        reader.seek(SeekFrom::Start(header.index_offset))?;
        let mut entries = Vec::with_capacity(header.entry_count as usize);
        for _ in 0..header.entry_count {
            let entry = Entry::read(&mut reader)?;
            validate_entry_bounds(&entry, header.index_offset, limits)?;
            entries.push(entry);
        }

        log::debug!(
            "Opened {} container {} with {} entries",
            kind,
            path.display(),
            entries.len()
        );

        Ok(Self {
            path: path.to_path_buf(),
            reader,
            header,
            entries,
            file_size,
        })
    }

    /// The container header
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// Entries in stored order
    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    /// Find an entry by path hash
    pub fn find(&self, hash: u64) -> Option<&Entry> {
        self.entries.iter().find(|e| e.hash == hash)
    }

    /// Read and verify an entry payload
    pub fn read_entry(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        self.reader.seek(SeekFrom::Start(entry.offset))?;
        let mut data = vec![0u8; entry.size as usize];
        self.reader.read_exact(&mut data)?;

        let actual = crc32fast::hash(&data);
        if actual != entry.crc32 {
            return Err(Error::ChecksumMismatch {
                name: entry.display_name(None),
                expected: entry.crc32,
                actual,
            });
        }

        Ok(data)
    }

    /// Read an entry payload by path hash
    pub fn read_hash(&mut self, hash: u64) -> Result<Vec<u8>> {
        let entry = self.find(hash).cloned().ok_or(Error::EntryNotFound(hash))?;
        self.read_entry(&entry)
    }

    /// Summary information
    pub fn info(&self) -> ContainerInfo {
        ContainerInfo {
            path: self.path.clone(),
            kind: self.header.kind,
            base_offset: self.header.base_offset,
            entry_count: self.entries.len(),
            file_size: self.file_size,
            payload_size: self.entries.iter().map(|e| e.size).sum(),
        }
    }
}

/// Payloads must sit between the header and the index
fn validate_entry_bounds(entry: &Entry, index_offset: u64, limits: &Limits) -> Result<()> {
    if entry.size > limits.max_entry_size {
        return Err(Error::capacity_exceeded(format!(
            "Entry {:016x} is {} bytes, limit is {}",
            entry.hash, entry.size, limits.max_entry_size
        )));
    }

    let end = entry.offset.checked_add(entry.size).ok_or_else(|| {
        Error::invalid_format(format!("Entry {:016x} size overflows", entry.hash))
    })?;

    if entry.offset < HEADER_SIZE || end > index_offset {
        return Err(Error::invalid_format(format!(
            "Entry {:016x} at {:#x}..{:#x} lies outside the data section",
            entry.hash, entry.offset, end
        )));
    }

    Ok(())
}
