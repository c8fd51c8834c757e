//! Container header and index entry structures

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Read, Write};

/// Outer container signature ('DATC')
pub const OUTER_MAGIC: [u8; 4] = *b"DATC";

/// Nested container signature ('PAKC')
pub const NESTED_MAGIC: [u8; 4] = *b"PAKC";

/// Current format version
pub const FORMAT_VERSION: u16 = 1;

/// Size of the fixed header in bytes
pub const HEADER_SIZE: u64 = 24;

/// Alignment of entry payloads
pub const DATA_ALIGNMENT: u64 = 16;

/// Which tier of the container hierarchy a file belongs to
///
/// Outer containers index entries by hash only. Nested containers live as
/// single entries inside an outer container and keep full entry names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContainerKind {
    /// Top-level data container
    Outer,
    /// Pack embedded as one entry of an outer container
    Nested,
}

impl ContainerKind {
    /// Signature written at the start of the container
    pub fn magic(self) -> [u8; 4] {
        match self {
            ContainerKind::Outer => OUTER_MAGIC,
            ContainerKind::Nested => NESTED_MAGIC,
        }
    }

    /// Identify a container kind from its signature
    pub fn from_magic(magic: [u8; 4]) -> Option<Self> {
        match magic {
            OUTER_MAGIC => Some(ContainerKind::Outer),
            NESTED_MAGIC => Some(ContainerKind::Nested),
            _ => None,
        }
    }

    /// Whether entry names are stored in the index
    pub fn stores_names(self) -> bool {
        matches!(self, ContainerKind::Nested)
    }
}

impl fmt::Display for ContainerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContainerKind::Outer => f.write_str("outer"),
            ContainerKind::Nested => f.write_str("nested"),
        }
    }
}

/// Fixed container header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    /// Container kind, from the signature
    pub kind: ContainerKind,
    /// Format version
    pub version: u16,
    /// Loader base offset constant supplied at write time
    pub base_offset: u32,
    /// Number of index entries
    pub entry_count: u32,
    /// Absolute offset of the index
    pub index_offset: u64,
}

impl Header {
    /// Read a header
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        let kind = ContainerKind::from_magic(magic).ok_or_else(|| {
            Error::invalid_format(format!("Unknown container signature: {magic:02x?}"))
        })?;

        let version = reader.read_u16::<LittleEndian>()?;
        if version != FORMAT_VERSION {
            return Err(Error::UnsupportedVersion(version));
        }
        let _reserved = reader.read_u16::<LittleEndian>()?;

        Ok(Self {
            kind,
            version,
            base_offset: reader.read_u32::<LittleEndian>()?,
            entry_count: reader.read_u32::<LittleEndian>()?,
            index_offset: reader.read_u64::<LittleEndian>()?,
        })
    }

    /// Write a header
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        writer.write_all(&self.kind.magic())?;
        writer.write_u16::<LittleEndian>(self.version)?;
        writer.write_u16::<LittleEndian>(0)?;
        writer.write_u32::<LittleEndian>(self.base_offset)?;
        writer.write_u32::<LittleEndian>(self.entry_count)?;
        writer.write_u64::<LittleEndian>(self.index_offset)?;
        Ok(())
    }
}

/// One index entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Path hash of the entry
    pub hash: u64,
    /// Absolute payload offset
    pub offset: u64,
    /// Payload size in bytes
    pub size: u64,
    /// CRC32 of the payload
    pub crc32: u32,
    /// Extension of the logical path, without the dot
    pub extension: String,
    /// Logical path, only stored by nested containers
    pub name: Option<String>,
}

impl Entry {
    /// Read an index entry
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let hash = reader.read_u64::<LittleEndian>()?;
        let offset = reader.read_u64::<LittleEndian>()?;
        let size = reader.read_u64::<LittleEndian>()?;
        let crc32 = reader.read_u32::<LittleEndian>()?;

        let ext_len = reader.read_u8()? as usize;
        let mut ext = vec![0u8; ext_len];
        reader.read_exact(&mut ext)?;
        let extension = String::from_utf8(ext).map_err(|_| Error::InvalidUtf8)?;

        let name_len = reader.read_u16::<LittleEndian>()? as usize;
        let name = if name_len == 0 {
            None
        } else {
            let mut raw = vec![0u8; name_len];
            reader.read_exact(&mut raw)?;
            Some(String::from_utf8(raw).map_err(|_| Error::InvalidUtf8)?)
        };

        Ok(Self {
            hash,
            offset,
            size,
            crc32,
            extension,
            name,
        })
    }

    /// Write an index entry
    pub fn write<W: Write>(&self, writer: &mut W) -> Result<()> {
        if self.extension.len() > u8::MAX as usize {
            return Err(Error::invalid_format(format!(
                "Extension too long: {}",
                self.extension
            )));
        }
        let name = self.name.as_deref().unwrap_or("");
        if name.len() > u16::MAX as usize {
            return Err(Error::invalid_format(format!("Entry name too long: {name}")));
        }

        writer.write_u64::<LittleEndian>(self.hash)?;
        writer.write_u64::<LittleEndian>(self.offset)?;
        writer.write_u64::<LittleEndian>(self.size)?;
        writer.write_u32::<LittleEndian>(self.crc32)?;
        writer.write_u8(self.extension.len() as u8)?;
        writer.write_all(self.extension.as_bytes())?;
        writer.write_u16::<LittleEndian>(name.len() as u16)?;
        writer.write_all(name.as_bytes())?;
        Ok(())
    }

    /// Name used when the entry is extracted
    ///
    /// Stored names win, then dictionary names, then a hash placeholder.
    pub fn display_name(&self, dictionary: Option<&crate::Dictionary>) -> String {
        if let Some(name) = &self.name {
            return name.clone();
        }
        if let Some(known) = dictionary.and_then(|d| d.resolve(self.hash)) {
            return known.to_string();
        }
        crate::hash::placeholder_name(self.hash, &self.extension)
    }
}

/// Round an offset up to the payload alignment
pub fn align_offset(offset: u64) -> u64 {
    offset.div_ceil(DATA_ALIGNMENT) * DATA_ALIGNMENT
}
