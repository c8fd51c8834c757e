//! # dat_archive - Hash-indexed game data containers
//!
//! Reader and writer for the two container kinds a game ships its assets in:
//!
//! - **Outer** containers (`DATC`) index entries by a 64-bit path hash only.
//! - **Nested** containers (`PAKC`) are stored as single entries of an outer
//!   container and keep full entry names.
//!
//! Both kinds share one layout: a fixed header carrying the loader base
//! offset, 16-byte aligned payloads, then an index with a CRC32 per entry.
//!
//! ## Examples
//!
//! ```no_run
//! use dat_archive::{ContainerKind, DatCodec, path_hash};
//! use std::path::Path;
//!
//! # fn main() -> Result<(), dat_archive::Error> {
//! let codec = DatCodec::new();
//! let names = codec.extract(
//!     Path::new("master/0/01.dat"),
//!     ContainerKind::Outer,
//!     Path::new("scratch"),
//! )?;
//!
//! // Rebuild with the patch tier base offset
//! codec.write(
//!     Path::new("master/0/01.dat"),
//!     ContainerKind::Outer,
//!     Path::new("scratch"),
//!     &names,
//!     3_150_048,
//! )?;
//!
//! println!("{:016x}", path_hash("Assets/weapon.fpk"));
//! # Ok(())
//! # }
//! ```

#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod codec;
pub mod dictionary;
pub mod error;
pub mod hash;
pub mod header;
pub mod limits;
pub mod writer;

pub use archive::{Container, ContainerInfo};
pub use codec::DatCodec;
pub use dictionary::Dictionary;
pub use error::{Error, Result};
pub use hash::{normalize_path, path_hash};
pub use header::{ContainerKind, Entry, Header};
pub use limits::Limits;
pub use writer::ContainerWriter;
