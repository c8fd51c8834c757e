//! Command implementations

pub mod hash;
pub mod mods;
