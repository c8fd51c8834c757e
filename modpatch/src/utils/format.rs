//! Formatting utilities

use humansize::{DECIMAL, format_size};
use mod_merge::Warnings;

/// Format file size in human-readable format
pub fn format_bytes(bytes: u64) -> String {
    format_size(bytes, DECIMAL)
}

/// Format a path hash the way placeholder names spell it
pub fn format_hash(hash: u64) -> String {
    format!("{hash:016x}")
}

/// Print every warning of an operation report
pub fn print_warnings(warnings: &Warnings) {
    for warning in warnings.as_slice() {
        println!("⚠ {warning}");
    }
}
