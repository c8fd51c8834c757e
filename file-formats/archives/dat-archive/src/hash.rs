//! Path hashing for container lookups
//!
//! Containers do not store human-readable paths for outer entries, so every
//! lookup is keyed by a 64-bit path hash. The hash is Jenkins `hashlittle2`
//! over the normalized, ASCII-lowercased path, with the primary result in the
//! high word and the secondary result in the low word.
//!
//! Entries whose name is unknown are extracted under a placeholder name made
//! of the 16-digit hex hash plus the stored extension. Hashing a placeholder
//! yields the embedded value, so both forms of a name key the same entry.
//!
//! ```
//! use dat_archive::hash::{path_hash, placeholder_name};
//!
//! let hash = path_hash("Assets/pack/weapon.fpk");
//! assert_eq!(hash, path_hash("assets\\pack\\WEAPON.fpk"));
//! assert_eq!(path_hash(&placeholder_name(hash, "fpk")), hash);
//! ```

/// Length of the hex digits in a placeholder name
pub const PLACEHOLDER_DIGITS: usize = 16;

/// Normalize a logical path
///
/// Backslashes become forward slashes and leading separators are stripped.
///
/// ```
/// use dat_archive::hash::normalize_path;
///
/// assert_eq!(normalize_path("\\Assets\\a.dat"), "Assets/a.dat");
/// assert_eq!(normalize_path("/Assets/a.dat"), "Assets/a.dat");
/// ```
pub fn normalize_path(path: &str) -> String {
    path.replace('\\', "/").trim_start_matches('/').to_string()
}

/// Hash a logical path
pub fn path_hash(path: &str) -> u64 {
    let normalized = normalize_path(path);

    if let Some(hash) = parse_placeholder(&normalized) {
        return hash;
    }

    let bytes: Vec<u8> = normalized.bytes().map(|b| b.to_ascii_lowercase()).collect();
    let (primary, secondary) = hashlittle2(&bytes, 0, 0);
    ((primary as u64) << 32) | secondary as u64
}

/// Build the placeholder name for an entry whose path is unknown
pub fn placeholder_name(hash: u64, extension: &str) -> String {
    if extension.is_empty() {
        format!("{hash:016x}")
    } else {
        format!("{hash:016x}.{extension}")
    }
}

/// Parse a placeholder name back into its hash
///
/// Placeholders never carry a directory component.
pub fn parse_placeholder(path: &str) -> Option<u64> {
    if path.contains('/') || path.contains('\\') {
        return None;
    }

    let stem = match path.split_once('.') {
        Some((stem, _)) => stem,
        None => path,
    };

    if stem.len() != PLACEHOLDER_DIGITS || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    u64::from_str_radix(stem, 16).ok()
}

/// Extension of a logical path, without the dot
///
/// Everything after the first dot of the file name counts, so `a.fpk.bak`
/// has the extension `fpk.bak`.
pub fn extension(path: &str) -> &str {
    let file_name = path.rsplit(['/', '\\']).next().unwrap_or(path);
    match file_name.split_once('.') {
        Some((_, ext)) => ext,
        None => "",
    }
}

/// Jenkins lookup3 `hashlittle2`, returning `(c, b)`
fn hashlittle2(key: &[u8], pc: u32, pb: u32) -> (u32, u32) {
    let mut a = 0xdead_beef_u32
        .wrapping_add(key.len() as u32)
        .wrapping_add(pc);
    let mut b = a;
    let mut c = a.wrapping_add(pb);

    let mut k = key;
    while k.len() > 12 {
        a = a.wrapping_add(read_u32(&k[0..4]));
        b = b.wrapping_add(read_u32(&k[4..8]));
        c = c.wrapping_add(read_u32(&k[8..12]));
        mix(&mut a, &mut b, &mut c);
        k = &k[12..];
    }

    if k.is_empty() {
        return (c, b);
    }

    let mut last = [0u8; 12];
    last[..k.len()].copy_from_slice(k);
    a = a.wrapping_add(read_u32(&last[0..4]));
    b = b.wrapping_add(read_u32(&last[4..8]));
    c = c.wrapping_add(read_u32(&last[8..12]));
    final_mix(&mut a, &mut b, &mut c);

    (c, b)
}

fn read_u32(bytes: &[u8]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]])
}

fn mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(4);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(6);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(8);
    *b = b.wrapping_add(*a);
    *a = a.wrapping_sub(*c);
    *a ^= c.rotate_left(16);
    *c = c.wrapping_add(*b);
    *b = b.wrapping_sub(*a);
    *b ^= a.rotate_left(19);
    *a = a.wrapping_add(*c);
    *c = c.wrapping_sub(*b);
    *c ^= b.rotate_left(4);
    *b = b.wrapping_add(*a);
}

fn final_mix(a: &mut u32, b: &mut u32, c: &mut u32) {
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(14));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(11));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(25));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(16));
    *a ^= *c;
    *a = a.wrapping_sub(c.rotate_left(4));
    *b ^= *a;
    *b = b.wrapping_sub(a.rotate_left(14));
    *c ^= *b;
    *c = c.wrapping_sub(b.rotate_left(24));
}
