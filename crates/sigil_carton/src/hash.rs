//! Class name hashing.
//!
//! A component's hash is computed once from `filename + content`, and every
//! rune-referenced class of that component is suffixed with it. The hash must
//! therefore be deterministic: unchanged inputs keep their class names between
//! builds, while different files or contents diverge.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use xxhash_rust::xxh3::xxh3_64;

/// Pluggable hash function (`text -> hash`).
pub type HashFn = Arc<dyn Fn(&str) -> String + Send + Sync>;

/// Hash function selection.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Hasher {
    /// Rolling multiply hash rendered in base 36 (default).
    #[default]
    Djb2,
    /// xxHash3 rendered as 16 hex characters.
    Xxh3,
    /// User supplied function. Not available from configuration files.
    #[serde(skip)]
    Custom(HashFn),
}

impl Hasher {
    /// Wrap a closure as a custom hasher.
    pub fn custom(f: impl Fn(&str) -> String + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    /// Hash `input` with the selected function.
    pub fn hash(&self, input: &str) -> String {
        match self {
            Self::Djb2 => djb2(input),
            Self::Xxh3 => content_hash(input),
            Self::Custom(f) => f(input),
        }
    }
}

impl fmt::Debug for Hasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Djb2 => f.write_str("Djb2"),
            Self::Xxh3 => f.write_str("Xxh3"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// djb2 variant over UTF-16 code units, walked back to front, with `\r`
/// removed first so CRLF and LF checkouts hash identically.
///
/// Arithmetic follows 32-bit signed integer semantics; the unsigned result
/// is printed in base 36.
pub fn djb2(input: &str) -> String {
    let units: Vec<u16> = input.encode_utf16().filter(|&unit| unit != 0x0D).collect();

    let mut hash: i32 = 5381;
    for &unit in units.iter().rev() {
        let shifted = hash.wrapping_shl(5);
        hash = (i64::from(shifted) - i64::from(hash)) as i32 ^ i32::from(unit);
    }

    to_base36(hash as u32)
}

/// Render `value` in lowercase base 36.
fn to_base36(mut value: u32) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if value == 0 {
        return "0".to_string();
    }

    // u32::MAX needs 7 digits
    let mut buf = [0u8; 7];
    let mut pos = buf.len();
    while value > 0 {
        pos -= 1;
        buf[pos] = DIGITS[(value % 36) as usize];
        value /= 36;
    }
    buf[pos..].iter().map(|&b| b as char).collect()
}

/// Compute a 64-bit hash of the given string using xxHash3.
#[inline]
pub fn hash_str(data: &str) -> u64 {
    xxh3_64(data.as_bytes())
}

/// Convert a hash to a hex string (16 characters).
#[inline]
pub fn hash_to_hex(hash: u64) -> String {
    format!("{:016x}", hash)
}

/// Compute hash of a string and return as hex.
#[inline]
pub fn content_hash(content: &str) -> String {
    hash_to_hex(hash_str(content))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_djb2_known_values() {
        assert_eq!(djb2(""), "45h");
        assert_eq!(djb2("a"), "3ksa");
    }

    #[test]
    fn test_djb2_ignores_carriage_returns() {
        assert_eq!(djb2("a\r"), djb2("a"));
        assert_eq!(
            djb2("<style>\r\n.a{}\r\n</style>"),
            djb2("<style>\n.a{}\n</style>")
        );
    }

    #[test]
    fn test_djb2_consistency() {
        let content = "test.svelte<span class={$css(\"a\")}></span>";
        assert_eq!(djb2(content), djb2(content));
        assert_ne!(djb2(content), djb2("other.svelte<span></span>"));
    }

    #[test]
    fn test_base36_bounds() {
        assert_eq!(to_base36(0), "0");
        assert_eq!(to_base36(35), "z");
        assert_eq!(to_base36(36), "10");
        assert_eq!(to_base36(u32::MAX), "1z141z3");
    }

    #[test]
    fn test_hex_format() {
        let hash = hash_str("test");
        let hex = hash_to_hex(hash);
        assert_eq!(hex.len(), 16);
        assert!(hex.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_hasher_selection() {
        assert_eq!(Hasher::default().hash("a"), "3ksa");
        assert_eq!(Hasher::Xxh3.hash("a"), content_hash("a"));
        assert_eq!(Hasher::custom(|_| "hash".to_string()).hash("a"), "hash");
    }

    #[test]
    fn test_hasher_deserialize() {
        let hasher: Hasher = serde_json::from_str("\"xxh3\"").unwrap();
        assert!(matches!(hasher, Hasher::Xxh3));
        assert_eq!(format!("{:?}", Hasher::custom(|s| s.into())), "Custom(..)");
    }
}
