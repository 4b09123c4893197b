//! Line hashing.
//!
//! The diff primitive compares lines many times over; hashing each line once
//! up front turns most of those comparisons into integer checks.

/// FNV-1a 64-bit hash of a string's UTF-8 bytes.
///
/// Non-cryptographic. Equal hashes only mean "probably equal", so callers
/// that need exact equality must still compare the text on a hash match.
///
/// # Example
///
/// ```
/// use line_status::text::fnv1a_hash;
///
/// assert_eq!(fnv1a_hash("fn main() {}"), fnv1a_hash("fn main() {}"));
/// assert_ne!(fnv1a_hash("fn main() {}"), fnv1a_hash("fn main() { }"));
/// ```
#[inline]
pub fn fnv1a_hash(text: &str) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    text.bytes().fold(FNV_OFFSET, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(FNV_PRIME)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_line_hashes_to_offset_basis() {
        assert_eq!(fnv1a_hash(""), 0xcbf29ce484222325);
    }

    #[test]
    fn test_known_fnv1a_value() {
        assert_eq!(fnv1a_hash("hello"), 0xa430d84680aabd0b);
    }

    #[test]
    fn test_lines_differing_by_one_byte_hash_differently() {
        assert_ne!(fnv1a_hash("let x = 1;"), fnv1a_hash("let x = 2;"));
        assert_ne!(fnv1a_hash("日本語"), fnv1a_hash("日本"));
    }
}
