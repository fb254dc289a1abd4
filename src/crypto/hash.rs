//! Name hash functions of the MPQ directory
//!
//! Every file name hashes to three values: the probing seed for the hash
//! table and the two verification hashes stored in the matched entry. A
//! fourth bank derives per-table decryption keys from well-known names.

use super::constants::CRYPT_TABLE;

/// Hash banks of the shared crypt table
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashType {
    /// Probing seed; selects the starting slot in the hash table
    TableOffset = 0,
    /// First stored verification hash
    NameA = 1,
    /// Second stored verification hash
    NameB = 2,
    /// Key derivation for table decryption
    FileKey = 3,
}

/// Byte normalisation applied before hashing: ASCII letters are
/// upper-cased and forward slashes canonicalised to backslashes, so
/// `path/to/file` and `PATH\TO\FILE` name the same archive member.
static NORMALIZE: [u8; 256] = build_normalize_table();

const fn build_normalize_table() -> [u8; 256] {
    let mut table = [0u8; 256];
    let mut i = 0;
    while i < 256 {
        let ch = i as u8;
        table[i] = if ch == b'/' {
            b'\\'
        } else if ch >= b'a' && ch <= b'z' {
            ch - 0x20
        } else {
            ch
        };
        i += 1;
    }
    table
}

/// Calculates the hash of a name under the given bank
pub fn hash_string(input: &str, hash_type: HashType) -> u32 {
    let bank = hash_type as usize * 0x100;
    let mut seed1: u32 = 0x7FED_7FED;
    let mut seed2: u32 = 0xEEEE_EEEE;

    for &byte in input.as_bytes() {
        let ch = NORMALIZE[byte as usize] as u32;

        seed1 = CRYPT_TABLE[bank + ch as usize] ^ seed1.wrapping_add(seed2);
        seed2 = ch
            .wrapping_add(seed1)
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }

    seed1
}

/// Computes the three hashes used for directory lookup
///
/// Returns `(TableOffset, NameA, NameB)`. The full path participates in
/// the hash; only its separator style and letter case are normalised.
pub fn compute_file_hashes(name: &str) -> (u32, u32, u32) {
    (
        hash_string(name, HashType::TableOffset),
        hash_string(name, HashType::NameA),
        hash_string(name, HashType::NameB),
    )
}
