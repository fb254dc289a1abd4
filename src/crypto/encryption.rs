//! The symmetric stream cipher protecting the hash and block tables
//!
//! The cipher XORs a keyed word stream over 32-bit little-endian words.
//! Encryption and decryption differ only in which value (plaintext or
//! ciphertext word) feeds the next round of the running seed. Bytes past
//! the last whole word are left untouched; the tables are always a
//! multiple of 16 bytes so nothing is lost there.

use super::constants::CRYPT_TABLE;

/// Decrypts a buffer in place with the given key
pub fn decrypt_block(data: &mut [u8], key: u32) {
    let mut seed1 = key;
    let mut seed2: u32 = 0xEEEE_EEEE;

    for chunk in data.chunks_exact_mut(4) {
        seed2 = seed2.wrapping_add(CRYPT_TABLE[(0x400 + (seed1 & 0xFF)) as usize]);

        let cipher = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let plain = cipher ^ seed1.wrapping_add(seed2);
        chunk.copy_from_slice(&plain.to_le_bytes());

        seed1 = ((!seed1 << 0x15).wrapping_add(0x1111_1111)) | (seed1 >> 0x0B);
        seed2 = plain
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }
}

/// Encrypts a buffer in place with the given key
///
/// Exact inverse of [`decrypt_block`]; used by the test fixtures that
/// build synthetic archives.
pub fn encrypt_block(data: &mut [u8], key: u32) {
    let mut seed1 = key;
    let mut seed2: u32 = 0xEEEE_EEEE;

    for chunk in data.chunks_exact_mut(4) {
        seed2 = seed2.wrapping_add(CRYPT_TABLE[(0x400 + (seed1 & 0xFF)) as usize]);

        let plain = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        let cipher = plain ^ seed1.wrapping_add(seed2);
        chunk.copy_from_slice(&cipher.to_le_bytes());

        seed1 = ((!seed1 << 0x15).wrapping_add(0x1111_1111)) | (seed1 >> 0x0B);
        seed2 = plain
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }
}
