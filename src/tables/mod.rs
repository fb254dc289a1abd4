//! The two metadata tables of an MPQ archive
//!
//! The hash table is an open-addressed directory from hashed names to
//! block indices; the block table records where each file's sector stream
//! lives and how it is stored. Both are encrypted on disk with keys
//! derived from their well-known names.

pub mod block_table;
pub mod hash_table;

pub use block_table::{block_flags, BlockEntry, BlockTable};
pub use hash_table::{HashEntry, HashTable, BLOCK_INDEX_DELETED, BLOCK_INDEX_EMPTY};

use std::io::{Read, Seek, SeekFrom};

use crate::crypto::decrypt_block;
use crate::error::{Error, Result};

/// Size of a single entry in either table
pub const TABLE_ENTRY_SIZE: usize = 16;

/// Reads and decrypts a table's raw bytes
///
/// Both tables share the same on-disk shape: `entries * 16` contiguous
/// bytes at a declared offset, enciphered as a stream of little-endian
/// words under a fixed key.
pub(crate) fn read_table_bytes<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    entries: usize,
    key: u32,
) -> Result<Vec<u8>> {
    let byte_len = entries * TABLE_ENTRY_SIZE;

    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(byte_len)
        .map_err(|_| Error::OutOfMemory(byte_len))?;
    buffer.resize(byte_len, 0);

    reader.seek(SeekFrom::Start(offset))?;
    reader.read_exact(&mut buffer)?;

    decrypt_block(&mut buffer, key);
    Ok(buffer)
}
