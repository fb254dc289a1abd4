//! The open-addressed name directory

use std::io::{Read, Seek};

use super::{read_table_bytes, TABLE_ENTRY_SIZE};
use crate::crypto::HASH_TABLE_KEY;
use crate::error::Result;

/// Block index sentinel of a never-used slot; terminates probing
pub const BLOCK_INDEX_EMPTY: u32 = 0xFFFF_FFFF;

/// Block index sentinel of a deleted slot; probing continues past it
pub const BLOCK_INDEX_DELETED: u32 = 0xFFFF_FFFE;

/// One 16-byte hash table entry
///
/// The probing seed (`TableOffset` hash) is never stored; an entry keeps
/// only the two verification hashes that identify the name.
#[derive(Debug, Clone, Copy)]
pub struct HashEntry {
    /// `NameA` hash of the stored file name
    pub name_hash_b: u32,
    /// `NameB` hash of the stored file name
    pub name_hash_c: u32,
    /// Language ID of this entry
    pub locale: u16,
    /// Platform ID of this entry
    pub platform: u16,
    /// Index into the block table, or one of the slot sentinels
    pub block_index: u32,
}

impl HashEntry {
    /// Returns true if this slot has never held a file
    pub fn is_empty(&self) -> bool {
        self.block_index == BLOCK_INDEX_EMPTY
    }

    /// Returns true if this slot held a file that was deleted
    pub fn is_deleted(&self) -> bool {
        self.block_index == BLOCK_INDEX_DELETED
    }

    fn parse(raw: &[u8]) -> Self {
        Self {
            name_hash_b: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            name_hash_c: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
            locale: u16::from_le_bytes([raw[8], raw[9]]),
            platform: u16::from_le_bytes([raw[10], raw[11]]),
            block_index: u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]),
        }
    }
}

/// The archive's hash table, fully materialised in memory
pub struct HashTable {
    entries: Vec<HashEntry>,
    /// Size mask for slot arithmetic (`len - 1`, len is a power of two)
    mask: u32,
}

impl HashTable {
    /// Reads and decrypts the table from the archive
    ///
    /// The entry count must already have been validated as a power of two
    /// by the header check.
    pub fn read_from<R: Read + Seek>(
        reader: &mut R,
        offset: u64,
        entries: usize,
    ) -> Result<Self> {
        let buffer = read_table_bytes(reader, offset, entries, HASH_TABLE_KEY)?;

        let entries: Vec<HashEntry> = buffer
            .chunks_exact(TABLE_ENTRY_SIZE)
            .map(HashEntry::parse)
            .collect();
        let mask = (entries.len() as u32).wrapping_sub(1);

        Ok(Self { entries, mask })
    }

    /// Builds a table from already-decoded entries
    ///
    /// `entries.len()` must be a power of two.
    pub fn from_entries(entries: Vec<HashEntry>) -> Self {
        debug_assert!(crate::is_power_of_two(entries.len() as u32));
        let mask = (entries.len() as u32).wrapping_sub(1);
        Self { entries, mask }
    }

    /// Number of slots in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no slots
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All slots in table order
    pub fn entries(&self) -> &[HashEntry] {
        &self.entries
    }

    /// Finds the entry matching a name's hash triple
    ///
    /// Probes linearly from `hash_a & mask`, wrapping at the table end.
    /// An empty slot terminates the probe; a deleted slot is skipped.
    /// Locale and platform are not consulted: the first entry whose
    /// verification hashes match wins, whatever its locale. Archives
    /// carrying per-locale variants of one name resolve to the variant
    /// nearest the probe start.
    pub fn find_entry(&self, hash_a: u32, hash_b: u32, hash_c: u32) -> Option<(usize, &HashEntry)> {
        if self.entries.is_empty() {
            return None;
        }

        let start = (hash_a & self.mask) as usize;
        for i in 0..self.entries.len() {
            let index = (start + i) & self.mask as usize;
            let entry = &self.entries[index];

            if entry.is_empty() {
                return None;
            }
            if entry.is_deleted() {
                continue;
            }
            if entry.name_hash_b == hash_b && entry.name_hash_c == hash_c {
                return Some((index, entry));
            }
        }

        // Every slot held an unrelated live or deleted entry.
        None
    }
}
