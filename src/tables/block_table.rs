//! The per-file location and storage-mode table

use std::io::{Read, Seek};

use super::{read_table_bytes, TABLE_ENTRY_SIZE};
use crate::crypto::BLOCK_TABLE_KEY;
use crate::error::Result;

/// Block flags describing how a file's payload is stored
pub mod block_flags {
    /// File exists; entries without it are free or deleted slots
    pub const EXISTS: u32 = 0x8000_0000;
    /// Payload is stored as one unit, not split into sectors
    pub const SINGLE_UNIT: u32 = 0x0100_0000;
    /// Sector offset vector carries a trailing per-sector checksum block
    pub const SECTOR_CRC: u32 = 0x0400_0000;
    /// Payload is encrypted with a file key
    pub const ENCRYPTED: u32 = 0x0001_0000;
    /// Mask covering every compression scheme bit
    pub const COMPRESSION_MASK: u32 = 0x0000_FF00;
    /// Sectors are PKWARE-imploded
    pub const IMPLODED: u32 = 0x0000_0100;
    /// Sectors carry a leading compression tag byte
    pub const COMPRESSED: u32 = 0x0000_0200;
}

/// One 16-byte block table entry
#[derive(Debug, Clone, Copy, Default)]
pub struct BlockEntry {
    /// Byte offset of the file's sector stream from the archive start
    pub file_position: u32,
    /// On-disk byte length of the sector stream
    pub compressed_size: u32,
    /// Uncompressed byte length of the file
    pub file_size: u32,
    /// Storage-mode bitfield
    pub flags: u32,
}

impl BlockEntry {
    /// Returns true if this entry describes a live file
    pub fn exists(&self) -> bool {
        (self.flags & block_flags::EXISTS) != 0
    }

    /// Returns true if the payload is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        (self.flags & block_flags::SINGLE_UNIT) != 0
    }

    /// Returns true if the payload is encrypted
    pub fn is_encrypted(&self) -> bool {
        (self.flags & block_flags::ENCRYPTED) != 0
    }

    /// Returns true if any compression scheme applies
    pub fn is_compressed(&self) -> bool {
        (self.flags & block_flags::COMPRESSION_MASK) != 0
    }

    /// Returns true if sectors carry a leading compression tag byte
    pub fn is_tag_compressed(&self) -> bool {
        (self.flags & block_flags::COMPRESSED) != 0
    }

    /// Returns true if sectors are PKWARE-imploded
    pub fn is_imploded(&self) -> bool {
        (self.flags & block_flags::IMPLODED) != 0
    }

    /// Returns true if the sector offset vector has a checksum extension
    pub fn has_sector_crc(&self) -> bool {
        (self.flags & block_flags::SECTOR_CRC) != 0
    }

    fn parse(raw: &[u8]) -> Self {
        Self {
            file_position: u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]),
            compressed_size: u32::from_le_bytes([raw[4], raw[5], raw[6], raw[7]]),
            file_size: u32::from_le_bytes([raw[8], raw[9], raw[10], raw[11]]),
            flags: u32::from_le_bytes([raw[12], raw[13], raw[14], raw[15]]),
        }
    }
}

/// The archive's block table, fully materialised in memory
pub struct BlockTable {
    entries: Vec<BlockEntry>,
}

impl BlockTable {
    /// Reads and decrypts the table from the archive
    pub fn read_from<R: Read + Seek>(
        reader: &mut R,
        offset: u64,
        entries: usize,
    ) -> Result<Self> {
        let buffer = read_table_bytes(reader, offset, entries, BLOCK_TABLE_KEY)?;

        let entries = buffer
            .chunks_exact(TABLE_ENTRY_SIZE)
            .map(BlockEntry::parse)
            .collect();

        Ok(Self { entries })
    }

    /// Number of entries in the table
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the table has no entries
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Gets the entry at the given index
    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.entries.get(index)
    }

    /// All entries in table order
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Positions of entries whose exists flag is set, in table order
    pub fn live_indices(&self) -> Vec<usize> {
        self.entries
            .iter()
            .enumerate()
            .filter(|(_, entry)| entry.exists())
            .map(|(index, _)| index)
            .collect()
    }
}
