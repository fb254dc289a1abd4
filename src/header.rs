//! MPQ archive header parsing

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{self, Read};
use thiserror::Error;

use crate::is_power_of_two;

/// MPQ header signature: 'MPQ\x1A'
pub const MPQ_SIGNATURE: u32 = 0x1A51504D;

/// MPQ user data signature: 'MPQ\x1B'
pub const MPQ_USER_DATA_SIGNATURE: u32 = 0x1B51504D;

/// Size of the version 0 header
pub const MPQ_HEADER_SIZE_V0: u32 = 32;

/// Size of the version 1 header with extended table offsets
pub const MPQ_HEADER_SIZE_V1: u32 = 44;

/// Error types specific to header parsing
#[derive(Error, Debug)]
pub enum HeaderError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid MPQ signature: {0:#010x}")]
    InvalidSignature(u32),

    #[error("user data wrapper (MPQ\\x1B) archives are not supported")]
    UserDataWrapper,

    #[error("unsupported format version: {0}")]
    UnsupportedVersion(u16),

    #[error("invalid header size: {0}")]
    InvalidHeaderSize(u32),

    #[error("hash table entry count {0} is not a power of two")]
    InvalidHashTableSize(u32),
}

/// MPQ archive header
///
/// The fixed 32-byte layout of format version 0, optionally followed by
/// the 12-byte version 1 extension that widens the table offsets past
/// 32 bits.
#[derive(Debug, Clone)]
pub struct MpqHeader {
    /// Size of the header in bytes
    pub header_size: u32,

    /// Total size of the archive in bytes (informational)
    pub archive_size: u32,

    /// MPQ format version (0 or 1)
    pub format_version: u16,

    /// Sector size exponent; sector size is `512 << shift`
    pub sector_size_shift: u16,

    /// Offset of the hash table from the start of the archive
    pub hash_table_offset: u32,

    /// Offset of the block table from the start of the archive
    pub block_table_offset: u32,

    /// Number of entries in the hash table (always a power of two)
    pub hash_table_entries: u32,

    /// Number of entries in the block table
    pub block_table_entries: u32,

    /// 64-bit offset of the extended block table, version 1 only
    pub extended_block_table_offset: Option<u64>,

    /// High 16 bits of the hash table offset, version 1 only
    pub hash_table_offset_high: Option<u16>,

    /// High 16 bits of the block table offset, version 1 only
    pub block_table_offset_high: Option<u16>,
}

impl MpqHeader {
    /// Reads a header from the start of an archive
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, HeaderError> {
        let signature = reader.read_u32::<LittleEndian>()?;
        match signature {
            MPQ_SIGNATURE => {}
            MPQ_USER_DATA_SIGNATURE => return Err(HeaderError::UserDataWrapper),
            other => return Err(HeaderError::InvalidSignature(other)),
        }

        let header_size = reader.read_u32::<LittleEndian>()?;
        let archive_size = reader.read_u32::<LittleEndian>()?;
        let format_version = reader.read_u16::<LittleEndian>()?;
        let sector_size_shift = reader.read_u16::<LittleEndian>()?;
        let hash_table_offset = reader.read_u32::<LittleEndian>()?;
        let block_table_offset = reader.read_u32::<LittleEndian>()?;
        let hash_table_entries = reader.read_u32::<LittleEndian>()?;
        let block_table_entries = reader.read_u32::<LittleEndian>()?;

        let mut header = MpqHeader {
            header_size,
            archive_size,
            format_version,
            sector_size_shift,
            hash_table_offset,
            block_table_offset,
            hash_table_entries,
            block_table_entries,
            extended_block_table_offset: None,
            hash_table_offset_high: None,
            block_table_offset_high: None,
        };

        if format_version >= 1 && header_size >= MPQ_HEADER_SIZE_V1 {
            header.extended_block_table_offset = Some(reader.read_u64::<LittleEndian>()?);
            header.hash_table_offset_high = Some(reader.read_u16::<LittleEndian>()?);
            header.block_table_offset_high = Some(reader.read_u16::<LittleEndian>()?);
        }

        Ok(header)
    }

    /// Validates the header invariants after reading
    pub fn validate(&self) -> Result<(), HeaderError> {
        if self.format_version > 1 {
            return Err(HeaderError::UnsupportedVersion(self.format_version));
        }
        if self.header_size < MPQ_HEADER_SIZE_V0 {
            return Err(HeaderError::InvalidHeaderSize(self.header_size));
        }
        if !is_power_of_two(self.hash_table_entries) {
            return Err(HeaderError::InvalidHashTableSize(self.hash_table_entries));
        }
        Ok(())
    }

    /// Gets the sector size for this archive
    pub fn sector_size(&self) -> u32 {
        crate::calculate_sector_size(self.sector_size_shift)
    }

    /// Full 64-bit hash table offset
    pub fn hash_table_offset_64(&self) -> u64 {
        let high = self.hash_table_offset_high.unwrap_or(0) as u64;
        (high << 32) | self.hash_table_offset as u64
    }

    /// Full 64-bit block table offset
    pub fn block_table_offset_64(&self) -> u64 {
        let high = self.block_table_offset_high.unwrap_or(0) as u64;
        (high << 32) | self.block_table_offset as u64
    }
}
