//! MPQ archive handling
//!
//! An [`Archive`] materialises the header and both metadata tables
//! eagerly at load time and is immutable afterwards. It does not own the
//! backing byte source; the caller passes it to every operation that
//! touches the disk, which keeps ownership of the cursor explicit and
//! lets one source serve several archives in turn.

use log::debug;
use std::io::{Read, Seek, SeekFrom};

use crate::crypto::compute_file_hashes;
use crate::error::{Error, Result};
use crate::file::read_file_data;
use crate::header::MpqHeader;
use crate::listfile::parse_listfile;
use crate::tables::{BlockEntry, BlockTable, HashTable};

/// The conventional name of the embedded file listing
pub const LISTFILE_NAME: &str = "(listfile)";

/// An MPQ archive with its metadata tables loaded
pub struct Archive {
    header: MpqHeader,
    hash_table: HashTable,
    block_table: BlockTable,
    /// Block table positions whose exists flag is set, in table order
    live_block_indices: Vec<usize>,
}

impl Archive {
    /// Loads an archive from a seekable byte source
    ///
    /// Reads the header, then decrypts and materialises both tables.
    /// The source is only borrowed; pass it again to [`Archive::read_file`]
    /// and friends.
    pub fn load<R: Read + Seek>(source: &mut R) -> Result<Self> {
        source.seek(SeekFrom::Start(0))?;
        let header = MpqHeader::read(source)?;
        header.validate()?;

        let hash_table = HashTable::read_from(
            source,
            header.hash_table_offset_64(),
            header.hash_table_entries as usize,
        )?;
        let block_table = BlockTable::read_from(
            source,
            header.block_table_offset_64(),
            header.block_table_entries as usize,
        )?;
        let live_block_indices = block_table.live_indices();

        debug!(
            "loaded archive: {} hash slots, {} block entries, {} live files",
            hash_table.len(),
            block_table.len(),
            live_block_indices.len()
        );

        Ok(Self {
            header,
            hash_table,
            block_table,
            live_block_indices,
        })
    }

    /// The archive header
    pub fn header(&self) -> &MpqHeader {
        &self.header
    }

    /// Sector size of this archive
    pub fn sector_size(&self) -> u32 {
        self.header.sector_size()
    }

    /// Number of live files in the archive
    pub fn file_count(&self) -> usize {
        self.live_block_indices.len()
    }

    /// Block table positions of the live files, in table order
    pub fn live_block_indices(&self) -> &[usize] {
        &self.live_block_indices
    }

    /// Checks whether a file exists in the archive
    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_ok()
    }

    /// Resolves a name to its block table entry
    ///
    /// The matched hash entry's block index addresses the block table
    /// directly. Dead block entries reachable through stale hash slots
    /// report as missing rather than yielding garbage sectors.
    pub fn find(&self, name: &str) -> Result<&BlockEntry> {
        let (hash_a, hash_b, hash_c) = compute_file_hashes(name);
        let (_, hash_entry) = self
            .hash_table
            .find_entry(hash_a, hash_b, hash_c)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))?;

        let index = hash_entry.block_index as usize;
        let entry = self.block_table.get(index).ok_or_else(|| {
            Error::Format(format!(
                "hash entry for {name} points at block {index} of {}",
                self.block_table.len()
            ))
        })?;

        if !entry.exists() {
            return Err(Error::FileNotFound(name.to_string()));
        }
        Ok(entry)
    }

    /// Reads a file's full decoded payload by name
    pub fn read_file<R: Read + Seek>(&self, source: &mut R, name: &str) -> Result<Vec<u8>> {
        let entry = self.find(name)?;
        debug!(
            "extracting {name}: {} bytes at {:#x}, flags {:#010x}",
            entry.file_size, entry.file_position, entry.flags
        );
        read_file_data(source, entry, self.sector_size())
    }

    /// Reads and parses the `(listfile)` catalogue of member names
    pub fn read_listfile<R: Read + Seek>(&self, source: &mut R) -> Result<Vec<String>> {
        let data = self.read_file(source, LISTFILE_NAME)?;
        Ok(parse_listfile(&data))
    }
}
