//! Reading file payloads out of the sector stream
//!
//! A stored file is either a single unit or a run of fixed-size sectors,
//! each independently compressed. Sectorised compressed files open with a
//! vector of offsets relative to the file position; uncompressed files
//! have no vector on disk and their sector geometry is implied by the
//! sector size.

use byteorder::{LittleEndian, ReadBytesExt};
use log::trace;
use std::io::{Read, Seek, SeekFrom};

use crate::compression::decompress_sector;
use crate::error::{Error, Result};
use crate::tables::BlockEntry;

/// Reads and decodes a file's full payload
///
/// `sector_size` is the archive-wide sector size from the header. The
/// returned buffer is exactly `entry.file_size` bytes long.
pub fn read_file_data<R: Read + Seek>(
    source: &mut R,
    entry: &BlockEntry,
    sector_size: u32,
) -> Result<Vec<u8>> {
    if entry.is_encrypted() {
        return Err(Error::UnsupportedFeature(
            "encrypted file payload".to_string(),
        ));
    }
    if entry.is_compressed() && !entry.is_tag_compressed() {
        // PKWARE implode, or a compression bit this reader does not know.
        return Err(Error::UnsupportedFeature(
            "PKWARE-imploded file payload".to_string(),
        ));
    }

    let file_size = entry.file_size as usize;
    if file_size == 0 {
        return Ok(Vec::new());
    }

    if entry.is_single_unit() {
        return read_single_unit(source, entry, file_size);
    }
    read_sectors(source, entry, sector_size, file_size)
}

fn read_single_unit<R: Read + Seek>(
    source: &mut R,
    entry: &BlockEntry,
    file_size: usize,
) -> Result<Vec<u8>> {
    source.seek(SeekFrom::Start(entry.file_position as u64))?;

    if entry.is_tag_compressed() {
        let mut blob = alloc_buffer(entry.compressed_size as usize)?;
        source.read_exact(&mut blob)?;
        return Ok(decompress_sector(&blob, file_size)?);
    }

    let mut data = alloc_buffer(file_size)?;
    source.read_exact(&mut data)?;
    Ok(data)
}

fn read_sectors<R: Read + Seek>(
    source: &mut R,
    entry: &BlockEntry,
    sector_size: u32,
    file_size: usize,
) -> Result<Vec<u8>> {
    let sector_size = sector_size as usize;
    let sector_count = file_size.div_ceil(sector_size);
    let file_position = entry.file_position as u64;

    // Compressed files store their offset vector on disk; uncompressed
    // files lay sectors back to back and the vector is implied.
    let offsets = if entry.is_tag_compressed() {
        source.seek(SeekFrom::Start(file_position))?;
        let mut offsets = Vec::with_capacity(sector_count + 1);
        for _ in 0..=sector_count {
            offsets.push(source.read_u32::<LittleEndian>()?);
        }
        offsets
    } else {
        let mut offsets: Vec<u32> = (0..sector_count)
            .map(|k| (k * sector_size) as u32)
            .collect();
        offsets.push(entry.compressed_size);
        offsets
    };

    let mut output = Vec::new();
    output
        .try_reserve_exact(file_size)
        .map_err(|_| Error::OutOfMemory(file_size))?;

    for k in 0..sector_count {
        let start = offsets[k];
        let end = offsets[k + 1];
        if end < start {
            return Err(Error::Format(format!(
                "sector {k} offsets run backwards: {start} > {end}"
            )));
        }

        let expected = if k == sector_count - 1 {
            file_size - sector_size * (sector_count - 1)
        } else {
            sector_size
        };

        let mut raw = alloc_buffer((end - start) as usize)?;
        source.seek(SeekFrom::Start(file_position + start as u64))?;
        source.read_exact(&mut raw)?;
        trace!("sector {k}: {} bytes on disk, {expected} expected", raw.len());

        if entry.is_tag_compressed() {
            output.extend_from_slice(&decompress_sector(&raw, expected)?);
        } else {
            output.extend_from_slice(&raw);
        }
    }

    if output.len() != file_size {
        return Err(Error::Format(format!(
            "decoded {} bytes for a {} byte file",
            output.len(),
            file_size
        )));
    }
    Ok(output)
}

fn alloc_buffer(len: usize) -> Result<Vec<u8>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory(len))?;
    buffer.resize(len, 0);
    Ok(buffer)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tables::block_flags;
    use std::io::Cursor;

    fn entry(file_position: u32, compressed_size: u32, file_size: u32, flags: u32) -> BlockEntry {
        BlockEntry {
            file_position,
            compressed_size,
            file_size,
            flags: flags | block_flags::EXISTS,
        }
    }

    #[test]
    fn test_single_unit_uncompressed() {
        // The region on disk is larger than the file; only file_size
        // bytes belong to the payload.
        let mut disk = vec![0u8; 16];
        disk.extend_from_slice(b"hello sectors");
        disk.extend_from_slice(&[0xFF; 8]);

        let e = entry(16, 32, 13, block_flags::SINGLE_UNIT);
        let data = read_file_data(&mut Cursor::new(disk), &e, 4096).unwrap();
        assert_eq!(data, b"hello sectors");
    }

    #[test]
    fn test_empty_file() {
        let e = entry(0, 0, 0, 0);
        let data = read_file_data(&mut Cursor::new(Vec::new()), &e, 4096).unwrap();
        assert!(data.is_empty());
    }

    #[test]
    fn test_uncompressed_sectors_use_implied_offsets() {
        // Sector size 512, 2.5 sectors of recognisable content.
        let content: Vec<u8> = (0..1280u32).map(|i| (i % 251) as u8).collect();
        let mut disk = vec![0u8; 64];
        disk.extend_from_slice(&content);

        let e = entry(64, content.len() as u32, content.len() as u32, 0);
        let data = read_file_data(&mut Cursor::new(disk), &e, 512).unwrap();
        assert_eq!(data, content);
    }

    #[test]
    fn test_encrypted_payload_unsupported() {
        let e = entry(0, 4, 4, block_flags::ENCRYPTED);
        let result = read_file_data(&mut Cursor::new(vec![0u8; 8]), &e, 4096);
        assert!(matches!(result, Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_imploded_payload_unsupported() {
        let e = entry(0, 4, 4, block_flags::IMPLODED);
        let result = read_file_data(&mut Cursor::new(vec![0u8; 8]), &e, 4096);
        assert!(matches!(result, Err(Error::UnsupportedFeature(_))));
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_tag_compressed_sectors() {
        use crate::compression::TAG_ZLIB;
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        // Three sectors at sector size 512: two full, one partial.
        let content: Vec<u8> = b"abcdefgh".iter().cycle().take(1100).copied().collect();
        let sector_size = 512usize;

        let mut sectors = Vec::new();
        for chunk in content.chunks(sector_size) {
            let mut encoder = ZlibEncoder::new(vec![TAG_ZLIB], Compression::default());
            encoder.write_all(chunk).unwrap();
            sectors.push(encoder.finish().unwrap());
        }

        let vector_len = (sectors.len() + 1) * 4;
        let mut offsets = vec![vector_len as u32];
        for sector in &sectors {
            offsets.push(offsets.last().unwrap() + sector.len() as u32);
        }

        let file_position = 32u32;
        let mut disk = vec![0u8; file_position as usize];
        for offset in &offsets {
            disk.extend_from_slice(&offset.to_le_bytes());
        }
        for sector in &sectors {
            disk.extend_from_slice(sector);
        }

        let total = *offsets.last().unwrap();
        let e = entry(
            file_position,
            total,
            content.len() as u32,
            block_flags::COMPRESSED,
        );
        let data = read_file_data(&mut Cursor::new(disk), &e, sector_size as u32).unwrap();
        assert_eq!(data, content);
    }

    #[test]
    fn test_checksum_extended_offset_vector() {
        // With the checksum flag the on-disk vector has one extra entry;
        // sectors are still addressed absolutely from their offsets.
        let content = vec![0x11u8; 512];
        let offsets: [u32; 3] = [12, 12 + 512, 12 + 512 + 4];

        let mut disk = Vec::new();
        for offset in offsets {
            disk.extend_from_slice(&offset.to_le_bytes());
        }
        disk.extend_from_slice(&content);
        disk.extend_from_slice(&[0xAA; 4]); // checksum sector, unread

        let e = entry(
            0,
            disk.len() as u32,
            512,
            block_flags::COMPRESSED | block_flags::SECTOR_CRC,
        );
        let data = read_file_data(&mut Cursor::new(disk), &e, 512).unwrap();
        assert_eq!(data, content);
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_incompressible_sector_stored_raw() {
        // A sector stored at exactly its uncompressed length passes
        // through without a tag byte.
        let content: Vec<u8> = (0..=255u8).cycle().take(512).collect();
        let offsets: [u32; 2] = [8, 8 + 512];

        let mut disk = Vec::new();
        for offset in offsets {
            disk.extend_from_slice(&offset.to_le_bytes());
        }
        disk.extend_from_slice(&content);

        let e = entry(0, disk.len() as u32, 512, block_flags::COMPRESSED);
        let data = read_file_data(&mut Cursor::new(disk), &e, 512).unwrap();
        assert_eq!(data, content);
    }
}
