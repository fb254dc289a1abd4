//! Sector decompression
//!
//! A tag-compressed sector opens with one byte naming the scheme the
//! producer applied; the rest is the compressed stream. Producers skip
//! compression for sectors it would not shrink, storing them raw with no
//! tag byte, which is why callers pass the expected uncompressed length:
//! a sector already at that length is passed through unchanged.

#[cfg(feature = "bzip2")]
mod bzip2;
#[cfg(feature = "zlib")]
mod zlib;

use thiserror::Error;

/// Sector tag byte for zlib streams
pub const TAG_ZLIB: u8 = 0x02;

/// Sector tag byte for bzip2 streams
pub const TAG_BZIP2: u8 = 0x03;

/// Error types specific to sector decompression
#[derive(Error, Debug)]
pub enum CompressionError {
    #[error("invalid compression tag: {0:#04x}")]
    InvalidTag(u8),

    #[error("decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("decompressed size mismatch: got {got}, expected {expected}")]
    SizeMismatch { got: usize, expected: usize },

    #[error("empty sector")]
    EmptySector,

    #[error("{0} support is not compiled in")]
    Disabled(&'static str),
}

/// Result type for decompression operations
pub type CompressionResult<T> = Result<T, CompressionError>;

/// Decompresses one tag-compressed sector
///
/// `expected_size` is the sector's uncompressed length, known from the
/// file size and sector geometry. Returns exactly that many bytes or an
/// error; a short or long stream from the decoder is a corruption signal,
/// not a partial success.
pub fn decompress_sector(data: &[u8], expected_size: usize) -> CompressionResult<Vec<u8>> {
    if data.is_empty() {
        return Err(CompressionError::EmptySector);
    }

    // Stored raw when compression would not have helped.
    if data.len() == expected_size {
        return Ok(data.to_vec());
    }

    match data[0] {
        TAG_ZLIB => {
            #[cfg(feature = "zlib")]
            {
                zlib::decompress(&data[1..], expected_size)
            }
            #[cfg(not(feature = "zlib"))]
            {
                Err(CompressionError::Disabled("zlib"))
            }
        }
        TAG_BZIP2 => {
            #[cfg(feature = "bzip2")]
            {
                bzip2::decompress(&data[1..], expected_size)
            }
            #[cfg(not(feature = "bzip2"))]
            {
                Err(CompressionError::Disabled("bzip2"))
            }
        }
        tag => Err(CompressionError::InvalidTag(tag)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_raw_sector_passthrough() {
        let data = vec![0xAB; 64];
        let out = decompress_sector(&data, 64).unwrap();
        assert_eq!(out, data);
    }

    #[test]
    fn test_empty_sector_rejected() {
        assert!(matches!(
            decompress_sector(&[], 16),
            Err(CompressionError::EmptySector)
        ));
    }

    #[test]
    fn test_unknown_tag_rejected() {
        // 0x10 is bzip2's bitmask value in other containers, not a valid
        // tag here.
        let data = [0x10u8, 1, 2, 3];
        assert!(matches!(
            decompress_sector(&data, 32),
            Err(CompressionError::InvalidTag(0x10))
        ));
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_sector() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let original: Vec<u8> = b"the same phrase again and again and again and again"
            .iter()
            .cycle()
            .take(300)
            .copied()
            .collect();

        let mut encoder = ZlibEncoder::new(vec![TAG_ZLIB], Compression::default());
        encoder.write_all(&original).unwrap();
        let sector = encoder.finish().unwrap();
        assert!(sector.len() < original.len());

        let out = decompress_sector(&sector, original.len()).unwrap();
        assert_eq!(out, original);
    }

    #[cfg(feature = "zlib")]
    #[test]
    fn test_zlib_size_mismatch() {
        use flate2::write::ZlibEncoder;
        use flate2::Compression;
        use std::io::Write;

        let mut encoder = ZlibEncoder::new(vec![TAG_ZLIB], Compression::default());
        encoder.write_all(&[7u8; 100]).unwrap();
        let sector = encoder.finish().unwrap();

        assert!(matches!(
            decompress_sector(&sector, 200),
            Err(CompressionError::SizeMismatch {
                got: 100,
                expected: 200
            })
        ));
    }

    #[cfg(feature = "bzip2")]
    #[test]
    fn test_bzip2_sector() {
        use ::bzip2::write::BzEncoder;
        use ::bzip2::Compression;
        use std::io::Write;

        let original = vec![0x42u8; 4096];

        let mut encoder = BzEncoder::new(vec![TAG_BZIP2], Compression::default());
        encoder.write_all(&original).unwrap();
        let sector = encoder.finish().unwrap();

        let out = decompress_sector(&sector, original.len()).unwrap();
        assert_eq!(out, original);
    }
}
