//! bzip2 sector decoding

use std::io::Read;

use bzip2::read::BzDecoder;

use super::{CompressionError, CompressionResult};

/// Decompresses a bzip2 stream, enforcing the declared output length
pub fn decompress(data: &[u8], expected_size: usize) -> CompressionResult<Vec<u8>> {
    let mut decoder = BzDecoder::new(data);
    let mut decompressed = Vec::with_capacity(expected_size);

    decoder
        .read_to_end(&mut decompressed)
        .map_err(|e| CompressionError::DecompressionFailed(e.to_string()))?;

    if decompressed.len() != expected_size {
        return Err(CompressionError::SizeMismatch {
            got: decompressed.len(),
            expected: expected_size,
        });
    }

    Ok(decompressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ::bzip2::write::BzEncoder;
    use ::bzip2::Compression;
    use std::io::Write;

    #[test]
    fn test_roundtrip() {
        let original = vec![0x5Au8; 2048];

        let mut encoder = BzEncoder::new(Vec::new(), Compression::best());
        encoder.write_all(&original).unwrap();
        let compressed = encoder.finish().unwrap();

        let decompressed = decompress(&compressed, original.len()).unwrap();
        assert_eq!(decompressed, original);
    }

    #[test]
    fn test_garbage_rejected() {
        let result = decompress(&[0x00, 0x01, 0x02, 0x03], 16);
        assert!(matches!(
            result,
            Err(CompressionError::DecompressionFailed(_))
        ));
    }
}
