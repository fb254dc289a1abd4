//! zlib sector decoding

use std::io::Read;

use flate2::read::ZlibDecoder;

use super::{CompressionError, CompressionResult};

/// Decompresses a zlib stream, enforcing the declared output length
pub fn decompress(data: &[u8], expected_size: usize) -> CompressionResult<Vec<u8>> {
    let mut decoder = ZlibDecoder::new(data);
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
