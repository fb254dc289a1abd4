//! BLP2 texture containers
//!
//! BLP2 is the texture wrapper used inside these archives: a fixed
//! 148-byte header followed by up to sixteen mip level payloads located
//! by parallel offset and size vectors. Only the DXT1 pixel encoding is
//! decoded, and only the base mip level.

use byteorder::{LittleEndian, ReadBytesExt};
use image::RgbaImage;
use log::debug;
use std::io::Cursor;

use crate::dxt1;
use crate::error::{Error, Result};

/// BLP2 magic at the start of the file
pub const BLP2_MAGIC: [u8; 4] = *b"BLP2";

/// Size of the fixed header including the mip locator vectors
pub const BLP2_HEADER_SIZE: usize = 148;

/// Color encoding tag of block-compressed (DXTn) payloads
pub const ENCODING_DXT: u8 = 2;

/// Preferred format tag selecting DXT1 within the DXT encoding
pub const FORMAT_DXT1: u8 = 0;

/// The fixed BLP2 header
#[derive(Debug, Clone)]
pub struct BlpHeader {
    /// Format revision; 1 for every BLP2 in the wild
    pub version: u32,
    /// Pixel encoding family (1 palettised, 2 block-compressed, 3 raw)
    pub color_encoding: u8,
    /// Bits of alpha carried per pixel (0, 1, 4 or 8)
    pub alpha_depth: u8,
    /// Encoding-specific format selector; 0 is DXT1 under DXT
    pub preferred_format: u8,
    /// Mip presence flag
    pub mip_level_and_flag: u8,
    /// Texture width in pixels
    pub width: u32,
    /// Texture height in pixels
    pub height: u32,
    /// Absolute byte offsets of each mip level payload
    pub mip_offsets: [u32; 16],
    /// Byte sizes of each mip level payload
    pub mip_sizes: [u32; 16],
}

impl BlpHeader {
    /// Parses the header from the start of a BLP2 file
    pub fn read(data: &[u8]) -> Result<Self> {
        if data.len() < BLP2_HEADER_SIZE {
            return Err(Error::Format(format!(
                "BLP2 file of {} bytes is shorter than its {BLP2_HEADER_SIZE} byte header",
                data.len()
            )));
        }
        if data[0..4] != BLP2_MAGIC {
            return Err(Error::Format("missing BLP2 magic".to_string()));
        }

        let mut reader = Cursor::new(&data[4..]);
        let version = reader.read_u32::<LittleEndian>()?;
        let color_encoding = reader.read_u8()?;
        let alpha_depth = reader.read_u8()?;
        let preferred_format = reader.read_u8()?;
        let mip_level_and_flag = reader.read_u8()?;
        let width = reader.read_u32::<LittleEndian>()?;
        let height = reader.read_u32::<LittleEndian>()?;

        let mut mip_offsets = [0u32; 16];
        for offset in &mut mip_offsets {
            *offset = reader.read_u32::<LittleEndian>()?;
        }
        let mut mip_sizes = [0u32; 16];
        for size in &mut mip_sizes {
            *size = reader.read_u32::<LittleEndian>()?;
        }

        Ok(Self {
            version,
            color_encoding,
            alpha_depth,
            preferred_format,
            mip_level_and_flag,
            width,
            height,
            mip_offsets,
            mip_sizes,
        })
    }

    /// Returns true if the payload is DXT1-encoded
    pub fn is_dxt1(&self) -> bool {
        self.color_encoding == ENCODING_DXT && self.preferred_format == FORMAT_DXT1
    }
}

/// Decodes the base mip level of a DXT1 BLP2 texture
pub fn decode_dxt1_texture(data: &[u8]) -> Result<RgbaImage> {
    let header = BlpHeader::read(data)?;

    if !header.is_dxt1() {
        return Err(Error::UnsupportedFeature(format!(
            "BLP2 color encoding {} / format {} (only DXT1 is decoded)",
            header.color_encoding, header.preferred_format
        )));
    }
    if header.alpha_depth > 1 {
        return Err(Error::UnsupportedFeature(format!(
            "DXT1 with {}-bit alpha",
            header.alpha_depth
        )));
    }

    let offset = header.mip_offsets[0] as usize;
    let size = header.mip_sizes[0] as usize;
    let end = offset
        .checked_add(size)
        .filter(|&end| end <= data.len())
        .ok_or_else(|| {
            Error::Format(format!(
                "mip 0 at {offset}+{size} runs past the {} byte file",
                data.len()
            ))
        })?;

    debug!(
        "decoding {}x{} DXT1 texture, mip 0 of {size} bytes",
        header.width, header.height
    );
    dxt1::decode(&data[offset..end], header.width, header.height)
}
