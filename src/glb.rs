//! Binary glTF (GLB) containers
//!
//! GLB wraps a glTF asset in a 12-byte header followed by typed chunks:
//! a mandatory JSON descriptor chunk and an optional binary buffer
//! chunk. Chunk payloads are padded to 4-byte boundaries. The JSON goes
//! straight to `serde_json`; interpreting the scene graph is the
//! caller's business.

use byteorder::{LittleEndian, ReadBytesExt};
use log::debug;
use std::io::Cursor;

use crate::error::{Error, Result};

/// GLB magic, 'glTF' little-endian
pub const GLB_MAGIC: u32 = 0x4654_6C67;

/// Container version this reader understands
pub const GLB_VERSION: u32 = 2;

/// Chunk type of the JSON descriptor, 'JSON'
pub const CHUNK_JSON: u32 = 0x4E4F_534A;

/// Chunk type of the binary buffer, 'BIN\0'
pub const CHUNK_BIN: u32 = 0x004E_4942;

/// A split GLB asset
#[derive(Debug)]
pub struct GlbAsset {
    /// The parsed glTF descriptor
    pub json: serde_json::Value,
    /// The binary buffer chunk, when present
    pub bin: Option<Vec<u8>>,
}

impl GlbAsset {
    /// The `asset.version` string of the descriptor, when present
    pub fn asset_version(&self) -> Option<&str> {
        self.json.get("asset")?.get("version")?.as_str()
    }
}

/// Splits a GLB container into its JSON descriptor and binary buffer
pub fn parse(data: &[u8]) -> Result<GlbAsset> {
    let mut reader = Cursor::new(data);

    let magic = reader.read_u32::<LittleEndian>()?;
    if magic != GLB_MAGIC {
        return Err(Error::Format(format!("invalid GLB magic: {magic:#010x}")));
    }
    let version = reader.read_u32::<LittleEndian>()?;
    if version != GLB_VERSION {
        return Err(Error::UnsupportedFeature(format!("GLB version {version}")));
    }
    let declared_length = reader.read_u32::<LittleEndian>()? as usize;
    if declared_length > data.len() {
        return Err(Error::Format(format!(
            "GLB declares {declared_length} bytes but only {} are present",
            data.len()
        )));
    }

    let mut json = None;
    let mut bin = None;
    let mut position = 12usize;

    while position + 8 <= declared_length {
        let chunk_length = u32::from_le_bytes([
            data[position],
            data[position + 1],
            data[position + 2],
            data[position + 3],
        ]) as usize;
        let chunk_type = u32::from_le_bytes([
            data[position + 4],
            data[position + 5],
            data[position + 6],
            data[position + 7],
        ]);
        position += 8;

        let end = position
            .checked_add(chunk_length)
            .filter(|&end| end <= declared_length)
            .ok_or_else(|| {
                Error::Format(format!(
                    "GLB chunk at {position} of {chunk_length} bytes overruns the container"
                ))
            })?;
        let payload = &data[position..end];

        match chunk_type {
            CHUNK_JSON if json.is_none() => {
                json = Some(serde_json::from_slice(payload)?);
            }
            CHUNK_BIN if bin.is_none() => {
                bin = Some(payload.to_vec());
            }
            other => {
                // Unknown chunk types are skippable by specification.
                debug!("skipping GLB chunk of type {other:#010x}");
            }
        }

        // Chunks start on 4-byte boundaries.
        position = end + (4 - end % 4) % 4;
    }

    let json = json.ok_or_else(|| Error::Format("GLB has no JSON chunk".to_string()))?;
    Ok(GlbAsset { json, bin })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn glb_bytes(json: &str, bin: Option<&[u8]>) -> Vec<u8> {
        let mut json_payload = json.as_bytes().to_vec();
        while json_payload.len() % 4 != 0 {
            json_payload.push(b' ');
        }

        let mut chunks = Vec::new();
        chunks.extend_from_slice(&(json_payload.len() as u32).to_le_bytes());
        chunks.extend_from_slice(&CHUNK_JSON.to_le_bytes());
        chunks.extend_from_slice(&json_payload);

        if let Some(bin) = bin {
            let mut bin_payload = bin.to_vec();
            while bin_payload.len() % 4 != 0 {
                bin_payload.push(0);
            }
            chunks.extend_from_slice(&(bin_payload.len() as u32).to_le_bytes());
            chunks.extend_from_slice(&CHUNK_BIN.to_le_bytes());
            chunks.extend_from_slice(&bin_payload);
        }

        let mut data = Vec::new();
        data.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        data.extend_from_slice(&GLB_VERSION.to_le_bytes());
        data.extend_from_slice(&((12 + chunks.len()) as u32).to_le_bytes());
        data.extend_from_slice(&chunks);
        data
    }

    #[test]
    fn test_json_only() {
        let data = glb_bytes(r#"{"asset":{"version":"2.0"}}"#, None);
        let asset = parse(&data).unwrap();

        assert_eq!(asset.asset_version(), Some("2.0"));
        assert!(asset.bin.is_none());
    }

    #[test]
    fn test_json_and_bin() {
        let data = glb_bytes(
            r#"{"asset":{"version":"2.0"},"buffers":[{"byteLength":4}]}"#,
            Some(&[1, 2, 3, 4]),
        );
        let asset = parse(&data).unwrap();

        assert_eq!(asset.asset_version(), Some("2.0"));
        assert_eq!(asset.bin.as_deref(), Some(&[1u8, 2, 3, 4][..]));
    }

    #[test]
    fn test_bad_magic() {
        let mut data = glb_bytes(r#"{"asset":{"version":"2.0"}}"#, None);
        data[0] = b'x';
        assert!(matches!(parse(&data), Err(Error::Format(_))));
    }

    #[test]
    fn test_wrong_version() {
        let mut data = glb_bytes(r#"{"asset":{"version":"2.0"}}"#, None);
        data[4..8].copy_from_slice(&1u32.to_le_bytes());
        assert!(matches!(parse(&data), Err(Error::UnsupportedFeature(_))));
    }

    #[test]
    fn test_truncated_chunk() {
        let mut data = glb_bytes(r#"{"asset":{"version":"2.0"}}"#, None);
        // Inflate the first chunk length beyond the container.
        data[12..16].copy_from_slice(&0xFFFFu32.to_le_bytes());
        assert!(matches!(parse(&data), Err(Error::Format(_))));
    }

    #[test]
    fn test_missing_json_chunk() {
        let mut data = Vec::new();
        data.extend_from_slice(&GLB_MAGIC.to_le_bytes());
        data.extend_from_slice(&GLB_VERSION.to_le_bytes());
        data.extend_from_slice(&20u32.to_le_bytes());
        data.extend_from_slice(&4u32.to_le_bytes());
        data.extend_from_slice(&CHUNK_BIN.to_le_bytes());
        data.extend_from_slice(&[0u8; 4]);

        assert!(matches!(parse(&data), Err(Error::Format(_))));
    }

    #[test]
    fn test_malformed_json_rejected() {
        let data = glb_bytes(r#"{"asset":"#, None);
        assert!(matches!(parse(&data), Err(Error::Json(_))));
    }
}
