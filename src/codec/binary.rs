//! Binary codec
//!
//! Compact format for stores nobody edits by hand.
//!
//! ## File Format
//! ```text
//! ┌──────────┬──────────┬──────────┬──────────┬───────────────────────┐
//! │Magic (4) │Version(2)│ Len (4)  │ CRC (4)  │ bincode(root map)     │
//! └──────────┴──────────┴──────────┴──────────┴───────────────────────┘
//! ```
//! All integers are big-endian. The CRC32 covers the payload only.

use std::io::{Read, Write};

use crate::config::FormatSettings;
use crate::data::DataMap;
use crate::error::{Result, StoreError};

use super::Codec;

/// File magic
pub const MAGIC: [u8; 4] = *b"DKVB";

/// Current format version
pub const VERSION: u16 = 1;

/// Header size: magic (4) + version (2) + payload length (4) + CRC32 (4)
pub const HEADER_SIZE: usize = 14;

/// Maximum payload size (64 MB)
pub const MAX_PAYLOAD_SIZE: u32 = 64 * 1024 * 1024;

/// bincode + CRC32 framed codec
#[derive(Debug, Clone, Copy, Default)]
pub struct BinaryCodec;

impl Codec for BinaryCodec {
    fn name(&self) -> &'static str {
        "binary"
    }

    fn read(&self, reader: &mut dyn Read, _settings: &FormatSettings) -> Result<DataMap> {
        let mut bytes = Vec::new();
        reader.read_to_end(&mut bytes)?;

        if bytes.is_empty() {
            return Ok(DataMap::new());
        }
        decode(&bytes)
    }

    fn write(
        &self,
        writer: &mut dyn Write,
        data: &DataMap,
        _settings: &FormatSettings,
    ) -> Result<()> {
        writer.write_all(&encode(data)?)?;
        Ok(())
    }
}

/// Encode a tree to framed bytes
pub fn encode(data: &DataMap) -> Result<Vec<u8>> {
    let payload = bincode::serialize(data)?;

    if payload.len() > MAX_PAYLOAD_SIZE as usize {
        return Err(StoreError::Serialization(format!(
            "Payload too large: {} bytes (max {})",
            payload.len(),
            MAX_PAYLOAD_SIZE
        )));
    }

    let mut message = Vec::with_capacity(HEADER_SIZE + payload.len());
    message.extend_from_slice(&MAGIC);
    message.extend_from_slice(&VERSION.to_be_bytes());
    message.extend_from_slice(&(payload.len() as u32).to_be_bytes());
    message.extend_from_slice(&crc32fast::hash(&payload).to_be_bytes());
    message.extend_from_slice(&payload);

    Ok(message)
}

/// Decode framed bytes, validating magic, version, length and checksum
pub fn decode(bytes: &[u8]) -> Result<DataMap> {
    if bytes.len() < HEADER_SIZE {
        return Err(StoreError::Corruption(format!(
            "Incomplete header: expected {} bytes, got {}",
            HEADER_SIZE,
            bytes.len()
        )));
    }

    if bytes[0..4] != MAGIC {
        return Err(StoreError::Corruption(format!(
            "Bad magic: {:02x?}",
            &bytes[0..4]
        )));
    }

    let version = u16::from_be_bytes([bytes[4], bytes[5]]);
    if version != VERSION {
        return Err(StoreError::Corruption(format!(
            "Unsupported version: {} (expected {})",
            version, VERSION
        )));
    }

    let payload_len = u32::from_be_bytes([bytes[6], bytes[7], bytes[8], bytes[9]]);
    if payload_len > MAX_PAYLOAD_SIZE {
        return Err(StoreError::Corruption(format!(
            "Payload too large: {} bytes (max {})",
            payload_len, MAX_PAYLOAD_SIZE
        )));
    }

    let total_len = HEADER_SIZE + payload_len as usize;
    if bytes.len() != total_len {
        return Err(StoreError::Corruption(format!(
            "Length mismatch: header says {} bytes, file has {}",
            total_len,
            bytes.len()
        )));
    }

    let expected_crc = u32::from_be_bytes([bytes[10], bytes[11], bytes[12], bytes[13]]);
    let payload = &bytes[HEADER_SIZE..];
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(StoreError::Corruption(format!(
            "CRC mismatch: expected {:08x}, got {:08x}",
            expected_crc, actual_crc
        )));
    }

    Ok(bincode::deserialize(payload)?)
}
