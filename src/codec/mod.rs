//! Codec Module
//!
//! Converts a whole tree to and from its on-disk bytes.
//!
//! ## Responsibilities
//! - Decode a byte stream into a root `DataMap`
//! - Encode a root `DataMap` into a byte stream
//! - Report malformed input or unencodable state as errors
//!
//! Codecs never touch files directly: the store owns opening, temp files,
//! renames and fsync. An empty stream always decodes to an empty map.
//!
//! ## Built-in Formats
//! - `LightningCodec`: indented text, hand-editable
//! - `BinaryCodec`: bincode payload behind a checksummed header

mod binary;
mod lightning;

use std::io::{Read, Write};

use crate::config::FormatSettings;
use crate::data::DataMap;
use crate::error::Result;

pub use binary::{decode, encode, BinaryCodec, HEADER_SIZE, MAGIC, MAX_PAYLOAD_SIZE, VERSION};
pub use lightning::LightningCodec;

/// A serialization backend for store files
pub trait Codec: Send + Sync {
    /// Short format name for logs
    fn name(&self) -> &'static str;

    /// Decode a whole tree from `reader`
    fn read(&self, reader: &mut dyn Read, settings: &FormatSettings) -> Result<DataMap>;

    /// Encode the whole tree into `writer`
    fn write(&self, writer: &mut dyn Write, data: &DataMap, settings: &FormatSettings)
        -> Result<()>;
}
