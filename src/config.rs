//! Configuration for dotkv stores
//!
//! Centralized configuration with sensible defaults.

use std::sync::Arc;

use crate::codec::{BinaryCodec, Codec, LightningCodec};
use crate::data::KeyOrder;

/// Configuration for a single `FileStore`
#[derive(Debug, Clone)]
pub struct StoreConfig {
    // -------------------------------------------------------------------------
    // Consistency
    // -------------------------------------------------------------------------
    /// When reads (and mutations) re-read the backing file
    pub reload_policy: ReloadPolicy,

    // -------------------------------------------------------------------------
    // Format
    // -------------------------------------------------------------------------
    /// On-disk format of the backing file
    pub format: FileFormat,

    /// Settings handed to the codec and the write path
    pub format_settings: FormatSettings,

    // -------------------------------------------------------------------------
    // Model
    // -------------------------------------------------------------------------
    /// Key iteration order of the in-memory tree
    pub key_order: KeyOrder,

    /// Scope every key of the store under this dotted prefix
    pub path_prefix: Option<String>,
}

/// When the cached model is refreshed from disk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReloadPolicy {
    /// Re-read the file before every access (always fresh, costly)
    Always,

    /// Re-read only when the file's mtime or length changed since the last
    /// load or write
    #[default]
    OnChange,

    /// Trust the cache until `reload()` is called
    Manual,
}

/// Built-in on-disk formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileFormat {
    /// Human-editable text (`key = value`, `section { }`, `list [ ]`)
    #[default]
    Lightning,

    /// bincode payload framed with magic, version and CRC32
    Binary,
}

impl FileFormat {
    /// Codec implementing this format
    pub fn codec(self) -> Arc<dyn Codec> {
        match self {
            FileFormat::Lightning => Arc::new(LightningCodec),
            FileFormat::Binary => Arc::new(BinaryCodec),
        }
    }
}

/// Format-specific settings, passed through to the codec uninterpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FormatSettings {
    /// Spaces per nesting level (text formats)
    pub indent: usize,

    /// fsync the file after every write-back
    pub sync_on_write: bool,
}

impl Default for FormatSettings {
    fn default() -> Self {
        Self {
            indent: 4,
            sync_on_write: true,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            reload_policy: ReloadPolicy::default(),
            format: FileFormat::default(),
            format_settings: FormatSettings::default(),
            key_order: KeyOrder::default(),
            path_prefix: None,
        }
    }
}

impl StoreConfig {
    /// Create a new config builder
    pub fn builder() -> StoreConfigBuilder {
        StoreConfigBuilder::default()
    }
}

/// Builder for StoreConfig
#[derive(Default)]
pub struct StoreConfigBuilder {
    config: StoreConfig,
}

impl StoreConfigBuilder {
    /// Set the reload policy
    pub fn reload_policy(mut self, policy: ReloadPolicy) -> Self {
        self.config.reload_policy = policy;
        self
    }

    /// Set the on-disk format
    pub fn format(mut self, format: FileFormat) -> Self {
        self.config.format = format;
        self
    }

    /// Set the indentation width for text formats
    pub fn indent(mut self, indent: usize) -> Self {
        self.config.format_settings.indent = indent;
        self
    }

    /// Enable or disable fsync after each write-back
    pub fn sync_on_write(mut self, sync: bool) -> Self {
        self.config.format_settings.sync_on_write = sync;
        self
    }

    /// Set the key order of the in-memory tree
    pub fn key_order(mut self, order: KeyOrder) -> Self {
        self.config.key_order = order;
        self
    }

    /// Scope the store under a dotted prefix
    pub fn path_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.config.path_prefix = Some(prefix.into());
        self
    }

    pub fn build(self) -> StoreConfig {
        self.config
    }
}
