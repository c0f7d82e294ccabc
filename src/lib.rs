//! # dotkv
//!
//! A file-backed hierarchical key-value configuration store with:
//! - Dotted path keys (`server.http.port`) over nested sections
//! - Typed accessors with "missing means zero value" semantics
//! - Write-through persistence (every change rewrites the file)
//! - Configurable reload-on-access (always, on change, manual)
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              StorageBase (typed accessor contract)           │
//! └──────────────┬───────────────────────────────┬──────────────┘
//!                │                               │
//!         ┌──────▼──────┐   prefix + "."  ┌──────┴──────┐
//!         │  FileStore  │◄────────────────│   Section   │
//!         │ (locks)     │                 │ (live view) │
//!         └──────┬──────┘                 └─────────────┘
//!                │
//!       ┌────────┴─────────┐
//!       ▼                  ▼
//! ┌─────────────┐   ┌─────────────┐
//! │  FileData   │   │    Codec    │──► file on disk
//! │ (tree)      │──►│ (text/bin)  │
//! └─────────────┘   └─────────────┘
//! ```
//!
//! ## Example
//!
//! ```no_run
//! use dotkv::{FileStore, StorageBase};
//!
//! # fn main() -> dotkv::Result<()> {
//! let store = FileStore::open_path("settings.ls")?;
//! store.set("server.port", 8080)?;
//! assert_eq!(store.get_int("server.port")?, 8080);
//! assert_eq!(store.get_section("server").get_int("port")?, 8080);
//! # Ok(())
//! # }
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod config;

pub mod value;
pub mod data;
pub mod codec;
pub mod store;

// =============================================================================
// Public API Re-exports
// =============================================================================

pub use codec::Codec;
pub use config::{FileFormat, FormatSettings, ReloadPolicy, StoreConfig};
pub use data::{DataMap, FileData, KeyOrder};
pub use error::{Result, StoreError};
pub use store::{FileStore, Section, StorageBase};
pub use value::{FromValue, Value};

// =============================================================================
// Version Info
// =============================================================================

/// Current version of dotkv
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
