//! Error types for dotkv
//!
//! Provides a unified error type for all store operations.
//! A missing key is never an error: typed getters fall back to zero values.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias using StoreError
pub type Result<T> = std::result::Result<T, StoreError>;

/// Unified error type for dotkv operations
#[derive(Debug, Error)]
pub enum StoreError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Key Errors
    // -------------------------------------------------------------------------
    #[error("Invalid key: {0:?}")]
    InvalidKey(String),

    // -------------------------------------------------------------------------
    // Typed Access Errors
    // -------------------------------------------------------------------------
    #[error("Cannot coerce {found} to {expected}")]
    Coercion {
        expected: &'static str,
        found: String,
    },

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: String,
    },

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Corruption detected: {0}")]
    Corruption(String),

    // -------------------------------------------------------------------------
    // Persistence Errors
    // -------------------------------------------------------------------------
    /// The in-memory model already holds the change; the file may be stale.
    #[error("Failed to write '{}': {source}", path.display())]
    WriteBack {
        path: PathBuf,
        #[source]
        source: Box<StoreError>,
    },

    /// The cached model was left untouched.
    #[error("Failed to reload '{}': {source}", path.display())]
    Reload {
        path: PathBuf,
        #[source]
        source: Box<StoreError>,
    },
}

impl From<bincode::Error> for StoreError {
    fn from(err: bincode::Error) -> Self {
        StoreError::Serialization(err.to_string())
    }
}
