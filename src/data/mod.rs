//! Data Module
//!
//! In-memory model of a store file.
//!
//! ## Responsibilities
//! - Resolve dotted paths (`a.b.c`) through nested layers
//! - Create intermediate layers on insert, never prune them on remove
//! - Enumerate keys across all layers or a single layer
//! - Hand the whole tree to a codec for serialization
//!
//! ## Layout
//! ```text
//! root ─┬─ "name"   → Str
//!       └─ "server" → Map ─┬─ "host"  → Str
//!                          └─ "ports" → List
//! ```
//! `server.host` walks `root["server"]["host"]`.

mod map;
mod tree;

pub use map::{DataMap, KeyOrder};
pub use tree::{join_path, validate_path, validate_value, FileData, SEPARATOR};
