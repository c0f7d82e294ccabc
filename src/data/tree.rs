//! Nested data model
//!
//! `FileData` is the in-memory tree behind a store file, addressed by
//! dot-separated paths.

use crate::error::{Result, StoreError};
use crate::value::Value;

use super::{DataMap, KeyOrder};

/// Path separator between segments
pub const SEPARATOR: char = '.';

/// Reject empty paths and paths with empty segments (`a..b`, `.a`, `a.`)
pub fn validate_path(path: &str) -> Result<()> {
    if path.split(SEPARATOR).any(str::is_empty) {
        return Err(StoreError::InvalidKey(path.to_string()));
    }
    Ok(())
}

/// Join a prefix and a key into one dotted path
pub fn join_path(prefix: &str, key: &str) -> String {
    format!("{}{}{}", prefix, SEPARATOR, key)
}

/// Reject nested map keys under `path` that could not be addressed by a
/// dotted path (empty, or containing the separator). Lists are searched too.
pub fn validate_value(path: &str, value: &Value) -> Result<()> {
    match value {
        Value::Map(map) => {
            for (key, child) in map.iter() {
                let child_path = join_path(path, key);
                if key.is_empty() || key.contains(SEPARATOR) {
                    return Err(StoreError::InvalidKey(child_path));
                }
                validate_value(&child_path, child)?;
            }
            Ok(())
        }
        Value::List(items) => items.iter().try_for_each(|item| validate_value(path, item)),
        _ => Ok(()),
    }
}

fn split_path(path: &str) -> Result<Vec<&str>> {
    validate_path(path)?;
    Ok(path.split(SEPARATOR).collect())
}

/// In-memory tree of a store file
///
/// ## Invariants
/// - Lookups through a non-map segment are misses, never errors
/// - Every layer shares the tree's `KeyOrder`
/// - Removing a key never prunes its (possibly now empty) ancestors
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FileData {
    root: DataMap,
}

impl FileData {
    /// Create an empty tree
    pub fn new(order: KeyOrder) -> Self {
        Self {
            root: DataMap::with_order(order),
        }
    }

    /// Wrap a decoded map, applying `order` to every layer
    pub fn from_map(mut map: DataMap, order: KeyOrder) -> Self {
        map.reorder(order);
        Self { root: map }
    }

    pub fn order(&self) -> KeyOrder {
        self.root.order()
    }

    // =========================================================================
    // Lookup
    // =========================================================================

    /// Value at `path`, or `None` if any segment is missing or not a map
    pub fn get(&self, path: &str) -> Option<&Value> {
        validate_path(path).ok()?;
        let mut segments = path.split(SEPARATOR);
        let mut current = self.root.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    fn get_mut(&mut self, path: &str) -> Option<&mut Value> {
        validate_path(path).ok()?;
        let mut segments = path.split(SEPARATOR);
        let mut current = self.root.get_mut(segments.next()?)?;
        for segment in segments {
            current = current.as_map_mut()?.get_mut(segment)?;
        }
        Some(current)
    }

    pub fn contains_key(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    /// The layer at `prefix` (root if `None`), if it exists and is a map
    fn layer(&self, prefix: Option<&str>) -> Option<&DataMap> {
        match prefix {
            None => Some(&self.root),
            Some(path) => self.get(path)?.as_map(),
        }
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Set `path` to `value`, creating intermediate layers as needed.
    ///
    /// Nested map keys inside `value` must be non-empty and free of the
    /// separator; otherwise nothing is changed.
    ///
    /// Returns `false` when the identical value was already stored, so the
    /// caller can skip writing the file back.
    pub fn insert(&mut self, path: &str, value: impl Into<Value>) -> Result<bool> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(StoreError::InvalidKey(path.to_string()));
        };

        let order = self.order();
        let mut value = value.into();
        validate_value(path, &value)?;
        if let Value::Map(map) = &mut value {
            map.reorder(order);
        }

        let mut layer = &mut self.root;
        for segment in parents {
            layer = layer.ensure_map(segment);
        }

        if layer.get(last) == Some(&value) {
            return Ok(false);
        }
        layer.insert(*last, value);
        Ok(true)
    }

    /// Remove the terminal segment of `path` from its parent layer
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        validate_path(path).ok()?;
        match path.rsplit_once(SEPARATOR) {
            None => self.root.remove(path),
            Some((parent, last)) => self.get_mut(parent)?.as_map_mut()?.remove(last),
        }
    }

    /// Empty the layer at `prefix` (root if `None`), keeping the layer itself.
    ///
    /// Returns whether anything was removed.
    pub fn clear(&mut self, prefix: Option<&str>) -> bool {
        let layer = match prefix {
            None => Some(&mut self.root),
            Some(path) => self.get_mut(path).and_then(Value::as_map_mut),
        };

        match layer {
            Some(map) if !map.is_empty() => {
                map.clear();
                true
            }
            _ => false,
        }
    }

    // =========================================================================
    // Key Sets
    // =========================================================================

    /// Dotted paths of every terminal entry under `prefix`, depth-first,
    /// relative to `prefix`. Empty if `prefix` is missing or not a map.
    pub fn key_set(&self, prefix: Option<&str>) -> Vec<String> {
        let mut keys = Vec::new();
        if let Some(layer) = self.layer(prefix) {
            collect_keys(layer, None, &mut keys);
        }
        keys
    }

    /// Immediate child names of the layer at `prefix`
    pub fn single_layer_key_set(&self, prefix: Option<&str>) -> Vec<String> {
        self.layer(prefix)
            .map(|layer| layer.keys().map(str::to_string).collect())
            .unwrap_or_default()
    }

    /// Number of terminal entries in the whole tree
    pub fn len(&self) -> usize {
        count_terminals(&self.root)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    // =========================================================================
    // Export
    // =========================================================================

    /// Borrow the root layer (codec handoff)
    pub fn as_map(&self) -> &DataMap {
        &self.root
    }

    /// Owned copy of the whole tree
    pub fn to_map(&self) -> DataMap {
        self.root.clone()
    }
}

fn collect_keys(layer: &DataMap, parent: Option<&str>, out: &mut Vec<String>) {
    for (key, value) in layer.iter() {
        let full = match parent {
            Some(parent) => join_path(parent, key),
            None => key.to_string(),
        };
        match value {
            Value::Map(child) => collect_keys(child, Some(&full), out),
            _ => out.push(full),
        }
    }
}

fn count_terminals(layer: &DataMap) -> usize {
    layer
        .iter()
        .map(|(_, value)| match value {
            Value::Map(child) => count_terminals(child),
            _ => 1,
        })
        .sum()
}
