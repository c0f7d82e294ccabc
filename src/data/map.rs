//! Ordered mapping layer
//!
//! One level of the configuration tree. Entries live in a `Vec` kept either
//! in insertion order or sorted by key; configuration layers are small, so a
//! linear scan (or a binary search when sorted) beats hashing here and keeps
//! file order stable across a load/save cycle.

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::value::Value;

/// Iteration order of the keys inside every layer of a tree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeyOrder {
    /// Keys iterate in the order they were first inserted (file order after a load)
    #[default]
    Insertion,

    /// Keys iterate in lexical order
    Sorted,
}

/// A single mapping layer: segment name → value or nested layer
#[derive(Debug, Clone, Default)]
pub struct DataMap {
    order: KeyOrder,
    entries: Vec<(String, Value)>,
}

impl DataMap {
    /// Create an empty layer using insertion order
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty layer with the given key order
    pub fn with_order(order: KeyOrder) -> Self {
        Self {
            order,
            entries: Vec::new(),
        }
    }

    pub fn order(&self) -> KeyOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Index of `key`, or the index it would be inserted at
    fn position(&self, key: &str) -> std::result::Result<usize, usize> {
        match self.order {
            KeyOrder::Sorted => self
                .entries
                .binary_search_by(|(existing, _)| existing.as_str().cmp(key)),
            KeyOrder::Insertion => self
                .entries
                .iter()
                .position(|(existing, _)| existing == key)
                .ok_or(self.entries.len()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.position(key).ok().map(|idx| &self.entries[idx].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self.position(key) {
            Ok(idx) => Some(&mut self.entries[idx].1),
            Err(_) => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.position(key).is_ok()
    }

    /// Insert or overwrite a value, returning the previous one
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        match self.position(&key) {
            Ok(idx) => Some(std::mem::replace(&mut self.entries[idx].1, value)),
            Err(idx) => {
                self.entries.insert(idx, (key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.position(key)
            .ok()
            .map(|idx| self.entries.remove(idx).1)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Child layer under `key`, replacing a missing or non-map entry with an
    /// empty layer of the same order
    pub(crate) fn ensure_map(&mut self, key: &str) -> &mut DataMap {
        let order = self.order;
        let idx = match self.position(key) {
            Ok(idx) => {
                if !matches!(self.entries[idx].1, Value::Map(_)) {
                    self.entries[idx].1 = Value::Map(DataMap::with_order(order));
                }
                idx
            }
            Err(idx) => {
                self.entries
                    .insert(idx, (key.to_string(), Value::Map(DataMap::with_order(order))));
                idx
            }
        };

        match &mut self.entries[idx].1 {
            Value::Map(map) => map,
            _ => unreachable!("entry was just made a map"),
        }
    }

    /// Apply `order` to this layer and every nested layer
    pub fn reorder(&mut self, order: KeyOrder) {
        self.order = order;
        if order == KeyOrder::Sorted {
            self.entries.sort_by(|(a, _), (b, _)| a.cmp(b));
        }
        for (_, value) in &mut self.entries {
            if let Value::Map(child) = value {
                child.reorder(order);
            }
        }
    }

    pub fn keys(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(|(key, _)| key.as_str())
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.entries.iter().map(|(key, value)| (key.as_str(), value))
    }
}

/// Order-independent: two layers are equal when they hold the same keys
/// with equal values.
impl PartialEq for DataMap {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .iter()
                .all(|(key, value)| other.get(key) == Some(value))
    }
}

impl<K, V> FromIterator<(K, V)> for DataMap
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = DataMap::new();
        for (key, value) in iter {
            map.insert(key, value);
        }
        map
    }
}

impl IntoIterator for DataMap {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

// =============================================================================
// Serde
// =============================================================================

impl Serialize for DataMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

impl<'de> Deserialize<'de> for DataMap {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        struct DataMapVisitor;

        impl<'de> Visitor<'de> for DataMapVisitor {
            type Value = DataMap;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of string keys to values")
            }

            fn visit_map<A: MapAccess<'de>>(
                self,
                mut access: A,
            ) -> std::result::Result<DataMap, A::Error> {
                let mut map = DataMap::new();
                while let Some((key, value)) = access.next_entry::<String, crate::value::Value>()? {
                    map.insert(key, value);
                }
                Ok(map)
            }
        }

        deserializer.deserialize_map(DataMapVisitor)
    }
}
