//! Section views
//!
//! A `Section` is a live alias into a `FileStore`: it holds no data, only a
//! prefix that is prepended to every key before delegating.

use crate::data::join_path;
use crate::error::Result;
use crate::value::Value;

use super::{FileStore, StorageBase};

/// Prefix-scoped view over a store
#[derive(Debug, Clone)]
pub struct Section<'a> {
    store: &'a FileStore,
    prefix: String,
}

impl<'a> Section<'a> {
    pub(crate) fn new(store: &'a FileStore, prefix: String) -> Self {
        Self { store, prefix }
    }

    /// Dotted path of this section inside the store
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// The store this section delegates to
    pub fn store(&self) -> &'a FileStore {
        self.store
    }

    fn full_key(&self, key: &str) -> String {
        join_path(&self.prefix, key)
    }
}

impl StorageBase for Section<'_> {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.store.get(&self.full_key(key))
    }

    fn has_key(&self, key: &str) -> Result<bool> {
        self.store.has_key(&self.full_key(key))
    }

    fn set<V: Into<Value>>(&self, key: &str, value: V) -> Result<()> {
        self.store.set(&self.full_key(key), value)
    }

    fn set_all<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.store.set_all(
            entries
                .into_iter()
                .map(|(key, value)| (self.full_key(key.as_ref()), value)),
        )
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.store.remove(&self.full_key(key))
    }

    fn remove_all<I, K>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.store
            .remove_all(keys.into_iter().map(|key| self.full_key(key.as_ref())))
    }

    fn key_set(&self) -> Result<Vec<String>> {
        self.store.key_set_under(&self.prefix)
    }

    fn key_set_under(&self, key: &str) -> Result<Vec<String>> {
        self.store.key_set_under(&self.full_key(key))
    }

    fn single_layer_key_set(&self) -> Result<Vec<String>> {
        self.store.single_layer_key_set_under(&self.prefix)
    }

    fn single_layer_key_set_under(&self, key: &str) -> Result<Vec<String>> {
        self.store.single_layer_key_set_under(&self.full_key(key))
    }

    fn get_section(&self, key: &str) -> Section<'_> {
        Section::new(self.store, self.full_key(key))
    }
}
