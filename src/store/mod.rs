//! Store Module
//!
//! The public accessor contract and its two implementations.
//!
//! ## Components
//! - `StorageBase`: typed getters, setters, bulk operations, key sets
//! - `FileStore`: owns the file, the cached tree and the write-back protocol
//! - `Section`: a prefix-scoped live view over a `FileStore`
//!
//! ## Missing Keys
//! A missing key is falsy, not exceptional: scalar getters return the
//! type's zero value and container getters return an empty container. Once
//! a value *is* present, a failed conversion is an error.

mod file;
mod section;

use crate::data::{join_path, DataMap};
use crate::error::Result;
use crate::value::{list_of, FromValue, Value};

pub use file::FileStore;
pub use section::Section;

/// Accessor contract shared by stores and sections
pub trait StorageBase {
    // =========================================================================
    // Required
    // =========================================================================

    /// Raw value at `key`, applying the reload policy first
    fn get(&self, key: &str) -> Result<Option<Value>>;

    /// Whether `key` holds a value
    fn has_key(&self, key: &str) -> Result<bool>;

    /// Set `key` and write the file back if anything changed
    fn set<V: Into<Value>>(&self, key: &str, value: V) -> Result<()>;

    /// Set every entry, then write the file back once
    fn set_all<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>;

    /// Remove `key` and write the file back if it existed
    fn remove(&self, key: &str) -> Result<()>;

    /// Remove every key, then write the file back once
    fn remove_all<I, K>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>;

    /// Dotted paths of all terminal entries (format: `key.subkey`)
    fn key_set(&self) -> Result<Vec<String>>;

    /// Dotted paths of all terminal entries below `key`, relative to it.
    /// Empty if `key` does not exist or is not a section.
    fn key_set_under(&self, key: &str) -> Result<Vec<String>>;

    /// Names of the top layer
    fn single_layer_key_set(&self) -> Result<Vec<String>>;

    /// Names of the layer at `key`; empty if it does not exist
    fn single_layer_key_set_under(&self, key: &str) -> Result<Vec<String>>;

    /// A view scoped to `key`
    fn get_section(&self, key: &str) -> Section<'_>;

    // =========================================================================
    // Typed Getters
    // =========================================================================

    /// Read `key` as `T`, or `T::default()` if it is missing
    fn get_as<T: FromValue + Default>(&self, key: &str) -> Result<T> {
        match self.get(key)? {
            Some(value) => T::from_value(&value),
            None => Ok(T::default()),
        }
    }

    fn get_boolean(&self, key: &str) -> Result<bool> {
        self.get_as(key)
    }

    fn get_byte(&self, key: &str) -> Result<i8> {
        self.get_as(key)
    }

    fn get_short(&self, key: &str) -> Result<i16> {
        self.get_as(key)
    }

    fn get_int(&self, key: &str) -> Result<i32> {
        self.get_as(key)
    }

    fn get_long(&self, key: &str) -> Result<i64> {
        self.get_as(key)
    }

    fn get_float(&self, key: &str) -> Result<f32> {
        self.get_as(key)
    }

    fn get_double(&self, key: &str) -> Result<f64> {
        self.get_as(key)
    }

    /// Strings are returned as stored; other values use their display form
    fn get_string(&self, key: &str) -> Result<String> {
        self.get_as(key)
    }

    // =========================================================================
    // Container Getters (no coercion)
    // =========================================================================

    fn get_list(&self, key: &str) -> Result<Vec<Value>> {
        self.get_as(key)
    }

    fn get_map(&self, key: &str) -> Result<DataMap> {
        self.get_as(key)
    }

    fn get_string_list(&self, key: &str) -> Result<Vec<String>> {
        get_list_with(self, key, "string list", |item| match item {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        })
    }

    fn get_int_list(&self, key: &str) -> Result<Vec<i32>> {
        get_list_with(self, key, "int list", |item| match item {
            Value::Int(i) => i32::try_from(*i).ok(),
            _ => None,
        })
    }

    fn get_long_list(&self, key: &str) -> Result<Vec<i64>> {
        get_list_with(self, key, "long list", |item| match item {
            Value::Int(i) => Some(*i),
            _ => None,
        })
    }

    fn get_byte_list(&self, key: &str) -> Result<Vec<i8>> {
        get_list_with(self, key, "byte list", |item| match item {
            Value::Int(i) => i8::try_from(*i).ok(),
            _ => None,
        })
    }

    // =========================================================================
    // Defaults & Convenience
    // =========================================================================

    /// Store `default` if `key` is missing and return it; otherwise return
    /// the stored value converted toward `T` (e.g. `"5"` read as `5`).
    fn get_or_set_default<T>(&self, key: &str, default: T) -> Result<T>
    where
        T: FromValue + Into<Value> + Clone,
    {
        match self.get(key)? {
            Some(value) => T::from_value(&value),
            None => {
                self.set(key, default.clone())?;
                Ok(default)
            }
        }
    }

    /// Set `key` only if it is missing
    fn set_default<V: Into<Value>>(&self, key: &str, value: V) -> Result<()> {
        if !self.has_key(key)? {
            self.set(key, value)?;
        }
        Ok(())
    }

    /// `Some` sets, `None` removes
    fn set_or_remove<V: Into<Value>>(&self, key: &str, value: Option<V>) -> Result<()> {
        match value {
            Some(value) => self.set(key, value),
            None => self.remove(key),
        }
    }

    /// `set_all` with every entry key placed under `key`
    fn set_all_under<I, K, V>(&self, key: &str, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        self.set_all(
            entries
                .into_iter()
                .map(|(k, v)| (join_path(key, k.as_ref()), v)),
        )
    }

    /// `remove_all` with every key placed under `key`
    fn remove_all_under<I, K>(&self, key: &str, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        self.remove_all(keys.into_iter().map(|k| join_path(key, k.as_ref())))
    }
}

/// Missing key ⇒ empty list; present ⇒ element-wise cast
fn get_list_with<S, T>(
    store: &S,
    key: &str,
    expected: &'static str,
    cast: impl Fn(&Value) -> Option<T>,
) -> Result<Vec<T>>
where
    S: StorageBase + ?Sized,
{
    match store.get(key)? {
        Some(value) => list_of(&value, expected, cast),
        None => Ok(Vec::new()),
    }
}
