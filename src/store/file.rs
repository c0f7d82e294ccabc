//! File-backed store
//!
//! Coordinates the cached tree, the codec and the backing file.

use std::ffi::OsString;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufReader, BufWriter, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::SystemTime;

use parking_lot::{Mutex, RwLock, RwLockWriteGuard};

use crate::codec::Codec;
use crate::config::{ReloadPolicy, StoreConfig};
use crate::data::{join_path, validate_path, validate_value, FileData};
use crate::error::{Result, StoreError};
use crate::value::Value;

use super::{Section, StorageBase};

/// What the file looked like at the last load or write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct FileStamp {
    modified: Option<SystemTime>,
    len: u64,
}

impl FileStamp {
    fn of(path: &Path) -> Option<Self> {
        let metadata = fs::metadata(path).ok()?;
        Some(Self {
            modified: metadata.modified().ok(),
            len: metadata.len(),
        })
    }
}

/// A configuration store backed by a single file
///
/// ## Write Protocol
/// Every mutation updates the cached tree, serializes the *whole* tree to a
/// temporary sibling file and renames it over the target before returning.
/// If that write fails the cached tree keeps the change and the error is
/// returned: memory and disk may disagree until the next successful write
/// or `reload()`.
///
/// ## Concurrency Model
/// - **Mutations and reloads**: serialized by `write_lock`
///   - must acquire: write_lock → data (write) → downgrade to read → file
/// - **Reads**: take `data` for reading only
///   - a write-back holds a read guard while serializing, so readers never
///     wait on disk I/O and never see a half-applied change
pub struct FileStore {
    /// Backing file
    path: PathBuf,

    /// Store configuration
    config: StoreConfig,

    /// Serialization backend
    codec: Arc<dyn Codec>,

    /// Cached tree (replaced wholesale on reload)
    data: RwLock<FileData>,

    /// Serializes mutations and reloads
    write_lock: Mutex<()>,

    /// File state at the last load/write (drives `ReloadPolicy::OnChange`)
    stamp: Mutex<Option<FileStamp>>,

    /// Successful write-backs
    write_count: AtomicU64,

    /// Successful reloads (including the initial load)
    reload_count: AtomicU64,
}

impl FileStore {
    /// Open or create a store with the given config
    ///
    /// On open:
    /// 1. Create parent directories and an empty file if missing
    /// 2. Load the file into the cache
    pub fn open(path: impl Into<PathBuf>, config: StoreConfig) -> Result<Self> {
        let codec = config.format.codec();
        Self::open_inner(path.into(), config, codec, None)
    }

    /// Open with a path (convenience method)
    ///
    /// Uses default config
    pub fn open_path(path: impl Into<PathBuf>) -> Result<Self> {
        Self::open(path, StoreConfig::default())
    }

    /// Open or create a store, filling a newly created file from `seed`.
    ///
    /// The seed is ignored when the file already exists.
    pub fn open_seeded<R: Read>(
        path: impl Into<PathBuf>,
        config: StoreConfig,
        mut seed: R,
    ) -> Result<Self> {
        let codec = config.format.codec();
        Self::open_inner(path.into(), config, codec, Some(&mut seed))
    }

    /// Open or create a store with a custom codec (overrides `config.format`)
    pub fn with_codec(
        path: impl Into<PathBuf>,
        config: StoreConfig,
        codec: Arc<dyn Codec>,
    ) -> Result<Self> {
        Self::open_inner(path.into(), config, codec, None)
    }

    fn open_inner(
        path: PathBuf,
        config: StoreConfig,
        codec: Arc<dyn Codec>,
        seed: Option<&mut dyn Read>,
    ) -> Result<Self> {
        // Step 1: Create the file if it doesn't exist
        if !path.exists() {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }

            match seed {
                Some(seed) => Self::write_seed(&path, seed)?,
                None => {
                    File::create(&path)?;
                }
            }
        }

        let store = Self {
            data: RwLock::new(FileData::new(config.key_order)),
            path,
            config,
            codec,
            write_lock: Mutex::new(()),
            stamp: Mutex::new(None),
            write_count: AtomicU64::new(0),
            reload_count: AtomicU64::new(0),
        };

        // Step 2: Initial load
        store.reload()?;

        tracing::debug!(
            path = %store.path.display(),
            codec = store.codec.name(),
            policy = ?store.config.reload_policy,
            "opened store"
        );

        Ok(store)
    }

    /// Copy `seed` into a temporary sibling, then rename it into place.
    /// A failed copy leaves no store file behind.
    fn write_seed(path: &Path, seed: &mut dyn Read) -> Result<()> {
        let temp = temp_path_for(path);

        let copied = match copy_synced(seed, &temp) {
            Ok(copied) => copied,
            Err(e) => {
                remove_temp(&temp);
                return Err(e);
            }
        };

        fs::rename(&temp, path)?;
        tracing::debug!(path = %path.display(), bytes = copied, "seeded new store file");
        Ok(())
    }

    // =========================================================================
    // Reload
    // =========================================================================

    /// Re-read the file and replace the cached tree.
    ///
    /// If the file cannot be read or parsed, the previous tree stays cached
    /// and `StoreError::Reload` is returned.
    pub fn reload(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.reload_locked()
    }

    /// Reload with `write_lock` already held
    fn reload_locked(&self) -> Result<()> {
        let stamp = FileStamp::of(&self.path);

        let model = self.read_model().map_err(|e| StoreError::Reload {
            path: self.path.clone(),
            source: Box::new(e),
        })?;

        *self.data.write() = model;
        *self.stamp.lock() = stamp;
        self.reload_count.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(path = %self.path.display(), "reloaded store file");
        Ok(())
    }

    fn read_model(&self) -> Result<FileData> {
        let mut reader = BufReader::new(File::open(&self.path)?);
        let map = self.codec.read(&mut reader, &self.config.format_settings)?;
        Ok(FileData::from_map(map, self.config.key_order))
    }

    fn is_stale(&self) -> bool {
        FileStamp::of(&self.path) != *self.stamp.lock()
    }

    /// Apply the reload policy before a read
    fn refresh(&self) -> Result<()> {
        match self.config.reload_policy {
            ReloadPolicy::Manual => return Ok(()),
            ReloadPolicy::OnChange if !self.is_stale() => return Ok(()),
            _ => {}
        }

        let _write_guard = self.write_lock.lock();
        self.refresh_locked()
    }

    /// Apply the reload policy with `write_lock` already held
    fn refresh_locked(&self) -> Result<()> {
        match self.config.reload_policy {
            ReloadPolicy::Manual => Ok(()),
            ReloadPolicy::Always => self.reload_locked(),
            ReloadPolicy::OnChange => {
                if self.is_stale() {
                    self.reload_locked()
                } else {
                    Ok(())
                }
            }
        }
    }

    // =========================================================================
    // Write-back
    // =========================================================================

    /// Serialize the whole tree over the backing file (write_lock held)
    fn write_back(&self, data: &FileData) -> Result<()> {
        if let Err(e) = self.write_file(data) {
            tracing::error!(
                path = %self.path.display(),
                error = %e,
                "failed to write store file; in-memory data is ahead of disk"
            );
            return Err(StoreError::WriteBack {
                path: self.path.clone(),
                source: Box::new(e),
            });
        }

        *self.stamp.lock() = FileStamp::of(&self.path);
        self.write_count.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(path = %self.path.display(), entries = data.len(), "wrote store file");
        Ok(())
    }

    /// Write to a temporary sibling, then rename it over the target
    fn write_file(&self, data: &FileData) -> Result<()> {
        let temp = self.temp_path();

        if let Err(e) = self.write_temp(&temp, data) {
            remove_temp(&temp);
            return Err(e);
        }

        fs::rename(&temp, &self.path)?;
        Ok(())
    }

    fn write_temp(&self, temp: &Path, data: &FileData) -> Result<()> {
        let mut writer = BufWriter::new(File::create(temp)?);
        self.codec
            .write(&mut writer, data.as_map(), &self.config.format_settings)?;
        writer.flush()?;

        if self.config.format_settings.sync_on_write {
            writer.get_ref().sync_all()?;
        }
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        temp_path_for(&self.path)
    }

    // =========================================================================
    // Key Scoping
    // =========================================================================

    /// Apply the store's own prefix to `key`
    fn qualify(&self, key: &str) -> String {
        match &self.config.path_prefix {
            Some(prefix) => join_path(prefix, key),
            None => key.to_string(),
        }
    }

    /// Layer path for key-set queries: the store prefix, `key`, both or neither
    fn scope(&self, key: Option<&str>) -> Option<String> {
        match (self.config.path_prefix.as_deref(), key) {
            (Some(prefix), Some(key)) => Some(join_path(prefix, key)),
            (Some(prefix), None) => Some(prefix.to_string()),
            (None, Some(key)) => Some(key.to_string()),
            (None, None) => None,
        }
    }

    // =========================================================================
    // Maintenance
    // =========================================================================

    /// Remove every entry in scope with a single write-back
    pub fn clear(&self) -> Result<()> {
        let _write_guard = self.write_lock.lock();
        self.refresh_locked()?;

        let mut data = self.data.write();
        if !data.clear(self.config.path_prefix.as_deref()) {
            return Ok(());
        }

        let data = RwLockWriteGuard::downgrade(data);
        self.write_back(&data)
    }

    /// Change when the cache is refreshed from disk
    pub fn set_reload_policy(&mut self, policy: ReloadPolicy) {
        self.config.reload_policy = policy;
    }

    // =========================================================================
    // Accessors (for testing and debugging)
    // =========================================================================

    /// Get the backing file path
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Get the configuration
    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    pub fn reload_policy(&self) -> ReloadPolicy {
        self.config.reload_policy
    }

    /// Number of successful write-backs since open
    pub fn write_count(&self) -> u64 {
        self.write_count.load(Ordering::Relaxed)
    }

    /// Number of successful reloads since open (the initial load counts)
    pub fn reload_count(&self) -> u64 {
        self.reload_count.load(Ordering::Relaxed)
    }

    /// Owned snapshot of the cached tree, without applying the reload policy
    pub fn snapshot(&self) -> FileData {
        self.data.read().clone()
    }
}

/// `dir/.name.tmp` next to `path`
fn temp_path_for(path: &Path) -> PathBuf {
    let mut name = OsString::from(".");
    name.push(path.file_name().unwrap_or_default());
    name.push(".tmp");
    path.with_file_name(name)
}

fn copy_synced(seed: &mut dyn Read, temp: &Path) -> Result<u64> {
    let mut file = File::create(temp)?;
    let copied = io::copy(seed, &mut file)?;
    file.sync_all()?;
    Ok(copied)
}

fn remove_temp(temp: &Path) {
    if let Err(e) = fs::remove_file(temp) {
        if e.kind() != io::ErrorKind::NotFound {
            tracing::warn!(path = %temp.display(), error = %e, "could not remove temp file");
        }
    }
}

impl StorageBase for FileStore {
    fn get(&self, key: &str) -> Result<Option<Value>> {
        self.refresh()?;
        Ok(self.data.read().get(&self.qualify(key)).cloned())
    }

    fn has_key(&self, key: &str) -> Result<bool> {
        self.refresh()?;
        Ok(self.data.read().contains_key(&self.qualify(key)))
    }

    fn set<V: Into<Value>>(&self, key: &str, value: V) -> Result<()> {
        let key = self.qualify(key);

        let _write_guard = self.write_lock.lock();
        self.refresh_locked()?;

        let mut data = self.data.write();
        if !data.insert(&key, value)? {
            return Ok(());
        }

        let data = RwLockWriteGuard::downgrade(data);
        self.write_back(&data)
    }

    fn set_all<I, K, V>(&self, entries: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Value>,
    {
        // Validate up front so a bad key leaves the tree untouched
        let entries = entries
            .into_iter()
            .map(|(key, value)| -> Result<(String, Value)> {
                let key = self.qualify(key.as_ref());
                let value = value.into();
                validate_path(&key)?;
                validate_value(&key, &value)?;
                Ok((key, value))
            })
            .collect::<Result<Vec<_>>>()?;

        let _write_guard = self.write_lock.lock();
        self.refresh_locked()?;

        let mut data = self.data.write();
        let mut changed = false;
        for (key, value) in entries {
            changed |= data.insert(&key, value)?;
        }
        if !changed {
            return Ok(());
        }

        let data = RwLockWriteGuard::downgrade(data);
        self.write_back(&data)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let key = self.qualify(key);

        let _write_guard = self.write_lock.lock();
        self.refresh_locked()?;

        let mut data = self.data.write();
        if data.remove(&key).is_none() {
            return Ok(());
        }

        let data = RwLockWriteGuard::downgrade(data);
        self.write_back(&data)
    }

    fn remove_all<I, K>(&self, keys: I) -> Result<()>
    where
        I: IntoIterator<Item = K>,
        K: AsRef<str>,
    {
        let keys: Vec<String> = keys
            .into_iter()
            .map(|key| self.qualify(key.as_ref()))
            .collect();

        let _write_guard = self.write_lock.lock();
        self.refresh_locked()?;

        let mut data = self.data.write();
        let mut removed = false;
        for key in &keys {
            removed |= data.remove(key).is_some();
        }
        if !removed {
            return Ok(());
        }

        let data = RwLockWriteGuard::downgrade(data);
        self.write_back(&data)
    }

    fn key_set(&self) -> Result<Vec<String>> {
        self.refresh()?;
        Ok(self.data.read().key_set(self.scope(None).as_deref()))
    }

    fn key_set_under(&self, key: &str) -> Result<Vec<String>> {
        self.refresh()?;
        Ok(self.data.read().key_set(self.scope(Some(key)).as_deref()))
    }

    fn single_layer_key_set(&self) -> Result<Vec<String>> {
        self.refresh()?;
        Ok(self
            .data
            .read()
            .single_layer_key_set(self.scope(None).as_deref()))
    }

    fn single_layer_key_set_under(&self, key: &str) -> Result<Vec<String>> {
        self.refresh()?;
        Ok(self
            .data
            .read()
            .single_layer_key_set(self.scope(Some(key)).as_deref()))
    }

    fn get_section(&self, key: &str) -> Section<'_> {
        Section::new(self, key.to_string())
    }
}

impl fmt::Debug for FileStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FileStore")
            .field("path", &self.path)
            .field("codec", &self.codec.name())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}
