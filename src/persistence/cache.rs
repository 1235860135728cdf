//! Local cache port and its file/memory backends.
//!
//! The cache is a namespaced key → JSON blob store. Every write replaces a
//! whole collection; there are no field-level local writes.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::domain::Collection;
use crate::error::SyncError;

/// Durable key → JSON blob persistence on the device.
///
/// Injected into the coordinator (dependency-injected persistence port);
/// [`JsonFileCache`] is the production backend, [`MemoryCache`] serves
/// tests and embedding.
pub trait LocalCache: Send + Sync {
    /// Reads the blob stored under `key`, if any.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when the underlying store fails.
    fn read(&self, key: &str) -> Result<Option<Value>, SyncError>;

    /// Replaces the blob stored under `key`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when the underlying store fails.
    fn write(&self, key: &str, value: &Value) -> Result<(), SyncError>;

    /// Returns `true` if any collection key holds data.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when the underlying store fails.
    fn has_stored_data(&self) -> Result<bool, SyncError> {
        for collection in Collection::ALL {
            if self.read(collection.cache_key())?.is_some() {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Reads a collection, defaulting to empty when the key is absent.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] on store failure or an undecodable blob.
    fn read_collection<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Vec<T>, SyncError>
    where
        Self: Sized,
    {
        match self.read(collection.cache_key())? {
            None => Ok(Vec::new()),
            Some(value) => serde_json::from_value(value).map_err(|e| {
                SyncError::Cache(format!("undecodable {collection} collection: {e}"))
            }),
        }
    }

    /// Replaces a collection wholesale.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] on store failure.
    fn write_collection<T: Serialize>(
        &self,
        collection: Collection,
        records: &[T],
    ) -> Result<(), SyncError>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(records)
            .map_err(|e| SyncError::Cache(format!("unencodable {collection} collection: {e}")))?;
        self.write(collection.cache_key(), &value)
    }

    /// Reads a single document (the settings key), if present.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] on store failure or an undecodable blob.
    fn read_document<T: DeserializeOwned>(
        &self,
        collection: Collection,
    ) -> Result<Option<T>, SyncError>
    where
        Self: Sized,
    {
        match self.read(collection.cache_key())? {
            None => Ok(None),
            Some(value) => serde_json::from_value(value)
                .map(Some)
                .map_err(|e| SyncError::Cache(format!("undecodable {collection} document: {e}"))),
        }
    }

    /// Replaces a single document.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] on store failure.
    fn write_document<T: Serialize>(
        &self,
        collection: Collection,
        document: &T,
    ) -> Result<(), SyncError>
    where
        Self: Sized,
    {
        let value = serde_json::to_value(document)
            .map_err(|e| SyncError::Cache(format!("unencodable {collection} document: {e}")))?;
        self.write(collection.cache_key(), &value)
    }
}

/// File-backed cache: one `<key>.json` file per collection under a
/// directory, written via temp-file-and-rename so a crash mid-write never
/// leaves a torn collection.
#[derive(Debug, Clone)]
pub struct JsonFileCache {
    dir: PathBuf,
}

impl JsonFileCache {
    /// Opens (creating if needed) a cache rooted at `dir`.
    ///
    /// # Errors
    ///
    /// [`SyncError::Cache`] when the directory cannot be created.
    pub fn open(dir: &Path) -> Result<Self, SyncError> {
        fs::create_dir_all(dir)
            .map_err(|e| SyncError::Cache(format!("create {}: {e}", dir.display())))?;
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl LocalCache for JsonFileCache {
    fn read(&self, key: &str) -> Result<Option<Value>, SyncError> {
        let path = self.path_for(key);
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(SyncError::Cache(format!("read {}: {e}", path.display()))),
        };
        serde_json::from_str(&raw)
            .map(Some)
            .map_err(|e| SyncError::Cache(format!("parse {}: {e}", path.display())))
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), SyncError> {
        let path = self.path_for(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        let raw = serde_json::to_string(value)
            .map_err(|e| SyncError::Cache(format!("encode {key}: {e}")))?;
        fs::write(&tmp, raw)
            .map_err(|e| SyncError::Cache(format!("write {}: {e}", tmp.display())))?;
        fs::rename(&tmp, &path)
            .map_err(|e| SyncError::Cache(format!("replace {}: {e}", path.display())))
    }
}

/// In-memory cache backend.
#[derive(Debug, Default)]
pub struct MemoryCache {
    blobs: RwLock<HashMap<String, Value>>,
}

impl MemoryCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl LocalCache for MemoryCache {
    fn read(&self, key: &str) -> Result<Option<Value>, SyncError> {
        let blobs = self
            .blobs
            .read()
            .map_err(|_| SyncError::Cache("cache lock poisoned".to_string()))?;
        Ok(blobs.get(key).cloned())
    }

    fn write(&self, key: &str, value: &Value) -> Result<(), SyncError> {
        let mut blobs = self
            .blobs
            .write()
            .map_err(|_| SyncError::Cache("cache lock poisoned".to_string()))?;
        blobs.insert(key.to_string(), value.clone());
        Ok(())
    }
}
