//! Bulk export and import of the whole cache.
//!
//! The export document carries the five collections verbatim (as raw JSON
//! values, so a round-trip is byte-equivalent) plus an export timestamp.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::cache::LocalCache;
use crate::domain::Collection;
use crate::error::SyncError;

/// A full snapshot of the local cache, suitable for backup and transfer
/// between devices.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheExport {
    /// When the export was taken.
    pub exported_at: DateTime<Utc>,
    /// Events collection, verbatim.
    pub events: Value,
    /// Registrars collection, verbatim.
    pub registrars: Value,
    /// Members collection, verbatim.
    pub members: Value,
    /// Ledger entries collection, verbatim.
    pub moi_entries: Value,
    /// Settings document, verbatim.
    pub settings: Value,
}

/// Exports all five collections into a single timestamped document.
///
/// Absent collections export as empty arrays (empty object for settings).
///
/// # Errors
///
/// [`SyncError::Cache`] when the cache cannot be read.
pub fn export_all<C: LocalCache>(cache: &C) -> Result<CacheExport, SyncError> {
    let list = |collection: Collection| -> Result<Value, SyncError> {
        Ok(cache
            .read(collection.cache_key())?
            .unwrap_or_else(|| Value::Array(Vec::new())))
    };
    Ok(CacheExport {
        exported_at: Utc::now(),
        events: list(Collection::Events)?,
        registrars: list(Collection::Registrars)?,
        members: list(Collection::Members)?,
        moi_entries: list(Collection::MoiEntries)?,
        settings: cache
            .read(Collection::Settings.cache_key())?
            .unwrap_or_else(|| Value::Object(serde_json::Map::new())),
    })
}

/// Imports an export document, replacing all five collections.
///
/// # Errors
///
/// [`SyncError::Cache`] when a collection cannot be written; collections
/// written before the failure keep their imported contents.
pub fn import_all<C: LocalCache>(cache: &C, export: &CacheExport) -> Result<(), SyncError> {
    cache.write(Collection::Events.cache_key(), &export.events)?;
    cache.write(Collection::Registrars.cache_key(), &export.registrars)?;
    cache.write(Collection::Members.cache_key(), &export.members)?;
    cache.write(Collection::MoiEntries.cache_key(), &export.moi_entries)?;
    cache.write(Collection::Settings.cache_key(), &export.settings)?;
    Ok(())
}
