//! Persistence layer: the local cache port and bulk export/import.
//!
//! Provides the [`LocalCache`] trait for durable on-device storage of the
//! five collections. The production backend is [`JsonFileCache`];
//! [`MemoryCache`] backs tests and embedded use.

pub mod cache;
pub mod export;

pub use cache::{JsonFileCache, LocalCache, MemoryCache};
pub use export::{CacheExport, export_all, import_all};
