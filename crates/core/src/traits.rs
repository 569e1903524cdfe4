//! Storage abstraction used by hosts
//!
//! A [`StorageProvider`] turns query strings into [`StorageObject`]s. Objects
//! expose the fallible operations a host wraps with its own retry policy.
//! The host's shared inventory cache is passed in as an [`InventoryCache`].

use std::collections::HashMap;
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Serialize;

use crate::error::Result;
use crate::query::{Address, QueryValidation};

/// Modification time reported when the backend has none
pub const MTIME_UNKNOWN: f64 = 0.0;

/// Whether an example query is meant for reading, writing or both
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryType {
    Input,
    Output,
    Any,
}

/// Example query advertised by a provider
#[derive(Debug, Clone, Serialize)]
pub struct ExampleQuery {
    pub query: String,
    #[serde(rename = "type")]
    pub query_type: QueryType,
    pub description: String,
}

/// Existence, mtime and size of one object as known to the host
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct InventoryEntry {
    pub exists: bool,
    pub mtime: f64,
    pub size: u64,
}

impl InventoryEntry {
    /// Entry for a listed file; mtime is always unknown
    pub fn listed(size: u64) -> Self {
        Self {
            exists: true,
            mtime: MTIME_UNKNOWN,
            size,
        }
    }
}

/// Host-owned cache filled by [`StorageObject::inventory`]
pub trait InventoryCache: Send + Sync {
    /// Known existence of `key`, `None` when never inventoried
    fn exists_in_storage(&self, key: &str) -> Option<bool>;

    /// Record existence of a container such as a whole record
    fn set_exists(&self, key: &str, exists: bool);

    /// Record everything known about one object
    fn set_entry(&self, key: &str, entry: InventoryEntry);
}

/// In-process [`InventoryCache`]
#[derive(Debug, Default)]
pub struct MemoryInventory {
    exists: RwLock<HashMap<String, bool>>,
    entries: RwLock<HashMap<String, InventoryEntry>>,
}

impl MemoryInventory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entry(&self, key: &str) -> Option<InventoryEntry> {
        self.entries.read().get(key).copied()
    }

    /// Number of object entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }
}

impl InventoryCache for MemoryInventory {
    fn exists_in_storage(&self, key: &str) -> Option<bool> {
        self.exists.read().get(key).copied()
    }

    fn set_exists(&self, key: &str, exists: bool) {
        self.exists.write().insert(key.to_string(), exists);
    }

    fn set_entry(&self, key: &str, entry: InventoryEntry) {
        self.exists.write().insert(key.to_string(), entry.exists);
        self.entries.write().insert(key.to_string(), entry);
    }
}

/// One addressable object in remote storage
#[async_trait]
pub trait StorageObject: Send + Sync {
    /// Query this object was built from
    fn query(&self) -> &str;

    /// Resolved address
    fn address(&self) -> &Address;

    /// Unique suffix for the host's local copy
    fn local_suffix(&self) -> String {
        self.address().local_suffix()
    }

    /// Fill `cache` with everything one listing call reveals
    async fn inventory(&self, cache: &dyn InventoryCache) -> Result<()>;

    /// Whether the object is present remotely
    async fn exists(&self) -> Result<bool>;

    /// Modification time; [`MTIME_UNKNOWN`] if the backend has none
    async fn mtime(&self) -> Result<f64>;

    /// Size in bytes
    async fn size(&self) -> Result<u64>;

    /// Download the object to `local_path`
    async fn retrieve(&self, local_path: &Path) -> Result<()>;

    /// Upload the file at `local_path`
    async fn store(&self, local_path: &Path) -> Result<()>;

    /// Delete the object
    async fn remove(&self) -> Result<()>;
}

/// Factory for storage objects of one backend
pub trait StorageProvider: Send + Sync {
    type Object: StorageObject;

    /// Validate a query without building anything
    fn is_valid_query(&self, query: &str) -> QueryValidation;

    /// Build the object for a query
    fn object(&self, query: &str) -> Result<Self::Object>;

    fn example_queries(&self) -> Vec<ExampleQuery>;

    /// Key that groups requests under one rate limiter
    fn rate_limiter_key(&self) -> String;

    fn default_max_requests_per_second(&self) -> f64;

    fn use_rate_limiter(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_inventory_roundtrip() {
        let cache = MemoryInventory::new();
        assert!(cache.is_empty());
        assert_eq!(cache.exists_in_storage("zenodo://record/1"), None);

        cache.set_exists("zenodo://record/1", false);
        assert_eq!(cache.exists_in_storage("zenodo://record/1"), Some(false));

        cache.set_entry("zenodo://record/2/a.txt", InventoryEntry::listed(12));
        assert_eq!(cache.exists_in_storage("zenodo://record/2/a.txt"), Some(true));
        let entry = cache.entry("zenodo://record/2/a.txt").unwrap();
        assert_eq!(entry.size, 12);
        assert_eq!(entry.mtime, MTIME_UNKNOWN);
        assert_eq!(cache.len(), 1);
    }
}
