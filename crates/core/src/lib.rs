//! zs-core: Core library for the zs Zenodo storage adapter
//!
//! This crate provides the backend-independent pieces:
//! - Query validation and address resolution
//! - The error taxonomy shared by every backend
//! - StorageProvider / StorageObject traits and the inventory cache contract
//! - Settings and configuration file loading
//! - A retry helper for hosts wrapping fallible calls

pub mod config;
pub mod error;
pub mod query;
pub mod retry;
pub mod traits;

pub use config::{ConfigManager, RetryConfig, Settings};
pub use error::{Error, Result};
pub use query::{Address, ItemKind, QueryValidation, SCHEME, normalize_posix, validate_query};
pub use retry::{RetryBuilder, is_retryable_error, retry_with_backoff};
pub use traits::{
    ExampleQuery, InventoryCache, InventoryEntry, MTIME_UNKNOWN, MemoryInventory, QueryType,
    StorageObject, StorageProvider,
};
