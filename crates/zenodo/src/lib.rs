//! zs-zenodo: Zenodo backend for zs
//!
//! Implements the `StorageProvider` and `StorageObject` traits from zs-core on
//! top of the Zenodo REST API.

pub mod client;
pub mod object;
pub mod provider;
pub mod registry;
pub mod session;
pub mod transfer;

pub use client::{ApiClient, ApiRequest};
pub use object::ZenodoObject;
pub use provider::ZenodoProvider;
pub use registry::{FileInfo, FileRegistry, list_files};
pub use session::Session;
