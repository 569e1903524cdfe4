//! Storage object bound to one Zenodo address

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::OnceCell;
use zs_core::{
    Address, Error, InventoryCache, InventoryEntry, ItemKind, MTIME_UNKNOWN, Result,
    StorageObject,
};

use crate::client::{ApiClient, ApiRequest};
use crate::registry::{FileInfo, FileRegistry, list_files};
use crate::transfer;

#[derive(Debug, Deserialize)]
struct DepositionMetadata {
    links: DepositionLinks,
}

#[derive(Debug, Deserialize)]
struct DepositionLinks {
    bucket: String,
}

/// A file inside a Zenodo record or deposition
#[derive(Debug)]
pub struct ZenodoObject {
    query: String,
    address: Address,
    client: Arc<ApiClient>,
    bucket: OnceCell<String>,
}

impl ZenodoObject {
    pub fn new(query: impl Into<String>, address: Address, client: Arc<ApiClient>) -> Self {
        Self {
            query: query.into(),
            address,
            client,
            bucket: OnceCell::new(),
        }
    }

    /// Fresh listing of the enclosing record or deposition
    pub async fn files(&self) -> Result<FileRegistry> {
        list_files(&self.client, self.address.kind, &self.address.record_id).await
    }

    /// Listing entry for this object
    pub async fn stats(&self) -> Result<FileInfo> {
        self.files()
            .await?
            .get(&self.address.path)
            .cloned()
            .ok_or_else(|| Error::NotFound(self.query.clone()))
    }

    /// Upload bucket of the deposition, resolved once
    pub async fn bucket(&self) -> Result<&str> {
        if self.address.kind != ItemKind::Deposition {
            return Err(Error::UnsupportedOperation(format!(
                "{} is a published record and cannot be written to",
                self.query
            )));
        }

        let bucket = self
            .bucket
            .get_or_try_init(|| async {
                let record_id = &self.address.record_id;
                let url = self
                    .client
                    .endpoint(&format!("/api/deposit/depositions/{record_id}"));
                let metadata: DepositionMetadata = self
                    .client
                    .send_json(ApiRequest::get(&url).restricted(record_id))
                    .await?;
                tracing::debug!(record_id = %record_id, bucket = %metadata.links.bucket, "Resolved bucket");
                Ok::<_, Error>(metadata.links.bucket)
            })
            .await?;
        Ok(bucket.as_str())
    }
}

#[async_trait]
impl StorageObject for ZenodoObject {
    fn query(&self) -> &str {
        &self.query
    }

    fn address(&self) -> &Address {
        &self.address
    }

    async fn inventory(&self, cache: &dyn InventoryCache) -> Result<()> {
        let parent = self.address.parent_cache_key();
        if cache.exists_in_storage(&parent).is_some() {
            return Ok(());
        }

        let files = match self.files().await {
            Ok(files) => files,
            Err(e) if e.is_not_found() => {
                tracing::debug!(key = %parent, "Record does not exist");
                cache.set_exists(&parent, false);
                return Ok(());
            }
            Err(e) => return Err(e),
        };

        cache.set_exists(&parent, true);
        for (name, file) in files.entries() {
            cache.set_entry(
                &self.address.file_cache_key(name),
                InventoryEntry::listed(file.size),
            );
        }
        Ok(())
    }

    async fn exists(&self) -> Result<bool> {
        match self.files().await {
            Ok(files) => Ok(files.contains(&self.address.path)),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    async fn mtime(&self) -> Result<f64> {
        // Zenodo exposes no modification times
        Ok(MTIME_UNKNOWN)
    }

    async fn size(&self) -> Result<u64> {
        Ok(self.stats().await?.size)
    }

    async fn retrieve(&self, local_path: &Path) -> Result<()> {
        let info = self.stats().await?;
        transfer::download(&self.client, &info, &self.address.record_id, local_path).await?;
        Ok(())
    }

    async fn store(&self, local_path: &Path) -> Result<()> {
        let bucket = self.bucket().await?;
        transfer::upload(
            &self.client,
            bucket,
            &self.address.path,
            &self.address.record_id,
            local_path,
        )
        .await?;
        Ok(())
    }

    async fn remove(&self) -> Result<()> {
        Err(Error::UnsupportedOperation(
            "Zenodo does not support removing files from a record".into(),
        ))
    }
}
