//! Content transfer
//!
//! Downloads are streamed to disk while the md5 digest is computed chunk by
//! chunk. A broken transfer or a digest mismatch deletes the partial file
//! before reporting.

use std::path::Path;

use reqwest::Response;
use tokio::io::AsyncWriteExt;
use zs_core::{Error, Result};

use crate::client::{ApiClient, ApiRequest};
use crate::registry::FileInfo;

/// Download `info` into `local_path`, returning the number of bytes written
///
/// The local file is removed again if the transfer breaks off or the digest
/// does not match.
pub async fn download(
    client: &ApiClient,
    info: &FileInfo,
    record_id: &str,
    local_path: &Path,
) -> Result<u64> {
    let response = client
        .send(ApiRequest::get(&info.download_url).restricted(record_id))
        .await?;

    if let Some(parent) = local_path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }

    let (written, actual) = match write_body(response, local_path).await {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(file = %info.name, error = %e, "Download interrupted");
            discard(local_path).await;
            return Err(e);
        }
    };

    if !actual.eq_ignore_ascii_case(&info.checksum) {
        tracing::warn!(
            file = %info.name,
            expected = %info.checksum,
            actual = %actual,
            "Checksum mismatch, discarding download"
        );
        discard(local_path).await;
        return Err(Error::ChecksumMismatch(info.name.clone()));
    }

    tracing::debug!(file = %info.name, bytes = written, "Downloaded");
    Ok(written)
}

/// Write the response body to disk, returning its length and hex md5
async fn write_body(mut response: Response, local_path: &Path) -> Result<(u64, String)> {
    let mut file = tokio::fs::File::create(local_path).await?;
    let mut digest = md5::Context::new();
    let mut written = 0u64;

    while let Some(chunk) = response
        .chunk()
        .await
        .map_err(|e| Error::Network(e.to_string()))?
    {
        digest.consume(&chunk);
        file.write_all(&chunk).await?;
        written += chunk.len() as u64;
    }
    file.flush().await?;

    Ok((written, format!("{:x}", digest.compute())))
}

async fn discard(local_path: &Path) {
    if let Err(e) = tokio::fs::remove_file(local_path).await {
        tracing::debug!(path = %local_path.display(), error = %e, "Failed to remove partial download");
    }
}

/// Stream the file at `local_path` to `{bucket}/{path}`
pub async fn upload(
    client: &ApiClient,
    bucket: &str,
    path: &str,
    record_id: &str,
    local_path: &Path,
) -> Result<u64> {
    let file = tokio::fs::File::open(local_path).await?;
    let size = file.metadata().await?.len();
    let url = format!("{}/{path}", bucket.trim_end_matches('/'));

    client
        .send(
            ApiRequest::put(&url, file)
                .content_length(size)
                .restricted(record_id),
        )
        .await?;

    tracing::debug!(url = %url, bytes = size, "Uploaded");
    Ok(size)
}
