//! File listings of records and depositions
//!
//! Published records list their files in the record metadata, with checksums
//! prefixed by the digest algorithm. Depositions have a dedicated files
//! endpoint with bare md5 checksums. Every call fetches a fresh listing.

use std::collections::BTreeMap;

use serde::Deserialize;
use zs_core::{Error, ItemKind, Result, normalize_posix};

use crate::client::{ApiClient, ApiRequest};

const MD5_PREFIX: &str = "md5:";

/// Metadata of one remote file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileInfo {
    pub name: String,
    /// Hex md5 digest
    pub checksum: String,
    pub size: u64,
    pub download_url: String,
}

/// Files of one record or deposition, by name
///
/// Names are full relative paths. A file inside a directory can also be found
/// by its bare basename, as long as no other file claims that name first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileRegistry {
    files: BTreeMap<String, FileInfo>,
    /// basename -> full name, for nested files only
    aliases: BTreeMap<String, String>,
}

impl FileRegistry {
    pub fn get(&self, name: &str) -> Option<&FileInfo> {
        self.files.get(name).or_else(|| {
            self.aliases
                .get(name)
                .and_then(|full| self.files.get(full))
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileInfo> {
        self.files.values()
    }

    /// Every name a file can be looked up by, aliases included
    pub fn entries(&self) -> impl Iterator<Item = (&str, &FileInfo)> {
        let aliased = self
            .aliases
            .iter()
            .filter_map(|(alias, full)| Some((alias.as_str(), self.files.get(full)?)));
        self.files
            .iter()
            .map(|(name, info)| (name.as_str(), info))
            .chain(aliased)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl FromIterator<FileInfo> for FileRegistry {
    fn from_iter<I: IntoIterator<Item = FileInfo>>(iter: I) -> Self {
        let files: BTreeMap<String, FileInfo> =
            iter.into_iter().map(|f| (f.name.clone(), f)).collect();

        let mut aliases = BTreeMap::new();
        for name in files.keys() {
            if let Some((_, base)) = name.rsplit_once('/')
                && !files.contains_key(base)
            {
                aliases
                    .entry(base.to_string())
                    .or_insert_with(|| name.clone());
            }
        }

        Self { files, aliases }
    }
}

#[derive(Debug, Deserialize)]
struct RecordMetadata {
    files: Option<Vec<RecordFile>>,
}

#[derive(Debug, Deserialize)]
struct RecordFile {
    key: String,
    checksum: String,
    size: u64,
    links: RecordFileLinks,
}

#[derive(Debug, Deserialize)]
struct RecordFileLinks {
    #[serde(rename = "self")]
    self_link: String,
}

#[derive(Debug, Deserialize)]
struct DepositionFile {
    filename: String,
    checksum: String,
    filesize: u64,
    links: DepositionFileLinks,
}

#[derive(Debug, Deserialize)]
struct DepositionFileLinks {
    download: String,
}

/// Strip the `md5:` prefix, rejecting any other algorithm
fn md5_checksum(checksum: &str) -> Result<String> {
    checksum
        .strip_prefix(MD5_PREFIX)
        .map(str::to_string)
        .ok_or_else(|| Error::UnsupportedChecksum(checksum.to_string()))
}

fn record_registry(metadata: RecordMetadata, record_url: &str) -> Result<FileRegistry> {
    let files = metadata
        .files
        .ok_or_else(|| Error::NoFiles(record_url.to_string()))?;

    files
        .into_iter()
        .map(|f| {
            Ok(FileInfo {
                checksum: md5_checksum(&f.checksum)?,
                name: f.key,
                size: f.size,
                download_url: f.links.self_link,
            })
        })
        .collect()
}

fn deposition_registry(files: Vec<DepositionFile>) -> FileRegistry {
    files
        .into_iter()
        .map(|f| FileInfo {
            name: normalize_posix(&f.filename),
            checksum: f.checksum,
            size: f.filesize,
            download_url: f.links.download,
        })
        .collect()
}

/// Fetch the file listing of a record or deposition
pub async fn list_files(client: &ApiClient, kind: ItemKind, record_id: &str) -> Result<FileRegistry> {
    let registry = match kind {
        ItemKind::Record => {
            let url = client.endpoint(&format!("/api/records/{record_id}"));
            let metadata: RecordMetadata = client
                .send_json(ApiRequest::get(&url).restricted(record_id))
                .await?;
            let record_url = client.endpoint(&format!("/records/{record_id}"));
            record_registry(metadata, &record_url)?
        }
        ItemKind::Deposition => {
            let url = client.endpoint(&format!("/api/deposit/depositions/{record_id}/files"));
            let files: Vec<DepositionFile> = client
                .send_json(ApiRequest::get(&url).restricted(record_id))
                .await?;
            deposition_registry(files)
        }
    };

    tracing::debug!(%kind, record_id, files = registry.len(), "Listed files");
    Ok(registry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: serde_json::Value) -> Result<FileRegistry> {
        let metadata: RecordMetadata = serde_json::from_value(value).unwrap();
        record_registry(metadata, "https://zenodo.org/records/3269")
    }

    #[test]
    fn test_record_listing() {
        let registry = record(json!({
            "files": [
                {
                    "key": "data.csv",
                    "checksum": "md5:0123456789abcdef0123456789abcdef",
                    "size": 42,
                    "links": {"self": "https://zenodo.org/api/records/3269/files/data.csv/content"}
                }
            ]
        }))
        .unwrap();

        let info = registry.get("data.csv").unwrap();
        assert_eq!(info.checksum, "0123456789abcdef0123456789abcdef");
        assert_eq!(info.size, 42);
        assert!(info.download_url.ends_with("/files/data.csv/content"));
        assert!(!registry.contains("missing.csv"));
    }

    #[test]
    fn test_record_without_files() {
        let err = record(json!({"id": 3269})).unwrap_err();
        match err {
            Error::NoFiles(url) => assert_eq!(url, "https://zenodo.org/records/3269"),
            other => panic!("expected NoFiles, got {other:?}"),
        }
    }

    #[test]
    fn test_unsupported_checksum_fails_whole_registry() {
        let err = record(json!({
            "files": [
                {
                    "key": "ok.txt",
                    "checksum": "md5:aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa",
                    "size": 1,
                    "links": {"self": "https://zenodo.org/ok.txt"}
                },
                {
                    "key": "bad.txt",
                    "checksum": "sha256:bbbb",
                    "size": 1,
                    "links": {"self": "https://zenodo.org/bad.txt"}
                }
            ]
        }))
        .unwrap_err();

        assert!(matches!(err, Error::UnsupportedChecksum(ref c) if c == "sha256:bbbb"));
    }

    fn deposition(value: serde_json::Value) -> FileRegistry {
        deposition_registry(serde_json::from_value(value).unwrap())
    }

    #[test]
    fn test_deposition_listing_keeps_directories() {
        let registry = deposition(json!([
            {
                "filename": "results//summary.txt",
                "checksum": "c4ca4238a0b923820dcc509a6f75849b",
                "filesize": 1,
                "links": {"download": "https://zenodo.org/api/files/bucket/results/summary.txt"}
            }
        ]));

        assert_eq!(registry.len(), 1);
        let info = registry.get("results/summary.txt").unwrap();
        assert_eq!(info.name, "results/summary.txt");
        assert_eq!(info.checksum, "c4ca4238a0b923820dcc509a6f75849b");

        // Bare basename still resolves
        assert_eq!(registry.get("summary.txt"), Some(info));
        let names: Vec<&str> = registry.entries().map(|(name, _)| name).collect();
        assert_eq!(names, ["results/summary.txt", "summary.txt"]);
    }

    #[test]
    fn test_top_level_name_wins_over_basename() {
        let registry = deposition(json!([
            {
                "filename": "a/log.txt",
                "checksum": "11111111111111111111111111111111",
                "filesize": 1,
                "links": {"download": "https://zenodo.org/api/files/bucket/a/log.txt"}
            },
            {
                "filename": "log.txt",
                "checksum": "22222222222222222222222222222222",
                "filesize": 2,
                "links": {"download": "https://zenodo.org/api/files/bucket/log.txt"}
            }
        ]));

        assert_eq!(registry.get("log.txt").unwrap().size, 2);
        assert_eq!(registry.get("a/log.txt").unwrap().size, 1);
        assert_eq!(registry.entries().count(), 2);
        assert!(!registry.contains("a/b/log.txt"));
    }
}
