//! Local filesystem object store
//!
//! Each bucket is a directory under the root and each key a relative path
//! inside it. Useful for running the handler against a directory of PDFs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use walkdir::WalkDir;

use super::object_store::{ObjectStore, ObjectStoreConnector};
use crate::error::{Error, Result};
use crate::types::ObjectInfo;

/// Local object store using the filesystem
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    /// Create a new local object store rooted at `root`
    pub fn new(root: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Resolve a key to a path, rejecting keys that escape the bucket
    fn object_path(&self, bucket: &str, key: &str) -> Result<PathBuf> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)));
        if bucket.is_empty() || bucket.contains(['/', '\\']) || key.is_empty() || escapes {
            return Err(Error::InvalidInput(format!(
                "Invalid object location: {}/{}",
                bucket, key
            )));
        }
        Ok(self.root.join(bucket).join(relative))
    }
}

#[async_trait]
impl ObjectStore for LocalObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let bucket_dir = self.root.join(bucket);
        let prefix = prefix.to_string();

        tokio::task::spawn_blocking(move || -> Result<Vec<ObjectInfo>> {
            let mut objects = Vec::new();
            if !bucket_dir.exists() {
                return Ok(objects);
            }

            for entry in WalkDir::new(&bucket_dir).into_iter().filter_map(|e| e.ok()) {
                if !entry.file_type().is_file() {
                    continue;
                }
                let Ok(relative) = entry.path().strip_prefix(&bucket_dir) else {
                    continue;
                };
                let key = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy())
                    .collect::<Vec<_>>()
                    .join("/");
                if !key.starts_with(&prefix) {
                    continue;
                }

                let metadata = entry.metadata().map_err(|e| {
                    Error::transport("listing", key.clone(), e)
                })?;
                let last_modified: DateTime<Utc> = metadata.modified()?.into();

                objects.push(ObjectInfo {
                    key,
                    last_modified,
                    size: metadata.len(),
                });
            }

            Ok(objects)
        })
        .await
        .map_err(|e| Error::Internal(format!("Task join error: {}", e)))?
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let path = self.object_path(bucket, key)?;
        tokio::fs::read(&path)
            .await
            .map_err(|e| Error::transport("downloading", key, e))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        _content_type: &str,
    ) -> Result<()> {
        let path = self.object_path(bucket, key)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|e| Error::transport("uploading", key, e))?;
        }
        tokio::fs::write(&path, body)
            .await
            .map_err(|e| Error::transport("uploading", key, e))
    }
}

/// Connector for the local backend
pub struct LocalConnector {
    pub root: PathBuf,
}

#[async_trait]
impl ObjectStoreConnector for LocalConnector {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>> {
        Ok(Arc::new(LocalObjectStore::new(self.root.clone())?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_roundtrip_and_listing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf()).unwrap();

        store
            .put_object("tickets", "PDF_TEST/a.pdf", b"%PDF-1.4".to_vec(), "application/pdf")
            .await
            .unwrap();
        store
            .put_object("tickets", "PDF_OCR/OCR_a.txt", b"text".to_vec(), "text/plain")
            .await
            .unwrap();

        let listed = store.list_objects("tickets", "PDF_TEST/").await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].key, "PDF_TEST/a.pdf");
        assert_eq!(listed[0].size, 8);

        let body = store.get_object("tickets", "PDF_OCR/OCR_a.txt").await.unwrap();
        assert_eq!(body, b"text");
    }

    #[tokio::test]
    async fn test_missing_bucket_lists_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf()).unwrap();
        assert!(store.list_objects("absent", "").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_rejects_escaping_keys() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(dir.path().to_path_buf()).unwrap();
        let err = store.get_object("tickets", "../secret.pdf").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }
}
