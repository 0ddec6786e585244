//! In-memory object store

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::sync::Mutex;

use super::object_store::ObjectStore;
use crate::error::{Error, Result};
use crate::types::ObjectInfo;

#[derive(Debug, Clone)]
struct StoredObject {
    body: Vec<u8>,
    content_type: String,
    last_modified: DateTime<Utc>,
}

/// Object store kept in process memory, keyed by (bucket, key)
#[derive(Default)]
pub struct InMemoryObjectStore {
    objects: Mutex<BTreeMap<(String, String), StoredObject>>,
}

impl InMemoryObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an object with an explicit modification time
    pub fn insert(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        last_modified: DateTime<Utc>,
    ) {
        let content_type = mime_guess::from_path(key)
            .first_or_octet_stream()
            .to_string();
        self.lock().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type,
                last_modified,
            },
        );
    }

    /// Read an object without going through the async trait
    pub fn get(&self, bucket: &str, key: &str) -> Option<Vec<u8>> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.body.clone())
    }

    /// Content type recorded for an object
    pub fn content_type(&self, bucket: &str, key: &str) -> Option<String> {
        self.lock()
            .get(&(bucket.to_string(), key.to_string()))
            .map(|o| o.content_type.clone())
    }

    /// All keys in a bucket
    pub fn keys(&self, bucket: &str) -> Vec<String> {
        self.lock()
            .keys()
            .filter(|(b, _)| b == bucket)
            .map(|(_, k)| k.clone())
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BTreeMap<(String, String), StoredObject>> {
        self.objects.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl ObjectStore for InMemoryObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        Ok(self
            .lock()
            .iter()
            .filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
            .map(|((_, k), o)| ObjectInfo {
                key: k.clone(),
                last_modified: o.last_modified,
                size: o.body.len() as u64,
            })
            .collect())
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        self.get(bucket, key)
            .ok_or_else(|| Error::transport("downloading", key, "NoSuchKey"))
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.lock().insert(
            (bucket.to_string(), key.to_string()),
            StoredObject {
                body,
                content_type: content_type.to_string(),
                last_modified: Utc::now(),
            },
        );
        Ok(())
    }
}
