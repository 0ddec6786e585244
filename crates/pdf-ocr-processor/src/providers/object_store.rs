//! Object store provider trait for listing, reading and writing blobs

use async_trait::async_trait;
use std::sync::Arc;

use crate::error::Result;
use crate::types::ObjectInfo;

/// Trait for bucket-like blob storage
///
/// Implementations:
/// - `S3ObjectStore`: Amazon S3 or an S3-compatible endpoint
/// - `LocalObjectStore`: Local filesystem
/// - `InMemoryObjectStore`: Process memory (tests, dry runs)
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// List every object whose key starts with `prefix`
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>>;

    /// Download an object
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>>;

    /// Upload an object, replacing any previous version
    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()>;
}

/// Produces a store client at the start of a run
///
/// Connecting inside the run keeps client construction failures on the
/// structured error path instead of aborting the invocation.
#[async_trait]
pub trait ObjectStoreConnector: Send + Sync {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>>;
}

/// Connector handing out an already-built store
pub struct ConnectedStore(pub Arc<dyn ObjectStore>);

#[async_trait]
impl ObjectStoreConnector for ConnectedStore {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>> {
        Ok(self.0.clone())
    }
}
