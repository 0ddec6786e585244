//! Amazon S3 object store
//!
//! Works against AWS or any S3-compatible endpoint (MinIO, LocalStack).

use async_trait::async_trait;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use chrono::{DateTime, Utc};
use std::sync::Arc;

use super::object_store::{ObjectStore, ObjectStoreConnector};
use crate::config::StoreConfig;
use crate::error::{Error, Result};
use crate::types::ObjectInfo;

/// S3 object store
pub struct S3ObjectStore {
    client: S3Client,
}

impl S3ObjectStore {
    /// Wrap an existing SDK client
    pub fn new(client: S3Client) -> Self {
        Self { client }
    }

    /// Build a client from the store configuration
    ///
    /// Explicit credentials win; otherwise the SDK default chain is used.
    pub async fn from_config(config: &StoreConfig) -> Result<Self> {
        let mut loader = aws_config::defaults(aws_config::BehaviorVersion::latest());

        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint_url {
            loader = loader.endpoint_url(endpoint.clone());
        }
        match (&config.access_key_id, &config.secret_access_key) {
            (Some(key_id), Some(secret)) => {
                loader = loader.credentials_provider(Credentials::new(
                    key_id.clone(),
                    secret.clone(),
                    None,
                    None,
                    "processor-config",
                ));
            }
            (Some(_), None) | (None, Some(_)) => {
                return Err(Error::Config(
                    "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".to_string(),
                ));
            }
            (None, None) => {}
        }

        let sdk_config = loader.load().await;
        let mut s3_config = aws_sdk_s3::config::Builder::from(&sdk_config);
        if config.endpoint_url.is_some() {
            // S3-compatible servers rarely support virtual-hosted buckets
            s3_config = s3_config.force_path_style(true);
        }

        tracing::info!(
            "S3 client configured (region: {})",
            config.region.as_deref().unwrap_or("default chain")
        );

        Ok(Self::new(S3Client::from_conf(s3_config.build())))
    }
}

fn to_chrono(value: &aws_sdk_s3::primitives::DateTime) -> DateTime<Utc> {
    DateTime::from_timestamp(value.secs(), value.subsec_nanos()).unwrap_or_default()
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectInfo>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let page = self
                .client
                .list_objects_v2()
                .bucket(bucket)
                .prefix(prefix)
                .set_continuation_token(continuation.take())
                .send()
                .await
                .map_err(|e| Error::transport("listing", prefix, e.into_service_error()))?;

            for object in page.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                objects.push(ObjectInfo {
                    key: key.to_string(),
                    last_modified: object.last_modified().map(to_chrono).unwrap_or_default(),
                    size: object.size().unwrap_or(0).max(0) as u64,
                });
            }

            match page.next_continuation_token() {
                Some(token) if page.is_truncated().unwrap_or(false) => {
                    continuation = Some(token.to_string());
                }
                _ => break,
            }
        }

        Ok(objects)
    }

    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| Error::transport("downloading", key, e.into_service_error()))?;

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|e| Error::transport("reading body of", key, e))?;

        Ok(bytes.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| Error::transport("uploading", key, e.into_service_error()))?;
        Ok(())
    }
}

/// Connector that builds an S3 client from configuration
pub struct S3Connector {
    pub config: StoreConfig,
}

#[async_trait]
impl ObjectStoreConnector for S3Connector {
    async fn connect(&self) -> Result<Arc<dyn ObjectStore>> {
        Ok(Arc::new(S3ObjectStore::from_config(&self.config).await?))
    }
}
