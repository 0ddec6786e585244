//! Provider abstractions for object storage, hosted OCR and connectors
//!
//! Trait-based so the orchestrator can run against S3, a local directory or
//! memory, and so tests can substitute mocks.

pub mod local;
pub mod memory;
pub mod mistral;
pub mod object_store;
pub mod ocr;

#[cfg(feature = "s3")]
pub mod s3_store;

pub use local::{LocalConnector, LocalObjectStore};
pub use memory::InMemoryObjectStore;
pub use mistral::MistralOcrClient;
pub use object_store::{ConnectedStore, ObjectStore, ObjectStoreConnector};
pub use ocr::{OcrPayload, OcrProvider};

#[cfg(feature = "s3")]
pub use s3_store::{S3Connector, S3ObjectStore};
