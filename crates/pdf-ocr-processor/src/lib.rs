//! pdf-ocr-processor: serverless handler that OCRs the newest PDF under an object store prefix
//!
//! Each invocation locates the most recently modified PDF, extracts its text with the
//! hosted Mistral OCR API (falling back to the PDF text layer), and writes the text
//! and a JSON run log back to the store.

pub mod config;
pub mod context;
pub mod error;
pub mod extraction;
pub mod processing;
pub mod providers;
pub mod types;

pub use config::ProcessorConfig;
pub use context::RunContext;
pub use error::{Error, Result};
pub use processing::{PdfOcrProcessor, ProcessOutcome};
pub use types::{
    document::{DocumentRef, ObjectInfo},
    response::{ExtractionResult, HandlerResponse, InvocationContext},
    run_log::RunLog,
};
