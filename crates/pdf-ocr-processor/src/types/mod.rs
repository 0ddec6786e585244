//! Core types for the OCR processor

pub mod document;
pub mod response;
pub mod run_log;

pub use document::{join_key, strip_pdf_extension, DocumentRef, ObjectInfo};
pub use response::{
    truncate_for_display, ExtractionMethod, ExtractionResult, ExtractionStatus, HandlerResponse,
    InvocationContext,
};
pub use run_log::{DealStage, RunLog, RunMetadata, StageEntry, StageStatus, Workflow};
