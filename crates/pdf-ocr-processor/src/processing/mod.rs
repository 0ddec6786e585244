//! Run orchestration: locate, download, extract, persist

mod locator;
mod processor;

pub use locator::{find_latest_object, select_latest};
pub use processor::{
    connector_for, ExtractedDocument, PdfOcrProcessor, PersistReport, ProcessOutcome, SkipReason,
    NO_TEXT_PLACEHOLDER,
};
