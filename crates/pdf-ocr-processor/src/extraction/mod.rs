//! Text extraction: hosted OCR with a local text-layer fallback

mod extractor;
pub mod fallback;

pub use extractor::{
    ExtractionOutcome, TextExtractor, DEFAULT_FALLBACK_TIMEOUT, FAILURE_MARKER_PREFIX,
};
pub use fallback::{FallbackExtractor, LopdfTextExtractor};
