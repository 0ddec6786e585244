//! OCR-with-fallback text extraction

use std::sync::Arc;
use std::time::Duration;

use super::fallback::{panic_message, FallbackExtractor};
use crate::context::RunContext;
use crate::error::{Error, Result};
use crate::providers::OcrProvider;
use crate::types::ExtractionMethod;

/// Prefix of the marker returned when every extractor failed
pub const FAILURE_MARKER_PREFIX: &str = "Text extraction failed";

/// Default bound on one fallback extraction
pub const DEFAULT_FALLBACK_TIMEOUT: Duration = Duration::from_secs(60);

/// What an extraction produced and how
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractionOutcome {
    /// Extracted text, possibly empty or a failure marker
    pub text: String,
    pub method: ExtractionMethod,
    /// Why hosted OCR was bypassed, when it was
    pub ocr_error: Option<String>,
}

impl ExtractionOutcome {
    /// True when neither extractor produced text
    pub fn is_failure_marker(&self) -> bool {
        self.method == ExtractionMethod::FailureMarker
    }

    /// True when the text is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }
}

/// Hosted OCR first, local text layer second, failure marker last
pub struct TextExtractor {
    ocr: Arc<dyn OcrProvider>,
    fallback: Arc<dyn FallbackExtractor>,
    fallback_timeout: Duration,
}

impl TextExtractor {
    pub fn new(ocr: Arc<dyn OcrProvider>, fallback: Arc<dyn FallbackExtractor>) -> Self {
        Self {
            ocr,
            fallback,
            fallback_timeout: DEFAULT_FALLBACK_TIMEOUT,
        }
    }

    /// Bound the local fallback; a parse still running afterwards is abandoned
    pub fn with_fallback_timeout(mut self, timeout: Duration) -> Self {
        self.fallback_timeout = timeout;
        self
    }

    /// Extract text from PDF bytes. Never fails.
    pub async fn extract(&self, ctx: &RunContext, pdf_data: &[u8]) -> ExtractionOutcome {
        tracing::info!(parent: &ctx.span, "Starting OCR processing ({} bytes)", pdf_data.len());

        let ocr_error = match self.ocr.extract_text(pdf_data).await {
            Ok(text) => {
                tracing::info!(
                    parent: &ctx.span,
                    "Extracted {} characters using hosted OCR",
                    text.chars().count()
                );
                return ExtractionOutcome {
                    text,
                    method: ExtractionMethod::Ocr,
                    ocr_error: None,
                };
            }
            Err(e) => {
                tracing::error!(parent: &ctx.span, "Error during OCR processing: {}", e);
                tracing::info!(parent: &ctx.span, "Falling back to text-layer extraction...");
                e.to_string()
            }
        };

        match self.run_fallback(pdf_data).await {
            Ok(text) => ExtractionOutcome {
                text,
                method: ExtractionMethod::Fallback,
                ocr_error: Some(ocr_error),
            },
            Err(e) => {
                tracing::error!(parent: &ctx.span, "Fallback text extraction failed: {}", e);
                ExtractionOutcome {
                    text: format!("{}: {}", FAILURE_MARKER_PREFIX, e),
                    method: ExtractionMethod::FailureMarker,
                    ocr_error: Some(ocr_error),
                }
            }
        }
    }

    /// Run the fallback on the blocking pool so a parser panic or hang
    /// comes back as an `Extraction` error
    async fn run_fallback(&self, pdf_data: &[u8]) -> Result<String> {
        let fallback = Arc::clone(&self.fallback);
        let data = pdf_data.to_vec();
        let task = tokio::task::spawn_blocking(move || fallback.extract_text(&data));

        match tokio::time::timeout(self.fallback_timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_error)) if join_error.is_panic() => {
                let panic = join_error.into_panic();
                Err(Error::extraction(format!(
                    "Fallback extractor panicked: {}",
                    panic_message(panic.as_ref())
                )))
            }
            Ok(Err(join_error)) => Err(Error::extraction(format!(
                "Fallback extractor task failed: {}",
                join_error
            ))),
            Err(_) => Err(Error::extraction(format!(
                "Fallback extraction timed out after {}ms",
                self.fallback_timeout.as_millis()
            ))),
        }
    }
}
