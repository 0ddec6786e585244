//! Handler response and extraction result types

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::run_log::RunLog;
use crate::error::Error;

/// Marker appended to text cut at the display limit
pub const ELLIPSIS: &str = "...";

/// Execution context supplied by the invoking runtime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InvocationContext {
    /// Runtime request ID, recorded on the run span
    #[serde(default)]
    pub request_id: Option<String>,
    /// Invoked function name, recorded on the run span
    #[serde(default)]
    pub function_name: Option<String>,
}

/// Record returned to the invoking runtime
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HandlerResponse {
    #[serde(rename = "statusCode")]
    pub status_code: u16,
    /// JSON-encoded body
    pub body: String,
}

impl HandlerResponse {
    pub fn new(status_code: u16, body: serde_json::Value) -> Self {
        Self {
            status_code,
            body: body.to_string(),
        }
    }

    /// Run completed and artifacts were written
    pub fn success(message: &str, log: &RunLog) -> Self {
        Self::new(
            200,
            serde_json::json!({
                "message": message,
                "log": log,
            }),
        )
    }

    /// Run completed but at least one artifact write failed
    pub fn partial_success(message: &str, log: &RunLog, persistence: serde_json::Value) -> Self {
        Self::new(
            200,
            serde_json::json!({
                "message": message,
                "log": log,
                "persistence_status": "partial_failure",
                "persistence": persistence,
            }),
        )
    }

    /// Nothing usable came out of extraction
    pub fn business_failure(message: &str) -> Self {
        Self::new(
            404,
            serde_json::json!({
                "status": "failed",
                "message": message,
            }),
        )
    }

    /// Run intentionally did nothing
    pub fn skipped(message: &str, processing_status: &str) -> Self {
        Self::new(
            200,
            serde_json::json!({
                "message": message,
                "processing_status": processing_status,
            }),
        )
    }

    /// Uncaught failure
    pub fn error(message: &str, error: &Error, log: &RunLog) -> Self {
        Self::new(
            500,
            serde_json::json!({
                "message": message,
                "error": error.to_string(),
                "error_type": error.kind(),
                "log": log,
            }),
        )
    }

    /// Decode the body back into JSON
    pub fn body_json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).unwrap_or(serde_json::Value::Null)
    }

    pub fn is_server_error(&self) -> bool {
        self.status_code >= 500
    }
}

/// Outcome class of an extraction run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionStatus {
    Success,
    Skipped,
    Error,
}

/// Which extractor produced the text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExtractionMethod {
    /// Hosted OCR answered
    Ocr,
    /// Hosted OCR failed, the PDF text layer was used
    Fallback,
    /// Both extractors failed; the text is a failure marker
    FailureMarker,
}

/// Result of extracting one document. Built once per run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionResult {
    pub document_id: Uuid,
    pub bucket: String,
    pub object_key: String,
    pub status: ExtractionStatus,
    pub method: ExtractionMethod,
    /// Display text, cut at the configured character limit
    pub text: String,
    /// Size of the source PDF in bytes
    pub byte_length: usize,
    /// Characters in the full extracted text
    pub text_length: usize,
    pub processed_at: String,
}

impl ExtractionResult {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        document_id: Uuid,
        bucket: &str,
        object_key: &str,
        status: ExtractionStatus,
        method: ExtractionMethod,
        text: String,
        byte_length: usize,
        text_length: usize,
        processed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            document_id,
            bucket: bucket.to_string(),
            object_key: object_key.to_string(),
            status,
            method,
            text,
            byte_length,
            text_length,
            processed_at: processed_at.to_rfc3339_opts(SecondsFormat::Micros, true),
        }
    }
}

/// Keep the first `limit` characters, appending "..." only when text was cut
pub fn truncate_for_display(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_idx, _)) => format!("{}{}", &text[..byte_idx], ELLIPSIS),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncation_law() {
        for len in [0usize, 1, 1999, 2000, 2001, 5000] {
            let text = "a".repeat(len);
            let display = truncate_for_display(&text, 2000);
            if len > 2000 {
                assert_eq!(display.chars().count(), 2000 + ELLIPSIS.len());
                assert!(display.ends_with(ELLIPSIS));
            } else {
                assert_eq!(display, text);
            }
        }
    }

    #[test]
    fn test_truncation_counts_characters() {
        let text = "é".repeat(2001);
        let display = truncate_for_display(&text, 2000);
        assert_eq!(display, format!("{}...", "é".repeat(2000)));
    }

    #[test]
    fn test_response_bodies() {
        let skipped = HandlerResponse::skipped("PDF too large", "skipped_size_limit");
        assert_eq!(skipped.status_code, 200);
        assert_eq!(skipped.body_json()["processing_status"], "skipped_size_limit");

        let failed = HandlerResponse::business_failure("No text extracted");
        assert_eq!(failed.status_code, 404);
        assert_eq!(failed.body_json()["status"], "failed");

        let log = RunLog::new(Uuid::new_v4());
        let err = HandlerResponse::error("Processing failed", &Error::NotFound("x".into()), &log);
        assert!(err.is_server_error());
        assert_eq!(err.body_json()["error_type"], "not_found");
        assert_eq!(err.body_json()["log"]["workflow"]["OCR"]["status"], "Not started");
    }

    #[test]
    fn test_response_wire_shape() {
        let response = HandlerResponse::skipped("ignored", "skipped");
        let wire = serde_json::to_value(&response).unwrap();
        assert_eq!(wire["statusCode"], 200);
        assert!(wire["body"].is_string());
    }
}
