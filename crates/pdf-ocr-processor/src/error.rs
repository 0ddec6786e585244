//! Error types for the OCR processor

use thiserror::Error;

/// Result type alias for processor operations
pub type Result<T> = std::result::Result<T, Error>;

/// Processor errors
#[derive(Debug, Error)]
pub enum Error {
    /// Missing or invalid configuration (fatal, raised before any network call)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Requested object is not something we can process
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Nothing to process under the requested location
    #[error("Not found: {0}")]
    NotFound(String),

    /// Object store round trip failed
    #[error("Failed {operation} '{key}': {message}")]
    Transport {
        operation: String,
        key: String,
        message: String,
    },

    /// Hosted OCR call failed
    #[error("OCR error: {0}")]
    Ocr(String),

    /// Local text-layer extraction failed
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// TOML config parse error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// HTTP request error
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a transport error
    pub fn transport(
        operation: impl Into<String>,
        key: impl Into<String>,
        message: impl ToString,
    ) -> Self {
        Self::Transport {
            operation: operation.into(),
            key: key.into(),
            message: message.to_string(),
        }
    }

    /// Create an OCR error
    pub fn ocr(message: impl Into<String>) -> Self {
        Self::Ocr(message.into())
    }

    /// Create an extraction error
    pub fn extraction(message: impl Into<String>) -> Self {
        Self::Extraction(message.into())
    }

    /// Create an internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Stable tag used in error response bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Config(_) => "config_error",
            Error::InvalidInput(_) => "invalid_input",
            Error::NotFound(_) => "not_found",
            Error::Transport { .. } => "transport_error",
            Error::Ocr(_) => "ocr_error",
            Error::Extraction(_) => "extraction_error",
            Error::Io(_) => "io_error",
            Error::Json(_) => "json_error",
            Error::Toml(_) => "toml_error",
            Error::Http(_) => "http_error",
            Error::Internal(_) => "internal_error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_display() {
        let err = Error::transport("downloading", "PDF_TEST/a.pdf", "connection reset");
        assert_eq!(
            err.to_string(),
            "Failed downloading 'PDF_TEST/a.pdf': connection reset"
        );
        assert_eq!(err.kind(), "transport_error");
    }

    #[test]
    fn test_kind_tags() {
        assert_eq!(Error::Config("x".into()).kind(), "config_error");
        assert_eq!(Error::InvalidInput("x".into()).kind(), "invalid_input");
        assert_eq!(Error::NotFound("x".into()).kind(), "not_found");
    }
}
