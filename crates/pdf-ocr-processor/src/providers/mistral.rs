//! Mistral Document AI OCR client
//!
//! Sends the PDF inline as a base64 data URL and decodes whichever text
//! field the response carries.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};
use serde::Serialize;
use std::time::Duration;

use super::ocr::{OcrPayload, OcrProvider};
use crate::config::OcrConfig;
use crate::error::{Error, Result};

/// Mistral OCR API client
pub struct MistralOcrClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
    include_image_base64: bool,
}

impl MistralOcrClient {
    /// Create a new client from configuration
    pub fn new(config: &OcrConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            include_image_base64: config.include_image_base64,
        })
    }

    /// OCR endpoint URL
    fn endpoint(&self) -> String {
        format!("{}/v1/ocr", self.base_url)
    }

    /// Build the request body for a PDF
    fn build_request(&self, pdf_data: &[u8]) -> OcrRequest {
        let encoded = BASE64.encode(pdf_data);
        tracing::debug!("Encoded PDF to base64 ({} characters)", encoded.len());

        OcrRequest {
            model: self.model.clone(),
            document: DocumentUrl {
                kind: "document_url",
                document_url: format!("data:application/pdf;base64,{}", encoded),
            },
            include_image_base64: self.include_image_base64,
        }
    }
}

#[async_trait]
impl OcrProvider for MistralOcrClient {
    async fn extract_text(&self, pdf_data: &[u8]) -> Result<String> {
        let request = self.build_request(pdf_data);

        tracing::info!("Sending {} bytes to Mistral OCR ({})", pdf_data.len(), self.model);

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::ocr(format!("OCR request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(Error::ocr(format!("OCR processing failed ({}): {}", status, body)));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| Error::ocr(format!("Failed to parse OCR response: {}", e)))?;

        let payload = OcrPayload::decode(&body);
        tracing::debug!("OCR text taken from '{}' field", payload.source());
        let text = payload.into_text();

        tracing::info!("Mistral OCR extracted {} characters", text.chars().count());
        Ok(text)
    }
}

// ============================================================================
// API Request types
// ============================================================================

#[derive(Serialize)]
struct OcrRequest {
    model: String,
    document: DocumentUrl,
    include_image_base64: bool,
}

#[derive(Serialize)]
struct DocumentUrl {
    #[serde(rename = "type")]
    kind: &'static str,
    document_url: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(base_url: &str) -> MistralOcrClient {
        let config = OcrConfig {
            api_key: "test-key".to_string(),
            base_url: base_url.to_string(),
            timeout_secs: 5,
            ..OcrConfig::default()
        };
        MistralOcrClient::new(&config).unwrap()
    }

    #[test]
    fn test_endpoint_generation() {
        assert_eq!(client("https://api.mistral.ai").endpoint(), "https://api.mistral.ai/v1/ocr");
        assert_eq!(client("http://localhost:9000/").endpoint(), "http://localhost:9000/v1/ocr");
    }

    #[test]
    fn test_request_body() {
        let request = client("https://api.mistral.ai").build_request(b"%PDF");
        let json = serde_json::to_value(&request).unwrap();

        assert_eq!(json["model"], "mistral-ocr-latest");
        assert_eq!(json["document"]["type"], "document_url");
        assert_eq!(json["document"]["document_url"], "data:application/pdf;base64,JVBERg==");
        assert_eq!(json["include_image_base64"], true);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_ocr_error() {
        let err = client("http://127.0.0.1:9").extract_text(b"%PDF").await.unwrap_err();
        assert!(matches!(err, Error::Ocr(_)));
    }
}
