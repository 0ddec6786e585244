//! OCR provider trait and vendor response decoding

use async_trait::async_trait;
use serde_json::Value;

use crate::error::Result;

/// Trait for hosted OCR
///
/// Implementations:
/// - `MistralOcrClient`: Mistral Document AI OCR API
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait OcrProvider: Send + Sync {
    /// Extract text from raw PDF bytes
    async fn extract_text(&self, pdf_data: &[u8]) -> Result<String>;
}

/// Text-bearing shape found in an OCR response
///
/// The vendor does not pin its response layout, so the payload is decoded
/// once into one of these variants. `decode` tries them in declaration order
/// and the first match wins.
#[derive(Debug, Clone, PartialEq)]
pub enum OcrPayload {
    /// Top-level `content` string
    Content(String),
    /// Top-level `text` string
    Text(String),
    /// `data.content` string
    DataContent(String),
    /// `data.text` string
    DataText(String),
    /// `data` present without a text field, kept as its JSON rendering
    Data(String),
    /// `pages[].markdown`, one entry per page
    Pages(Vec<String>),
    /// Nothing recognised, whole response as JSON
    Raw(String),
}

impl OcrPayload {
    /// Decode a response body into its text-bearing variant
    pub fn decode(response: &Value) -> Self {
        if let Some(content) = str_field(response, "content") {
            return Self::Content(content);
        }
        if let Some(text) = str_field(response, "text") {
            return Self::Text(text);
        }
        if let Some(data) = response.get("data").filter(|d| !d.is_null()) {
            if let Some(content) = str_field(data, "content") {
                return Self::DataContent(content);
            }
            if let Some(text) = str_field(data, "text") {
                return Self::DataText(text);
            }
            return Self::Data(render(data));
        }
        if let Some(pages) = response.get("pages").and_then(Value::as_array) {
            let markdown: Vec<String> = pages
                .iter()
                .filter_map(|p| str_field(p, "markdown"))
                .collect();
            if !markdown.is_empty() {
                return Self::Pages(markdown);
            }
        }
        Self::Raw(response.to_string())
    }

    /// Extracted text carried by the variant
    pub fn into_text(self) -> String {
        match self {
            Self::Content(s)
            | Self::Text(s)
            | Self::DataContent(s)
            | Self::DataText(s)
            | Self::Data(s)
            | Self::Raw(s) => s,
            Self::Pages(pages) => pages.join("\n\n"),
        }
    }

    /// Short name for logs
    pub fn source(&self) -> &'static str {
        match self {
            Self::Content(_) => "content",
            Self::Text(_) => "text",
            Self::DataContent(_) => "data.content",
            Self::DataText(_) => "data.text",
            Self::Data(_) => "data",
            Self::Pages(_) => "pages",
            Self::Raw(_) => "raw",
        }
    }
}

fn str_field(value: &Value, name: &str) -> Option<String> {
    value.get(name).and_then(Value::as_str).map(str::to_string)
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_priority_order() {
        let all = json!({
            "content": "from content",
            "text": "from text",
            "data": { "content": "nested" },
        });
        assert_eq!(OcrPayload::decode(&all), OcrPayload::Content("from content".into()));

        let text = json!({ "text": "from text", "data": { "content": "nested" } });
        assert_eq!(OcrPayload::decode(&text), OcrPayload::Text("from text".into()));

        let nested = json!({ "data": { "content": "nested", "text": "other" } });
        assert_eq!(OcrPayload::decode(&nested), OcrPayload::DataContent("nested".into()));

        let nested_text = json!({ "data": { "text": "nested text" } });
        assert_eq!(OcrPayload::decode(&nested_text), OcrPayload::DataText("nested text".into()));
    }

    #[test]
    fn test_data_without_text_is_stringified() {
        let payload = OcrPayload::decode(&json!({ "data": { "items": [1, 2] } }));
        assert_eq!(payload.source(), "data");
        assert_eq!(payload.into_text(), r#"{"items":[1,2]}"#);

        let plain = OcrPayload::decode(&json!({ "data": "just a string" }));
        assert_eq!(plain.into_text(), "just a string");
    }

    #[test]
    fn test_pages_markdown() {
        let response = json!({
            "model": "mistral-ocr-latest",
            "pages": [
                { "index": 0, "markdown": "# Page one" },
                { "index": 1, "markdown": "Page two" },
            ],
        });
        let payload = OcrPayload::decode(&response);
        assert_eq!(payload.source(), "pages");
        assert_eq!(payload.into_text(), "# Page one\n\nPage two");
    }

    #[test]
    fn test_unknown_shape_falls_back_to_raw() {
        let response = json!({ "unexpected": true });
        let payload = OcrPayload::decode(&response);
        assert_eq!(payload, OcrPayload::Raw(r#"{"unexpected":true}"#.into()));
    }

    #[test]
    fn test_non_string_fields_are_skipped() {
        let response = json!({ "content": null, "text": 42, "data": { "text": "ok" } });
        assert_eq!(OcrPayload::decode(&response), OcrPayload::DataText("ok".into()));
    }
}
