//! Object store document references

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A listing entry returned by an object store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectInfo {
    /// Full object key
    pub key: String,
    /// Last modification time reported by the store
    pub last_modified: DateTime<Utc>,
    /// Size in bytes
    pub size: u64,
}

/// Identifies one object in one bucket
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub bucket: String,
    pub key: String,
}

impl DocumentRef {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    /// Last path segment of the key, e.g. "4430_0.pdf" for "PDF_TEST/4430_0.pdf"
    pub fn file_name(&self) -> &str {
        self.key.rsplit('/').next().unwrap_or(&self.key)
    }

    /// File name without its ".pdf" extension (case-insensitive)
    pub fn base_name(&self) -> &str {
        strip_pdf_extension(self.file_name())
    }

    /// Whether the key names a PDF
    pub fn is_pdf(&self) -> bool {
        self.key.to_lowercase().ends_with(".pdf")
    }

    /// `s3://bucket/key` style URI for logs
    pub fn uri(&self) -> String {
        format!("s3://{}/{}", self.bucket, self.key)
    }
}

impl std::fmt::Display for DocumentRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.uri())
    }
}

/// Drop a trailing ".pdf" (any case) from a file name
pub fn strip_pdf_extension(name: &str) -> &str {
    match name.len().checked_sub(4) {
        Some(cut) if name.is_char_boundary(cut) && name[cut..].eq_ignore_ascii_case(".pdf") => {
            &name[..cut]
        }
        _ => name,
    }
}

/// Join a prefix and a leaf with exactly one '/'
pub fn join_key(prefix: &str, leaf: &str) -> String {
    let prefix = prefix.trim_matches('/');
    if prefix.is_empty() {
        leaf.to_string()
    } else {
        format!("{}/{}", prefix, leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_names() {
        let doc = DocumentRef::new("bucket", "PDF_TEST/4430_0.pdf");
        assert_eq!(doc.file_name(), "4430_0.pdf");
        assert_eq!(doc.base_name(), "4430_0");
        assert!(doc.is_pdf());
        assert_eq!(doc.uri(), "s3://bucket/PDF_TEST/4430_0.pdf");

        let upper = DocumentRef::new("bucket", "SCAN.PDF");
        assert_eq!(upper.base_name(), "SCAN");
        assert!(upper.is_pdf());

        let docx = DocumentRef::new("bucket", "notes.docx");
        assert_eq!(docx.base_name(), "notes.docx");
        assert!(!docx.is_pdf());
    }

    #[test]
    fn test_join_key() {
        assert_eq!(join_key("PDF_OCR", "OCR_a.txt"), "PDF_OCR/OCR_a.txt");
        assert_eq!(join_key("PDF_OCR/", "OCR_a.txt"), "PDF_OCR/OCR_a.txt");
        assert_eq!(join_key("", "OCR_a.txt"), "OCR_a.txt");
    }
}
