//! Local PDF text-layer extraction
//!
//! Used when hosted OCR is unavailable. Reads the embedded text layer only,
//! so scanned (image-only) pages come back empty.

use lopdf::Document;
use std::any::Any;
use std::panic::AssertUnwindSafe;

use crate::error::{Error, Result};

/// Trait for local, non-OCR text extraction
#[cfg_attr(test, mockall::automock)]
pub trait FallbackExtractor: Send + Sync {
    /// Extract the text layer of every page, in page order
    fn extract_text(&self, pdf_data: &[u8]) -> Result<String>;
}

/// Text-layer extractor backed by lopdf
#[derive(Debug, Default, Clone, Copy)]
pub struct LopdfTextExtractor;

impl LopdfTextExtractor {
    pub fn new() -> Self {
        Self
    }
}

impl FallbackExtractor for LopdfTextExtractor {
    fn extract_text(&self, pdf_data: &[u8]) -> Result<String> {
        tracing::info!("Using fallback lopdf text extraction...");

        // lopdf asserts on some malformed font dictionaries
        std::panic::catch_unwind(AssertUnwindSafe(|| extract_pages(pdf_data))).unwrap_or_else(
            |panic| {
                let reason = panic_message(panic.as_ref());
                tracing::error!("lopdf panicked while reading the PDF: {}", reason);
                Err(Error::extraction(format!("PDF parser panicked: {}", reason)))
            },
        )
    }
}

fn extract_pages(pdf_data: &[u8]) -> Result<String> {
    let doc = Document::load_mem(pdf_data)
        .map_err(|e| Error::extraction(format!("Failed to load PDF: {}", e)))?;

    if doc.is_encrypted() {
        return Err(Error::extraction("PDF is encrypted"));
    }

    let pages = doc.get_pages();
    let mut extracted = String::new();

    for page_num in pages.keys() {
        // A page without a readable text layer contributes an empty line
        let page_text = match doc.extract_text(&[*page_num]) {
            Ok(text) => text.replace('\0', ""),
            Err(e) => {
                tracing::debug!("No text layer on page {}: {}", page_num, e);
                String::new()
            }
        };
        extracted.push_str(&page_text);
        extracted.push('\n');
    }

    tracing::info!(
        "Fallback extraction completed: {} characters from {} pages",
        extracted.chars().count(),
        pages.len()
    );
    Ok(extracted)
}

/// Payload of a caught panic as text
pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{dictionary, Object, Stream};

    /// Build a PDF with one Courier text line per page (None = blank page)
    pub(crate) fn sample_pdf(pages: &[Option<&str>]) -> Vec<u8> {
        sample_pdf_with_font_type(pages, "Font")
    }

    /// Same as `sample_pdf`, with a chosen `/Type` on the font dictionary
    pub(crate) fn sample_pdf_with_font_type(pages: &[Option<&str>], font_type: &str) -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let font_id = doc.add_object(dictionary! {
            "Type" => Object::Name(font_type.as_bytes().to_vec()),
            "Subtype" => "Type1",
            "BaseFont" => "Courier",
        });
        let resources_id = doc.add_object(dictionary! {
            "Font" => dictionary! { "F1" => font_id },
        });

        let mut kids = Vec::new();
        for line in pages {
            let mut operations = Vec::new();
            if let Some(line) = line {
                operations = vec![
                    Operation::new("BT", vec![]),
                    Operation::new("Tf", vec!["F1".into(), 24.into()]),
                    Operation::new("Td", vec![72.into(), 720.into()]),
                    Operation::new("Tj", vec![Object::string_literal(*line)]),
                    Operation::new("ET", vec![]),
                ];
            }
            let content = Content { operations };
            let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
            let page_id = doc.add_object(dictionary! {
                "Type" => "Page",
                "Parent" => pages_id,
                "Contents" => content_id,
                "Resources" => resources_id,
                "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
            });
            kids.push(Object::from(page_id));
        }

        let count = kids.len() as i64;
        doc.objects.insert(
            pages_id,
            Object::Dictionary(dictionary! {
                "Type" => "Pages",
                "Kids" => kids,
                "Count" => count,
            }),
        );
        let catalog_id = doc.add_object(dictionary! {
            "Type" => "Catalog",
            "Pages" => pages_id,
        });
        doc.trailer.set("Root", catalog_id);

        let mut buffer = Vec::new();
        doc.save_to(&mut buffer).unwrap();
        buffer
    }

    #[test]
    fn test_extracts_pages_in_order() {
        let pdf = sample_pdf(&[Some("Hello World"), None, Some("Second page")]);
        let text = LopdfTextExtractor::new().extract_text(&pdf).unwrap();

        let first = text.find("Hello World").unwrap();
        let second = text.find("Second page").unwrap();
        assert!(first < second);
        assert!(text.ends_with('\n'));
        assert!(text.matches('\n').count() >= 3);
    }

    #[test]
    fn test_page_text_is_kept_verbatim() {
        let pdf = sample_pdf(&[Some("Hello World")]);
        let doc = Document::load_mem(&pdf).unwrap();
        let page_text = doc.extract_text(&[1]).unwrap().replace('\0', "");

        let text = LopdfTextExtractor::new().extract_text(&pdf).unwrap();
        assert_eq!(text, format!("{}\n", page_text));
    }

    // lopdf only checks the font /Type under debug assertions
    #[cfg(debug_assertions)]
    #[test]
    fn test_corrupted_font_dictionary_is_an_error() {
        let pdf = sample_pdf_with_font_type(&[Some("Hello World")], "XObject");
        let err = LopdfTextExtractor::new().extract_text(&pdf).unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }

    #[test]
    fn test_panic_message() {
        let boxed: Box<dyn Any + Send> = Box::new("font dictionary");
        assert_eq!(panic_message(boxed.as_ref()), "font dictionary");
        let boxed: Box<dyn Any + Send> = Box::new(String::from("owned"));
        assert_eq!(panic_message(boxed.as_ref()), "owned");
        let boxed: Box<dyn Any + Send> = Box::new(7u8);
        assert_eq!(panic_message(boxed.as_ref()), "unknown panic");
    }

    #[test]
    fn test_garbage_is_an_error() {
        let err = LopdfTextExtractor::new()
            .extract_text(b"definitely not a pdf")
            .unwrap_err();
        assert!(matches!(err, Error::Extraction(_)));
    }
}
