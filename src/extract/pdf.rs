//! PDF text and document-info extraction.
//!
//! Text comes from `pdf-extract`; the document information dictionary and
//! page count come from `lopdf`. The two are read independently so a broken
//! info dictionary never costs us the text, and vice versa.

use std::panic::{self, AssertUnwindSafe};
use std::path::Path;

use chrono::NaiveDateTime;
use lopdf::{Document, Object};
use serde_json::Value;

use super::ExtractError;
use crate::models::Metadata;

/// Info dictionary keys and the metadata field each one maps to.
const INFO_FIELDS: &[(&[u8], &str)] = &[
    (b"Title", "title"),
    (b"Author", "author"),
    (b"Subject", "subject"),
    (b"Creator", "creator"),
    (b"Producer", "producer"),
];

const DATE_FIELDS: &[(&[u8], &str)] = &[
    (b"CreationDate", "creation_date"),
    (b"ModDate", "modification_date"),
];

pub(super) fn extract_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    extract_text_from_mem(&bytes)
}

pub(super) fn extract_text_from_mem(bytes: &[u8]) -> Result<String, ExtractError> {
    // pdf-extract panics on some malformed font tables.
    let result = panic::catch_unwind(AssertUnwindSafe(|| {
        pdf_extract::extract_text_from_mem_by_pages(bytes)
    }))
    .map_err(|_| ExtractError::Pdf("extractor panicked on malformed input".to_string()))?;

    let pages = result.map_err(|e| ExtractError::Pdf(e.to_string()))?;
    Ok(join_pages(&pages))
}

/// Page texts in page order, one newline between pages.
fn join_pages(pages: &[String]) -> String {
    pages.join("\n").trim().to_string()
}

/// Full metadata for a readable PDF; only the always-present fields otherwise.
pub(super) fn extract_metadata(path: &Path) -> Metadata {
    match read_info(path) {
        Ok(metadata) => metadata,
        Err(e) => {
            tracing::error!(
                "Failed to extract metadata from PDF {}: {}",
                path.display(),
                e
            );
            basic_metadata()
        }
    }
}

pub(super) fn basic_metadata() -> Metadata {
    super::base_metadata(".pdf", "basic", super::Extractor::Pdf.tag())
}

fn read_info(path: &Path) -> Result<Metadata, ExtractError> {
    let doc = Document::load(path).map_err(|e| ExtractError::Pdf(e.to_string()))?;
    let mut metadata = super::base_metadata(".pdf", "pdf-extract", super::Extractor::Pdf.tag());

    if let Some(info) = info_dictionary(&doc) {
        for (key, field) in INFO_FIELDS {
            if let Some(value) = info.get(key).ok().and_then(decode_text_string) {
                if !value.is_empty() {
                    metadata.insert(field.to_string(), Value::from(value));
                }
            }
        }
        for (key, field) in DATE_FIELDS {
            if let Some(value) = info.get(key).ok().and_then(decode_text_string) {
                if !value.is_empty() {
                    metadata.insert(field.to_string(), Value::from(format_pdf_date(&value)));
                }
            }
        }
    }

    metadata.insert("page_count".to_string(), Value::from(doc.get_pages().len()));
    Ok(metadata)
}

fn info_dictionary(doc: &Document) -> Option<&lopdf::Dictionary> {
    let info = doc.trailer.get(b"Info").ok()?;
    let (_, info) = doc.dereference(info).ok()?;
    info.as_dict().ok()
}

/// Decode a PDF text string: UTF-16BE with a byte-order mark, else
/// PDFDocEncoding, which matches Latin-1 for printable text.
fn decode_text_string(obj: &Object) -> Option<String> {
    let bytes = match obj {
        Object::String(bytes, _) => bytes.as_slice(),
        Object::Name(name) => name.as_slice(),
        _ => return None,
    };

    let text = if bytes.starts_with(&[0xFE, 0xFF]) {
        let units: Vec<u16> = bytes[2..]
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        String::from_utf16_lossy(&units)
    } else if let Ok(utf8) = std::str::from_utf8(bytes) {
        utf8.to_string()
    } else {
        bytes.iter().map(|&b| b as char).collect()
    };
    Some(text.trim_matches('\0').trim().to_string())
}

/// Render `D:YYYYMMDDHHmmSS...` as `YYYY-MM-DD HH:MM:SS`; anything that does
/// not parse is kept verbatim.
fn format_pdf_date(raw: &str) -> String {
    let digits: String = raw
        .trim_start_matches("D:")
        .chars()
        .take_while(|c| c.is_ascii_digit())
        .collect();
    if digits.len() < 14 {
        return raw.to_string();
    }
    match NaiveDateTime::parse_from_str(&digits[..14], "%Y%m%d%H%M%S") {
        Ok(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        Err(_) => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_pdf_text_is_an_error() {
        let err = extract_text_from_mem(b"not a pdf").unwrap_err();
        assert!(matches!(err, ExtractError::Pdf(_)));
    }

    #[test]
    fn unreadable_pdf_yields_basic_metadata() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.pdf");
        std::fs::write(&path, b"garbage").unwrap();

        let metadata = extract_metadata(&path);
        assert_eq!(metadata["processing_method"], Value::from("basic"));
        assert_eq!(metadata["file_extension"], Value::from(".pdf"));
        assert!(!metadata.contains_key("page_count"));
        assert_eq!(metadata.len(), 3);
    }

    #[test]
    fn pages_join_with_newlines() {
        let pages = vec![
            "\nFirst page text.\n".to_string(),
            "Second page.".to_string(),
            String::new(),
        ];
        assert_eq!(join_pages(&pages), "First page text.\n\nSecond page.");
        assert_eq!(join_pages(&[]), "");
    }

    #[test]
    fn pdf_dates_are_formatted() {
        assert_eq!(
            format_pdf_date("D:20240131120000+01'00'"),
            "2024-01-31 12:00:00"
        );
        assert_eq!(format_pdf_date("yesterday"), "yesterday");
    }

    #[test]
    fn utf16_text_strings_decode() {
        let obj = Object::String(
            vec![0xFE, 0xFF, 0x00, b'H', 0x00, b'i'],
            lopdf::StringFormat::Literal,
        );
        assert_eq!(decode_text_string(&obj).as_deref(), Some("Hi"));
        let latin = Object::String(b"Report".to_vec(), lopdf::StringFormat::Literal);
        assert_eq!(decode_text_string(&latin).as_deref(), Some("Report"));
    }
}
