//! Format-specific text and metadata extraction.
//!
//! Each [`Extractor`] maps a file on disk to plain UTF-8 text plus a
//! metadata map. The [`ExtractorRegistry`] tries extractors in registration
//! order (PDF, then JSON) and falls back to reading the file as plain text
//! when none of them claims it.
//!
//! Text and metadata are extracted independently: a document whose info
//! dictionary is unreadable still yields its text, and a document whose text
//! cannot be extracted still yields the basic metadata fields.

mod json;
mod pdf;

use std::path::Path;

use serde_json::Value;
use thiserror::Error;

use crate::models::{
    ExtractionResult, Metadata, KEY_FILE_EXTENSION, KEY_PROCESSING_METHOD, KEY_PROCESSOR,
};

pub use json::flatten as flatten_json;

#[derive(Error, Debug)]
pub enum ExtractError {
    #[error("PDF extraction failed: {0}")]
    Pdf(String),
    #[error("JSON extraction failed: {0}")]
    Json(String),
    #[error("not valid UTF-8 text: {0}")]
    Decode(String),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// The closed set of document extractors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Extractor {
    Pdf,
    Json,
    /// Fallback for files no other extractor claims.
    PlainText,
}

impl Extractor {
    /// Identity tag written to the `processor` metadata field.
    pub fn tag(&self) -> &'static str {
        match self {
            Extractor::Pdf => "pdf",
            Extractor::Json => "json",
            Extractor::PlainText => "none",
        }
    }

    /// Lowercase extensions (without the dot) this extractor claims.
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Extractor::Pdf => &["pdf"],
            Extractor::Json => &["json"],
            Extractor::PlainText => &[],
        }
    }

    pub fn can_process(&self, path: &Path) -> bool {
        match extension_of(path) {
            Some(ext) => self.extensions().contains(&ext.as_str()),
            None => false,
        }
    }

    pub fn extract_text(&self, path: &Path) -> Result<String, ExtractError> {
        match self {
            Extractor::Pdf => pdf::extract_text(path),
            Extractor::Json => json::extract_text(path),
            Extractor::PlainText => read_plain_text(path),
        }
    }

    /// Never fails; falls back to the always-present fields on error.
    pub fn extract_metadata(&self, path: &Path) -> Metadata {
        match self {
            Extractor::Pdf => pdf::extract_metadata(path),
            Extractor::Json => json::extract_metadata(path),
            Extractor::PlainText => {
                let suffix = extension_of(path)
                    .map(|ext| format!(".{}", ext))
                    .unwrap_or_default();
                base_metadata(&suffix, "direct_file_read", self.tag())
            }
        }
    }
}

/// Ordered extractor dispatch; first match wins.
#[derive(Debug, Clone)]
pub struct ExtractorRegistry {
    extractors: Vec<Extractor>,
}

impl ExtractorRegistry {
    pub fn new() -> Self {
        Self {
            extractors: vec![Extractor::Pdf, Extractor::Json],
        }
    }

    /// The first registered extractor that claims `path`, or
    /// [`Extractor::PlainText`].
    pub fn select(&self, path: &Path) -> Extractor {
        self.extractors
            .iter()
            .copied()
            .find(|e| e.can_process(path))
            .unwrap_or(Extractor::PlainText)
    }

    /// Extract text and metadata from `path` with the selected extractor.
    ///
    /// A text failure is reported through `success = false` and `error`;
    /// the metadata is still populated.
    pub fn extract(&self, path: &Path) -> (Extractor, ExtractionResult) {
        let extractor = self.select(path);
        if extractor == Extractor::PlainText {
            tracing::warn!(
                "No extractor found for file: {}, using file content as text",
                path.display()
            );
        }

        let metadata = extractor.extract_metadata(path);
        let result = match extractor.extract_text(path) {
            Ok(text) => ExtractionResult {
                text,
                metadata,
                success: true,
                error: None,
            },
            Err(e) => {
                tracing::error!("Failed to extract text from {}: {}", path.display(), e);
                ExtractionResult {
                    text: String::new(),
                    metadata,
                    success: false,
                    error: Some(e),
                }
            }
        };
        (extractor, result)
    }
}

impl Default for ExtractorRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Lowercase extension without the leading dot.
pub fn extension_of(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
}

fn base_metadata(extension: &str, method: &str, processor: &str) -> Metadata {
    let mut metadata = Metadata::new();
    metadata.insert(KEY_FILE_EXTENSION.to_string(), Value::from(extension));
    metadata.insert(KEY_PROCESSING_METHOD.to_string(), Value::from(method));
    metadata.insert(KEY_PROCESSOR.to_string(), Value::from(processor));
    metadata
}

fn read_plain_text(path: &Path) -> Result<String, ExtractError> {
    let bytes = std::fs::read(path)?;
    String::from_utf8(bytes).map_err(|e| ExtractError::Decode(e.to_string()))
}
