//! Per-document ingestion errors.
//!
//! Every variant is recoverable at document granularity: the orchestrator
//! records it against the run and moves on to the next document.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Unsafe file path: {}", .0.display())]
    UnsafePath(PathBuf),

    #[error("File {name} exceeds maximum size ({limit} bytes): {size} bytes")]
    Oversize { name: String, size: u64, limit: u64 },

    /// Soft failure: the document is skipped, not counted as failed.
    #[error("Unsupported format for {name}: '{extension}'")]
    UnsupportedFormat { name: String, extension: String },

    #[error("Failed to extract text from {name}: {reason}")]
    Extraction { name: String, reason: String },

    #[error("No text extracted from {name}")]
    EmptyText { name: String },

    #[error("Failed to read {name} as UTF-8 text: {reason}")]
    Decode { name: String, reason: String },

    #[error("File stat error for {name}: {source}")]
    Stat {
        name: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Sink rejected batch for {name}: {reason}")]
    Sink { name: String, reason: String },
}

impl IngestError {
    /// Whether this outcome counts as a skip rather than a failure.
    pub fn is_skip(&self) -> bool {
        matches!(self, IngestError::UnsupportedFormat { .. })
    }
}
