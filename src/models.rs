//! Core data models used throughout docpipe.
//!
//! These types represent the extraction results, chunks, and chunk batches
//! that flow through the ingestion pipeline, plus the per-run statistics the
//! orchestrator reports.

use serde::Serialize;
use serde_json::{Map, Value};

use crate::extract::ExtractError;

/// Open-ended metadata attached to a document and inherited by its chunks.
///
/// Key order is insertion order, so extractor fields come out in the order
/// they were added.
pub type Metadata = Map<String, Value>;

/// Metadata keys every extractor must set.
pub const KEY_FILE_EXTENSION: &str = "file_extension";
pub const KEY_PROCESSING_METHOD: &str = "processing_method";
pub const KEY_PROCESSOR: &str = "processor";

/// Text and metadata produced for one document by the extractor registry.
#[derive(Debug)]
pub struct ExtractionResult {
    pub text: String,
    pub metadata: Metadata,
    pub success: bool,
    /// Why text extraction failed, when `success` is false.
    pub error: Option<ExtractError>,
}

/// A chunk of a document's extracted text, tagged with provenance.
#[derive(Debug, Clone, PartialEq)]
pub struct Chunk {
    pub content: String,
    pub index: usize,
    pub total_chunks: usize,
    pub document_id: String,
    pub chunk_id: String,
    pub file_name: String,
    /// Metadata inherited from the extractor.
    pub metadata: Metadata,
}

impl Chunk {
    /// Flatten into the `{content, metadata}` record shape sinks consume.
    ///
    /// Extractor fields are written first; the positional and provenance
    /// fields are written last and replace any extractor field of the same
    /// name.
    pub fn to_record(&self) -> ChunkRecord {
        let mut metadata = self.metadata.clone();
        metadata.insert("chunk_index".to_string(), Value::from(self.index));
        metadata.insert("total_chunks".to_string(), Value::from(self.total_chunks));
        metadata.insert("file_name".to_string(), Value::from(self.file_name.clone()));
        metadata.insert(
            "document_id".to_string(),
            Value::from(self.document_id.clone()),
        );
        metadata.insert("chunk_id".to_string(), Value::from(self.chunk_id.clone()));

        ChunkRecord {
            content: self.content.clone(),
            metadata,
        }
    }
}

/// A chunk as handed to a vector-store sink.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChunkRecord {
    pub content: String,
    pub metadata: Metadata,
}

/// All chunks of one document, in source order.
#[derive(Debug, Clone, Default)]
pub struct ChunkBatch {
    pub document_id: String,
    pub chunks: Vec<Chunk>,
}

impl ChunkBatch {
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn records(&self) -> Vec<ChunkRecord> {
        self.chunks.iter().map(Chunk::to_record).collect()
    }
}

/// Counters and error log for one ingestion run.
#[derive(Debug, Clone, Default, Serialize)]
pub struct IngestStats {
    pub total_files: usize,
    pub processed_files: usize,
    pub failed_files: usize,
    pub skipped_files: usize,
    pub chunks_written: usize,
    pub errors: Vec<String>,
}

impl IngestStats {
    /// A run succeeds when at least one document made it to the sink.
    pub fn success(&self) -> bool {
        self.processed_files > 0
    }

    /// Human-readable summary of the run.
    pub fn message(&self) -> String {
        let attempted = self.processed_files + self.failed_files;
        if self.processed_files == attempted && attempted > 0 {
            format!("Successfully ingested {} documents", self.processed_files)
        } else if self.processed_files > 0 {
            format!(
                "Partially successful: {}/{} documents ingested",
                self.processed_files, attempted
            )
        } else {
            format!(
                "Failed to ingest any documents. {} files failed",
                self.failed_files
            )
        }
    }
}
