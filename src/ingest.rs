//! Ingestion orchestration.
//!
//! Coordinates the per-document flow: validation → extraction → chunking →
//! metadata enrichment → sink. Every document is handled in isolation: a
//! failure is recorded in [`IngestStats`] and the run moves on to the next
//! one. A document's chunks reach the sink as one batch or not at all.

use std::path::{Component, Path, PathBuf};

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::chunk::chunk_text;
use crate::config::Config;
use crate::error::IngestError;
use crate::extract::{extension_of, ExtractError, Extractor, ExtractorRegistry};
use crate::models::{Chunk, ChunkBatch, IngestStats, Metadata};
use crate::progress::{
    DocumentOutcome, IngestProgressEvent, IngestProgressReporter, NoProgress,
};
use crate::scan::scan_directory;
use crate::sink::ChunkSink;

/// A validated document whose text has been extracted.
#[derive(Debug)]
pub struct ExtractedDocument {
    pub file_name: String,
    pub size_bytes: u64,
    pub extractor: Extractor,
    pub text: String,
    pub metadata: Metadata,
}

/// Drives documents from disk into a [`ChunkSink`].
pub struct Ingestor<'a> {
    config: &'a Config,
    registry: ExtractorRegistry,
    progress: Box<dyn IngestProgressReporter>,
}

impl<'a> Ingestor<'a> {
    pub fn new(config: &'a Config) -> Self {
        Self {
            config,
            registry: ExtractorRegistry::new(),
            progress: Box::new(NoProgress),
        }
    }

    pub fn with_progress(mut self, progress: Box<dyn IngestProgressReporter>) -> Self {
        self.progress = progress;
        self
    }

    /// Validate `path` and extract its text and metadata.
    ///
    /// Rejects unsafe paths, oversize files, unsupported formats, failed
    /// extractions and documents with no usable text.
    pub fn process_document(&self, path: &Path) -> Result<ExtractedDocument, IngestError> {
        let file_name = display_name(path);

        if !is_safe_path(path) {
            return Err(IngestError::UnsafePath(path.to_path_buf()));
        }

        let size_bytes = std::fs::metadata(path)
            .map_err(|source| IngestError::Stat {
                name: file_name.clone(),
                source,
            })?
            .len();
        let limit = self.config.ingest.max_document_size;
        if size_bytes > limit {
            return Err(IngestError::Oversize {
                name: file_name,
                size: size_bytes,
                limit,
            });
        }

        let extension = extension_of(path).unwrap_or_default();
        if !self.config.ingest.is_supported(&extension) {
            return Err(IngestError::UnsupportedFormat {
                name: file_name,
                extension,
            });
        }

        info!(
            "Processing file: {} ({:.1}MB)",
            path.display(),
            size_bytes as f64 / (1024.0 * 1024.0)
        );

        let (extractor, result) = self.registry.extract(path);
        if !result.success {
            let reason = result
                .error
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_else(|| "unknown error".to_string());
            return Err(match result.error {
                Some(ExtractError::Decode(_)) => IngestError::Decode {
                    name: file_name,
                    reason,
                },
                _ => IngestError::Extraction {
                    name: file_name,
                    reason,
                },
            });
        }

        if result.text.trim().is_empty() {
            return Err(IngestError::EmptyText { name: file_name });
        }

        info!(
            "Successfully processed {}: {} characters extracted",
            path.display(),
            result.text.chars().count()
        );

        Ok(ExtractedDocument {
            file_name,
            size_bytes,
            extractor,
            text: result.text,
            metadata: result.metadata,
        })
    }

    /// Chunk an extracted document and attach provenance to every chunk.
    pub fn build_batch(&self, document: &ExtractedDocument) -> ChunkBatch {
        let pieces = chunk_text(
            &document.text,
            self.config.chunking.chunk_size,
            self.config.chunking.chunk_overlap,
        );
        let document_id = document
            .metadata
            .get("document_id")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| document.file_name.clone());

        let total_chunks = pieces.len();
        let chunks = pieces
            .into_iter()
            .enumerate()
            .map(|(index, content)| Chunk {
                content,
                index,
                total_chunks,
                chunk_id: format!("{}_chunk_{}", document_id, index),
                document_id: document_id.clone(),
                file_name: document.file_name.clone(),
                metadata: document.metadata.clone(),
            })
            .collect();

        ChunkBatch {
            document_id,
            chunks,
        }
    }

    /// Run one document end to end and hand its batch to `sink`.
    ///
    /// Returns the number of chunks written.
    pub fn ingest_file(
        &self,
        path: &Path,
        vector_db_id: &str,
        sink: &mut dyn ChunkSink,
    ) -> Result<usize, IngestError> {
        let document = self.process_document(path)?;
        let batch = self.build_batch(&document);
        if batch.is_empty() {
            return Err(IngestError::EmptyText {
                name: document.file_name,
            });
        }

        sink.insert(vector_db_id, &batch)
            .map_err(|e| IngestError::Sink {
                name: document.file_name.clone(),
                reason: format!("{:#}", e),
            })?;

        info!(
            "Successfully processed {}: {} chunks",
            document.file_name,
            batch.len()
        );
        Ok(batch.len())
    }

    /// Ingest `paths` in order, isolating per-document failures.
    pub fn ingest_files(
        &self,
        paths: &[PathBuf],
        vector_db_id: &str,
        sink: &mut dyn ChunkSink,
    ) -> IngestStats {
        let mut stats = IngestStats {
            total_files: paths.len(),
            ..Default::default()
        };

        for (i, path) in paths.iter().enumerate() {
            let outcome = match self.ingest_file(path, vector_db_id, sink) {
                Ok(chunks) => {
                    stats.processed_files += 1;
                    stats.chunks_written += chunks;
                    DocumentOutcome::Ingested { chunks }
                }
                Err(e) if e.is_skip() => {
                    debug!("Skipping: {}", e);
                    stats.skipped_files += 1;
                    DocumentOutcome::Skipped {
                        reason: e.to_string(),
                    }
                }
                Err(e) => {
                    match &e {
                        IngestError::Oversize { .. } | IngestError::EmptyText { .. } => {
                            warn!("{}", e)
                        }
                        _ => error!("{}", e),
                    }
                    let message = e.to_string();
                    stats.failed_files += 1;
                    stats.errors.push(message.clone());
                    DocumentOutcome::Failed { error: message }
                }
            };

            self.progress.report(&IngestProgressEvent::Document {
                position: i + 1,
                total: paths.len(),
                file: display_name(path),
                outcome,
            });
        }

        info!("Ingestion complete: {}", stats.message());
        stats
    }

    /// Ingest a mix of files and directories; directories are scanned
    /// recursively. A directory that cannot be scanned counts as one failure.
    pub fn ingest_paths(
        &self,
        inputs: &[PathBuf],
        vector_db_id: &str,
        sink: &mut dyn ChunkSink,
    ) -> IngestStats {
        let mut files = Vec::new();
        let mut scan_errors = Vec::new();

        for input in inputs {
            if input.is_dir() {
                match scan_directory(input, &self.config.ingest) {
                    Ok(found) => {
                        self.progress.report(&IngestProgressEvent::Scanned {
                            root: input.display().to_string(),
                            files: found.len(),
                        });
                        files.extend(found);
                    }
                    Err(e) => {
                        error!("Failed to scan {}: {:#}", input.display(), e);
                        scan_errors.push(format!("{:#}", e));
                    }
                }
            } else {
                files.push(input.clone());
            }
        }

        let mut stats = self.ingest_files(&files, vector_db_id, sink);
        stats.failed_files += scan_errors.len();
        stats.errors.extend(scan_errors);
        stats
    }
}

/// True when `path` has no `..` components and names an existing regular
/// file.
pub fn is_safe_path(path: &Path) -> bool {
    if path.components().any(|c| matches!(c, Component::ParentDir)) {
        return false;
    }
    path.is_file()
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_else(|| path.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemorySink;
    use std::fs;
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Default)]
    struct RecordingProgress(Arc<Mutex<Vec<IngestProgressEvent>>>);

    impl IngestProgressReporter for RecordingProgress {
        fn report(&self, event: &IngestProgressEvent) {
            self.0.lock().unwrap().push(event.clone());
        }
    }

    fn small_config() -> Config {
        let mut config = Config::default();
        config.chunking.chunk_size = 40;
        config.chunking.chunk_overlap = 5;
        config
    }

    #[test]
    fn traversal_is_unsafe_even_if_missing() {
        assert!(!is_safe_path(Path::new("../../etc/passwd")));
        assert!(!is_safe_path(Path::new("docs/../secret.txt")));
    }

    #[test]
    fn dots_inside_a_file_name_are_not_traversal() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("a..b.txt");
        fs::write(&file, "Release notes for 1..2 upgrades.").unwrap();
        assert!(is_safe_path(&file));

        let config = Config::default();
        let document = Ingestor::new(&config).process_document(&file).unwrap();
        assert_eq!(document.file_name, "a..b.txt");

        let escaped = dir.path().join("nested").join("..").join("a..b.txt");
        assert!(!is_safe_path(&escaped));
    }

    #[test]
    fn directories_and_missing_files_are_unsafe() {
        let dir = tempfile::tempdir().unwrap();
        assert!(!is_safe_path(dir.path()));
        assert!(!is_safe_path(&dir.path().join("missing.txt")));
        let file = dir.path().join("ok.txt");
        fs::write(&file, "x").unwrap();
        assert!(is_safe_path(&file));
    }

    #[test]
    fn unsafe_path_is_rejected() {
        let config = Config::default();
        let ingestor = Ingestor::new(&config);
        let err = ingestor
            .process_document(Path::new("../../etc/passwd"))
            .unwrap_err();
        assert!(matches!(err, IngestError::UnsafePath(_)));
    }

    #[test]
    fn unsupported_format_is_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slides.docx");
        fs::write(&path, "binary").unwrap();

        let config = Config::default();
        let mut sink = MemorySink::new();
        let stats = Ingestor::new(&config).ingest_files(&[path], "db", &mut sink);
        assert_eq!(stats.skipped_files, 1);
        assert_eq!(stats.failed_files, 0);
        assert!(stats.errors.is_empty());
        assert!(sink.batches().is_empty());
    }

    #[test]
    fn whitespace_only_document_fails_with_empty_text() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        fs::write(&path, "  \n\t ").unwrap();

        let config = Config::default();
        let err = Ingestor::new(&config).process_document(&path).unwrap_err();
        assert!(matches!(err, IngestError::EmptyText { .. }));
    }

    #[test]
    fn invalid_utf8_text_fails_with_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("latin1.txt");
        fs::write(&path, [b'c', b'a', b'f', 0xe9]).unwrap();

        let config = Config::default();
        let err = Ingestor::new(&config).process_document(&path).unwrap_err();
        assert!(matches!(err, IngestError::Decode { .. }), "{:?}", err);
    }

    #[test]
    fn batch_carries_provenance() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(
            &path,
            "The first sentence is here. The second one follows. A third ends it.",
        )
        .unwrap();

        let config = small_config();
        let ingestor = Ingestor::new(&config);
        let document = ingestor.process_document(&path).unwrap();
        let batch = ingestor.build_batch(&document);

        assert_eq!(batch.document_id, "notes.txt");
        assert_eq!(batch.len(), 3);
        for (i, chunk) in batch.chunks.iter().enumerate() {
            assert_eq!(chunk.index, i);
            assert_eq!(chunk.total_chunks, 3);
            assert_eq!(chunk.chunk_id, format!("notes.txt_chunk_{}", i));
        }

        let record = &batch.records()[1];
        assert_eq!(record.metadata["processor"], "none");
        assert_eq!(record.metadata["chunk_index"], 1);
        assert_eq!(record.metadata["file_name"], "notes.txt");
    }

    #[test]
    fn extractor_document_id_wins_over_file_name() {
        let config = Config::default();
        let ingestor = Ingestor::new(&config);
        let mut metadata = Metadata::new();
        metadata.insert("document_id".to_string(), Value::from("VEX-2024-01"));
        let document = ExtractedDocument {
            file_name: "vex.json".to_string(),
            size_bytes: 10,
            extractor: Extractor::Json,
            text: "short".to_string(),
            metadata,
        };

        let batch = ingestor.build_batch(&document);
        assert_eq!(batch.document_id, "VEX-2024-01");
        assert_eq!(batch.chunks[0].chunk_id, "VEX-2024-01_chunk_0");
    }

    #[test]
    fn oversize_document_is_isolated() {
        let dir = tempfile::tempdir().unwrap();
        let a = dir.path().join("a.txt");
        let b = dir.path().join("b.txt");
        let c = dir.path().join("c.txt");
        fs::write(&a, "Alpha document.").unwrap();
        fs::write(&b, "B".repeat(200)).unwrap();
        fs::write(&c, "Gamma document.").unwrap();

        let mut config = Config::default();
        config.ingest.max_document_size = 100;
        let mut sink = MemorySink::new();
        let stats = Ingestor::new(&config).ingest_files(&[a, b, c], "db", &mut sink);

        assert_eq!(stats.processed_files, 2);
        assert_eq!(stats.failed_files, 1);
        assert_eq!(stats.errors.len(), 1);
        assert!(stats.errors[0].contains("b.txt"));
        assert!(stats.errors[0].contains("exceeds maximum size"));

        let ids: Vec<&str> = sink
            .batches()
            .iter()
            .map(|(_, batch)| batch.document_id.as_str())
            .collect();
        assert_eq!(ids, vec!["a.txt", "c.txt"]);
    }

    struct FailingSink;

    impl ChunkSink for FailingSink {
        fn insert(&mut self, _vector_db_id: &str, _batch: &ChunkBatch) -> anyhow::Result<()> {
            anyhow::bail!("connection refused")
        }
    }

    #[test]
    fn sink_failure_counts_as_document_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.txt");
        fs::write(&path, "Some text.").unwrap();

        let config = Config::default();
        let stats = Ingestor::new(&config).ingest_files(&[path], "db", &mut FailingSink);
        assert_eq!(stats.failed_files, 1);
        assert!(stats.errors[0].contains("connection refused"));
        assert!(!stats.success());
    }

    #[test]
    fn progress_reports_each_document_outcome() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.txt"), "Alpha document.").unwrap();
        fs::write(dir.path().join("b.png"), [0u8, 1]).unwrap();
        fs::write(dir.path().join("c.txt"), " \n ").unwrap();

        let config = Config::default();
        let recorder = RecordingProgress::default();
        let mut sink = MemorySink::new();
        let stats = Ingestor::new(&config)
            .with_progress(Box::new(recorder.clone()))
            .ingest_paths(&[dir.path().to_path_buf()], "db", &mut sink);
        assert_eq!(stats.total_files, 3);

        let events = recorder.0.lock().unwrap();
        assert_eq!(events.len(), 4);
        assert_eq!(
            events[0],
            IngestProgressEvent::Scanned {
                root: dir.path().display().to_string(),
                files: 3,
            }
        );

        let outcomes: Vec<(usize, &str, &DocumentOutcome)> = events[1..]
            .iter()
            .map(|event| match event {
                IngestProgressEvent::Document {
                    position,
                    file,
                    outcome,
                    ..
                } => (*position, file.as_str(), outcome),
                other => panic!("unexpected event {:?}", other),
            })
            .collect();
        assert_eq!(outcomes[0].0, 1);
        assert_eq!(outcomes[0].1, "a.txt");
        assert_eq!(outcomes[0].2, &DocumentOutcome::Ingested { chunks: 1 });
        assert!(matches!(outcomes[1].2, DocumentOutcome::Skipped { .. }));
        match outcomes[2].2 {
            DocumentOutcome::Failed { error } => assert_eq!(error, &stats.errors[0]),
            other => panic!("expected failure, got {:?}", other),
        }
    }
}
