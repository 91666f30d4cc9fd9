//! Destinations for finished chunk batches.
//!
//! The orchestrator hands each document's [`ChunkBatch`] to a [`ChunkSink`]
//! in a single call, so a sink sees either a document's whole batch or none
//! of it. Writing to an actual vector store is the caller's business; this
//! module ships an in-memory sink for tests and dry runs, and a JSON Lines
//! sink for handing records to another process.

use std::io::Write;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::models::{ChunkBatch, ChunkRecord};

/// Receives one document's chunk batch at a time.
pub trait ChunkSink {
    /// Insert every record of `batch` into the collection `vector_db_id`.
    fn insert(&mut self, vector_db_id: &str, batch: &ChunkBatch) -> Result<()>;
}

/// Collects batches in memory.
#[derive(Debug, Default)]
pub struct MemorySink {
    batches: Vec<(String, ChunkBatch)>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Batches in insertion order, with the collection each was written to.
    pub fn batches(&self) -> &[(String, ChunkBatch)] {
        &self.batches
    }

    pub fn records(&self) -> Vec<ChunkRecord> {
        self.batches
            .iter()
            .flat_map(|(_, batch)| batch.records())
            .collect()
    }
}

impl ChunkSink for MemorySink {
    fn insert(&mut self, vector_db_id: &str, batch: &ChunkBatch) -> Result<()> {
        self.batches.push((vector_db_id.to_string(), batch.clone()));
        Ok(())
    }
}

#[derive(Serialize)]
struct JsonlLine<'a> {
    vector_db_id: &'a str,
    #[serde(flatten)]
    record: &'a ChunkRecord,
}

/// Writes one JSON object per record: `{vector_db_id, content, metadata}`.
///
/// A batch is serialized in full before any of it is written, so a
/// serialization failure leaves the output untouched.
pub struct JsonlSink<W: Write> {
    writer: W,
}

impl<W: Write> JsonlSink<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> ChunkSink for JsonlSink<W> {
    fn insert(&mut self, vector_db_id: &str, batch: &ChunkBatch) -> Result<()> {
        let mut buf = Vec::new();
        for record in batch.records() {
            let line = JsonlLine {
                vector_db_id,
                record: &record,
            };
            serde_json::to_writer(&mut buf, &line)
                .with_context(|| format!("Failed to serialize {}", batch.document_id))?;
            buf.push(b'\n');
        }
        self.writer
            .write_all(&buf)
            .with_context(|| format!("Failed to write batch for {}", batch.document_id))?;
        self.writer.flush()?;
        Ok(())
    }
}
