//! Per-document progress for ingestion runs.
//!
//! The [`Ingestor`](crate::ingest::Ingestor) emits one event when a directory
//! scan finishes and one per document once its outcome is known. Reporters
//! write to stderr; stdout is reserved for JSONL records.

use std::io::Write;

use serde::Serialize;

/// What happened to a single document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum DocumentOutcome {
    Ingested { chunks: usize },
    Skipped { reason: String },
    Failed { error: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum IngestProgressEvent {
    /// A directory scan finished with `files` candidates.
    Scanned { root: String, files: usize },
    /// Document `position` of `total` (1-based) reached its outcome.
    Document {
        position: usize,
        total: usize,
        file: String,
        outcome: DocumentOutcome,
    },
}

impl IngestProgressEvent {
    /// One-line rendering for terminals, e.g. `[ 3/12] report.pdf: 8 chunks`.
    pub fn to_human(&self) -> String {
        match self {
            IngestProgressEvent::Scanned { root, files } => {
                format!("scanned {}: {} files", root, files)
            }
            IngestProgressEvent::Document {
                position,
                total,
                file,
                outcome,
            } => {
                let width = total.to_string().len();
                let status = match outcome {
                    DocumentOutcome::Ingested { chunks: 1 } => "1 chunk".to_string(),
                    DocumentOutcome::Ingested { chunks } => format!("{} chunks", chunks),
                    DocumentOutcome::Skipped { reason } => format!("skipped ({})", reason),
                    DocumentOutcome::Failed { error } => format!("FAILED ({})", error),
                };
                format!(
                    "[{:>width$}/{}] {}: {}",
                    position,
                    total,
                    file,
                    status,
                    width = width
                )
            }
        }
    }
}

/// Receives progress events from an ingestion run.
pub trait IngestProgressReporter: Send + Sync {
    fn report(&self, event: &IngestProgressEvent);
}

/// Human-readable lines on stderr.
pub struct HumanProgress;

impl IngestProgressReporter for HumanProgress {
    fn report(&self, event: &IngestProgressEvent) {
        let mut stderr = std::io::stderr().lock();
        let _ = writeln!(stderr, "{}", event.to_human());
    }
}

/// One JSON object per event on stderr.
pub struct JsonProgress;

impl IngestProgressReporter for JsonProgress {
    fn report(&self, event: &IngestProgressEvent) {
        if let Ok(line) = serde_json::to_string(event) {
            let mut stderr = std::io::stderr().lock();
            let _ = writeln!(stderr, "{}", line);
        }
    }
}

pub struct NoProgress;

impl IngestProgressReporter for NoProgress {
    fn report(&self, _event: &IngestProgressEvent) {}
}

/// `--progress` values for the CLI.
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// `human` when stderr is a terminal, `off` otherwise.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(self) -> Box<dyn IngestProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(HumanProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
