//! # docpipe
//!
//! Document ingestion for retrieval indexes: turns PDF, JSON and plain-text
//! files into bounded, overlap-linked text chunks with provenance metadata,
//! and corrects retrieval scores from backends that report `1 / distance`.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────┐   ┌────────────┐   ┌─────────┐   ┌────────────┐   ┌──────┐
//! │  files   │──▶│ Extractor  │──▶│ Chunker │──▶│ provenance │──▶│ sink │
//! │ dir scan │   │ PDF/JSON/… │   │         │   │  metadata  │   │      │
//! └──────────┘   └────────────┘   └─────────┘   └────────────┘   └──────┘
//!
//!                 query time:  retrieved chunks ──▶ score correction
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use docpipe::config::Config;
//! use docpipe::ingest::Ingestor;
//! use docpipe::sink::MemorySink;
//! use std::path::PathBuf;
//!
//! let config = Config::default();
//! let mut sink = MemorySink::new();
//! let stats = Ingestor::new(&config).ingest_paths(
//!     &[PathBuf::from("./knowledge")],
//!     &config.retrieval.vector_db_id,
//!     &mut sink,
//! );
//! println!("{}", stats.message());
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Core data types |
//! | [`extract`] | Format-specific text and metadata extraction |
//! | [`chunk`] | Sentence-aware chunking with overlap |
//! | [`ingest`] | Validation, chunking and batching per document |
//! | [`scan`] | Recursive directory discovery |
//! | [`sink`] | Chunk batch destinations |
//! | [`score`] | Retrieval score correction |
//! | [`progress`] | Progress reporting on stderr |

pub mod chunk;
pub mod config;
pub mod error;
pub mod extract;
pub mod ingest;
pub mod models;
pub mod progress;
pub mod scan;
pub mod score;
pub mod sink;
