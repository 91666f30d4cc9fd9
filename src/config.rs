//! TOML configuration.
//!
//! Every field has a default, so an empty file (or no file at all, via
//! [`Config::default`]) yields a working pipeline.
//!
//! ```toml
//! [chunking]
//! chunk_size = 1000
//! chunk_overlap = 200
//!
//! [ingest]
//! max_document_size = 104857600
//! supported_formats = ["pdf", "json", "txt"]
//! exclude_globs = ["**/drafts/**"]
//!
//! [retrieval]
//! vector_db_id = "docpipe"
//! vector_db_provider = "pgvector"
//! ```

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub chunking: ChunkingConfig,
    #[serde(default)]
    pub ingest: IngestConfig,
    #[serde(default)]
    pub retrieval: RetrievalConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ChunkingConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}
fn default_chunk_overlap() -> usize {
    200
}

#[derive(Debug, Deserialize, Clone)]
pub struct IngestConfig {
    /// Ceiling in bytes; larger documents are rejected, not truncated.
    #[serde(default = "default_max_document_size")]
    pub max_document_size: u64,
    /// Allowed extensions, lowercase without the leading dot.
    #[serde(default = "default_supported_formats")]
    pub supported_formats: Vec<String>,
    /// Extra glob patterns skipped during directory scans.
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_document_size: default_max_document_size(),
            supported_formats: default_supported_formats(),
            exclude_globs: Vec::new(),
        }
    }
}

impl IngestConfig {
    pub fn is_supported(&self, extension: &str) -> bool {
        self.supported_formats.iter().any(|f| f == extension)
    }
}

fn default_max_document_size() -> u64 {
    100 * 1024 * 1024
}
fn default_supported_formats() -> Vec<String> {
    vec!["pdf".to_string(), "json".to_string(), "txt".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct RetrievalConfig {
    #[serde(default = "default_vector_db_id")]
    pub vector_db_id: String,
    /// Backend that produced retrieval scores; `"pgvector"` enables score
    /// correction.
    #[serde(default)]
    pub vector_db_provider: String,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            vector_db_id: default_vector_db_id(),
            vector_db_provider: String::new(),
        }
    }
}

fn default_vector_db_id() -> String {
    "docpipe".to_string()
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;
    validate(config)
}

/// Check invariants and normalize supported formats.
pub fn validate(mut config: Config) -> Result<Config> {
    if config.chunking.chunk_size == 0 {
        anyhow::bail!("chunking.chunk_size must be > 0");
    }

    if config.chunking.chunk_overlap >= config.chunking.chunk_size {
        anyhow::bail!(
            "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
            config.chunking.chunk_overlap,
            config.chunking.chunk_size
        );
    }

    if config.ingest.max_document_size == 0 {
        anyhow::bail!("ingest.max_document_size must be > 0");
    }

    config.ingest.supported_formats = config
        .ingest
        .supported_formats
        .iter()
        .map(|f| f.trim().trim_start_matches('.').to_lowercase())
        .filter(|f| !f.is_empty())
        .collect();

    if config.ingest.supported_formats.is_empty() {
        anyhow::bail!("ingest.supported_formats must list at least one extension");
    }

    Ok(config)
}
