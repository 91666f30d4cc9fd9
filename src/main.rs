//! # docpipe CLI
//!
//! Thin command-line front end over the `docpipe` library.
//!
//! | Command | Description |
//! |---------|-------------|
//! | `docpipe ingest <paths...>` | Ingest files and directories, writing JSONL records |
//! | `docpipe extract <file>` | Print extracted text and metadata |
//! | `docpipe chunk <file>` | Print the chunks a file would produce |
//! | `docpipe score <raw...>` | Correct `1 / distance` retrieval scores |
//!
//! ## Examples
//!
//! ```bash
//! docpipe ingest ./knowledge --output chunks.jsonl
//! docpipe --config ./docpipe.toml chunk report.pdf
//! docpipe score inf 2 0.5 N/A
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use docpipe::config::{self, Config};
use docpipe::ingest::Ingestor;
use docpipe::progress::ProgressMode;
use docpipe::score::{normalize_score, Score};
use docpipe::sink::JsonlSink;

/// Turn documents into overlap-linked chunks for a retrieval index.
#[derive(Parser)]
#[command(name = "docpipe", version, about)]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging.
    #[arg(long, short, global = true)]
    verbose: bool,

    /// Progress output on stderr. Defaults to `human` on a TTY, else `off`.
    #[arg(long, global = true, value_enum)]
    progress: Option<ProgressMode>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Ingest files and directories (scanned recursively).
    ///
    /// Writes one JSON record per chunk to `--output` (stdout by default)
    /// and prints a summary to stderr.
    Ingest {
        /// Files or directories to ingest.
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Write JSONL records here instead of stdout.
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Collection the records are destined for. Overrides the config.
        #[arg(long)]
        vector_db_id: Option<String>,
    },

    /// Print a file's extracted text and metadata.
    Extract { file: PathBuf },

    /// Print the chunks a file would produce, without writing anything.
    Chunk { file: PathBuf },

    /// Correct raw `1 / distance` scores into [0, 1] similarities.
    Score {
        /// Raw scores; `N/A` and non-numeric values pass through.
        #[arg(required = true, allow_hyphen_values = true)]
        scores: Vec<String>,
    },
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match run(cli) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            eprintln!("Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("docpipe=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("docpipe=info"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => config::load_config(path),
        None => config::validate(Config::default()),
    }
}

fn run(cli: Cli) -> Result<i32> {
    let config = load(cli.config.as_deref())?;
    let progress = cli.progress.unwrap_or_else(ProgressMode::default_for_tty);

    match cli.command {
        Commands::Ingest {
            paths,
            output,
            vector_db_id,
        } => {
            let vector_db_id = vector_db_id.unwrap_or_else(|| config.retrieval.vector_db_id.clone());
            let writer: Box<dyn Write> = match &output {
                Some(path) => Box::new(BufWriter::new(File::create(path).with_context(
                    || format!("Failed to create output file: {}", path.display()),
                )?)),
                None => Box::new(std::io::stdout().lock()),
            };
            let mut sink = JsonlSink::new(writer);

            let stats = Ingestor::new(&config)
                .with_progress(progress.reporter())
                .ingest_paths(&paths, &vector_db_id, &mut sink);

            eprintln!("{}", stats.message());
            eprintln!("  total files: {}", stats.total_files);
            eprintln!("  processed: {}", stats.processed_files);
            eprintln!("  failed: {}", stats.failed_files);
            eprintln!("  skipped: {}", stats.skipped_files);
            eprintln!("  chunks written: {}", stats.chunks_written);
            if !stats.errors.is_empty() {
                eprintln!("Errors:");
                for error in stats.errors.iter().take(5) {
                    eprintln!("  - {}", error);
                }
                if stats.errors.len() > 5 {
                    eprintln!("  ... and {} more errors", stats.errors.len() - 5);
                }
            }

            Ok(if stats.success() { 0 } else { 1 })
        }
        Commands::Extract { file } => {
            let document = Ingestor::new(&config).process_document(&file)?;
            let metadata = serde_json::to_string_pretty(&document.metadata)?;
            println!("{}", metadata);
            println!();
            println!("{}", document.text);
            Ok(0)
        }
        Commands::Chunk { file } => {
            let ingestor = Ingestor::new(&config);
            let document = ingestor.process_document(&file)?;
            let batch = ingestor.build_batch(&document);
            println!("{} chunks from {}", batch.len(), document.file_name);
            for chunk in &batch.chunks {
                println!();
                println!(
                    "--- {} ({} chars)",
                    chunk.chunk_id,
                    chunk.content.chars().count()
                );
                println!("{}", chunk.content);
            }
            Ok(0)
        }
        Commands::Score { scores } => {
            for raw in scores {
                let corrected = normalize_score(&Score::Text(raw.clone()));
                println!("{}\t{}", raw, serde_json::to_string(&corrected)?);
            }
            Ok(0)
        }
    }
}
