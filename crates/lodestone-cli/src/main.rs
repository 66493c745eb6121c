//! Lodestone CLI - hybrid search over a JSONL corpus.
//!
//! # Usage
//!
//! ```bash
//! # Search a corpus
//! lodestone search "rotate access key" --corpus tickets.jsonl
//! lodestone search "query" --corpus tickets.jsonl --blend rrf --top-n 5
//! lodestone search "query" --corpus tickets.jsonl --rerank --json
//!
//! # Evaluate retrieval quality against labeled judgments
//! lodestone eval --corpus tickets.jsonl --queries judgments.jsonl --per-query
//!
//! # Show help
//! lodestone --help
//! ```

mod config;
mod eval;
mod output;
mod search;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Lodestone hybrid search CLI.
///
/// Blends BM25 lexical search and embedding vector search over a JSONL
/// corpus, with optional cross-encoder reranking.
#[derive(Parser)]
#[command(name = "lodestone", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Command {
    /// Search the corpus and print the fused ranking
    Search {
        /// Search query
        query: String,

        #[command(flatten)]
        common: CommonArgs,

        /// Output results as JSON
        #[arg(long)]
        json: bool,
    },
    /// Evaluate MRR@N and Recall@N over a labeled judgment set
    Eval {
        /// Path to the judgments JSONL file (query + relevant doc ids per line)
        #[arg(long)]
        queries: PathBuf,

        #[command(flatten)]
        common: CommonArgs,

        /// Print per-query reciprocal rank and recall
        #[arg(long)]
        per_query: bool,

        /// Output the report as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Flags shared by `search` and `eval`.
///
/// Every tuning flag is optional; unset flags fall back to the config file
/// (if `--config` is given) and then to built-in defaults.
#[derive(Args)]
struct CommonArgs {
    /// Path to the corpus JSONL file
    #[arg(long)]
    corpus: PathBuf,

    /// Optional JSON config file with defaults for the flags below
    #[arg(long)]
    config: Option<PathBuf>,

    /// Fusion strategy: weighted | rrf [default: weighted]
    #[arg(long)]
    blend: Option<config::BlendArg>,

    /// Number of results to return [default: 10]
    #[arg(long)]
    top_n: Option<usize>,

    /// Per-source candidate pool fetched before fusion [default: 50]
    #[arg(long)]
    candidates: Option<usize>,

    /// Weight for the lexical source (weighted blend only) [default: 0.6]
    #[arg(long)]
    w_lexical: Option<f32>,

    /// Weight for the vector source (weighted blend only) [default: 0.4]
    #[arg(long)]
    w_vector: Option<f32>,

    /// RRF k constant (rrf blend only) [default: 60]
    #[arg(long)]
    rrf_k: Option<u32>,

    /// Rerank the fused pool with the cross-encoder
    #[arg(long)]
    rerank: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::new("warn")
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    match cli.command {
        Command::Search {
            query,
            common,
            json,
        } => {
            let options = config::resolve(&common)?;
            let (corpus, pipeline) = search::build_pipeline(&common.corpus, &options)?;
            let response = pipeline.search(&query).await?;

            let rendered = if json {
                output::format_json(&query, &response, &corpus)
            } else {
                output::format_human(&query, &response, &corpus)
            };
            println!("{rendered}");
        }
        Command::Eval {
            queries,
            common,
            per_query,
            json,
        } => {
            let options = config::resolve(&common)?;
            let (_, pipeline) = search::build_pipeline(&common.corpus, &options)?;
            let report = eval::run(&pipeline, &queries, options.top_n).await?;

            let rendered = if json {
                eval::format_json(&report)
            } else {
                eval::format_human(&report, per_query)
            };
            println!("{rendered}");
        }
    }

    Ok(())
}
