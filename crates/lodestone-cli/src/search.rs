//! Pipeline construction from a corpus file.
//!
//! Loads the JSONL corpus, indexes every document into the in-memory BM25
//! and vector sources, and assembles a [`HybridPipeline`] from the resolved
//! options.

use anyhow::{bail, Context, Result};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

use lodestone_core::corpus::Corpus;
use lodestone_core::embedding::{Embedder, HashingEmbedder};
use lodestone_core::search::{
    HybridPipeline, InMemoryLexicalSource, InMemoryVectorSource, TokenOverlapEncoder,
};

use crate::config::Options;

/// The pipeline type the CLI runs.
pub type CliPipeline =
    HybridPipeline<InMemoryLexicalSource, InMemoryVectorSource, HashingEmbedder>;

/// Loads the corpus and builds a fully indexed pipeline.
pub fn build_pipeline(corpus_path: &Path, options: &Options) -> Result<(Corpus, CliPipeline)> {
    let corpus = Corpus::load(corpus_path)
        .with_context(|| format!("Failed to load corpus: {}", corpus_path.display()))?;
    if corpus.is_empty() {
        bail!("Corpus {} contains no documents", corpus_path.display());
    }

    let embedder = HashingEmbedder::default();
    let mut lexical = InMemoryLexicalSource::new();
    let mut vector = InMemoryVectorSource::new(embedder.dim());

    for record in corpus.iter() {
        lexical.add_document(
            &record.doc_id,
            [("title", record.title.as_str()), ("body", record.body.as_str())],
        );
        let embedding = embedder
            .embed(&record.text())
            .with_context(|| format!("Failed to embed document {}", record.doc_id))?;
        vector
            .insert(&record.doc_id, embedding)
            .with_context(|| format!("Failed to index document {}", record.doc_id))?;
    }
    info!(documents = corpus.len(), "Indexed corpus");

    let mut pipeline =
        HybridPipeline::new(lexical, vector, embedder, options.fusion.clone())
            .context("Failed to build search pipeline")?
            .with_top_n(options.top_n)
            .with_candidate_pool(options.candidates);

    if options.rerank {
        // Pool the full candidate set; the stage enforces pool >= top_n.
        pipeline = pipeline.with_reranker(
            Arc::new(TokenOverlapEncoder),
            options.candidates.max(options.top_n),
            Arc::new(corpus.clone()),
        );
    }

    Ok((corpus, pipeline))
}
