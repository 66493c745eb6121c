//! The hybrid search pipeline: `retrieve → fuse → [rerank]`.
//!
//! [`HybridPipeline`] orchestrates one query end to end:
//!
//! 1. The lexical and vector retrievals have no data dependency on each
//!    other, so they are issued concurrently and joined before fusion;
//!    end-to-end retrieval latency is the max of the two, not their sum.
//! 2. A source failure degrades gracefully: the pipeline substitutes an
//!    explicit empty [`RankedList`] for that source, logs it, and names the
//!    source in [`SearchResponse::degraded_sources`] so callers can tell a
//!    down source from one that matched nothing. Fusion's missing-score
//!    policy then yields a single-source ranking. Scoring errors are
//!    different: they abort the request.
//! 3. Fusion blends the two lists per the immutable [`FusionConfig`].
//! 4. The rerank stage is either the identity or a cross-encoder reorder of
//!    the top of the fused pool ([`RerankStage`]).
//!
//! Nothing here mutates shared state: the config is read-only per request
//! and all lists are constructed fresh per query, so one pipeline value can
//! serve concurrent queries without locking.

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::FusionConfig;
use crate::corpus::TextLookup;
use crate::embedding::Embedder;
use crate::error::SearchError;

use super::fusion::fuse;
use super::lexical::LexicalSource;
use super::rerank::{CrossEncoder, RerankStage};
use super::types::{RankedList, ScoredDocument, LEXICAL_SOURCE, VECTOR_SOURCE};
use super::vector::VectorSource;

/// Default number of results returned per query.
pub const DEFAULT_TOP_N: usize = 10;

/// Default per-source candidate pool fetched before fusion.
pub const DEFAULT_CANDIDATE_POOL: usize = 50;

/// One query's ranked results plus retrieval metadata.
///
/// Degradation is part of the response, not just the logs: a caller can
/// always tell "this source matched nothing" apart from "this source was
/// down" by checking `degraded_sources`.
#[derive(Debug, Clone, Serialize)]
pub struct SearchResponse {
    /// Fused (or reranked) ranking, truncated to the configured top-N.
    pub results: Vec<ScoredDocument>,
    /// Names of sources that were unavailable for this query and were
    /// substituted with an empty list before fusion.
    pub degraded_sources: Vec<String>,
}

impl SearchResponse {
    /// A response with no degraded sources.
    pub fn new(results: Vec<ScoredDocument>) -> Self {
        Self {
            results,
            degraded_sources: Vec::new(),
        }
    }
}

/// A query-in, ranking-out search pipeline.
///
/// The seam the evaluator drives, so that fusion strategies and rerank
/// stages can be swapped for ablation runs (or stubbed entirely in tests).
#[async_trait]
pub trait SearchPipeline: Send + Sync {
    /// Runs one query through the full pipeline.
    async fn run(&self, query: &str) -> Result<SearchResponse, SearchError>;
}

/// Hybrid lexical + vector pipeline with fusion and optional reranking.
pub struct HybridPipeline<L, V, E> {
    lexical: L,
    vector: V,
    embedder: E,
    config: FusionConfig,
    field_weights: BTreeMap<String, f32>,
    candidate_pool: usize,
    top_n: usize,
    rerank: RerankStage,
    texts: Option<Arc<dyn TextLookup>>,
}

impl<L, V, E> HybridPipeline<L, V, E>
where
    L: LexicalSource,
    V: VectorSource,
    E: Embedder,
{
    /// Builds a pipeline with default field weights (title and body at 1.0),
    /// pool sizes, and no reranking.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `config` fails validation; bad
    /// configuration is surfaced here, before any query executes.
    pub fn new(lexical: L, vector: V, embedder: E, config: FusionConfig) -> Result<Self, SearchError> {
        config.validate()?;
        let mut field_weights = BTreeMap::new();
        field_weights.insert("title".to_string(), 1.0);
        field_weights.insert("body".to_string(), 1.0);
        Ok(Self {
            lexical,
            vector,
            embedder,
            config,
            field_weights,
            candidate_pool: DEFAULT_CANDIDATE_POOL,
            top_n: DEFAULT_TOP_N,
            rerank: RerankStage::Identity,
            texts: None,
        })
    }

    /// Replaces the lexical field weights.
    pub fn with_field_weights(mut self, field_weights: BTreeMap<String, f32>) -> Self {
        self.field_weights = field_weights;
        self
    }

    /// Sets the per-source candidate pool fetched before fusion.
    pub fn with_candidate_pool(mut self, candidate_pool: usize) -> Self {
        self.candidate_pool = candidate_pool;
        self
    }

    /// Sets the number of results returned per query.
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n;
        self
    }

    /// Enables the cross-encoder rerank stage over the top `pool_size`
    /// fused candidates, with `texts` supplying document text to the
    /// encoder.
    pub fn with_reranker(
        mut self,
        encoder: Arc<dyn CrossEncoder>,
        pool_size: usize,
        texts: Arc<dyn TextLookup>,
    ) -> Self {
        self.rerank = RerankStage::CrossEncoder { encoder, pool_size };
        self.texts = Some(texts);
        self
    }

    /// Runs one query: concurrent retrieval, fusion, optional rerank,
    /// truncation to the configured top-N.
    ///
    /// A source that reports itself unavailable degrades the query to the
    /// remaining source and is named in the response's `degraded_sources`.
    pub async fn search(&self, query: &str) -> Result<SearchResponse, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "Query text cannot be empty".to_string(),
            ));
        }
        if self.top_n == 0 {
            return Err(SearchError::InvalidQuery(
                "Number of results (top_n) must be greater than 0".to_string(),
            ));
        }
        if let RerankStage::CrossEncoder { pool_size, .. } = &self.rerank {
            // M >= N: reranking a pool smaller than the returned page is a
            // caller configuration error; the pool is never silently grown.
            if *pool_size < self.top_n {
                return Err(SearchError::Config(format!(
                    "rerank pool ({pool_size}) is smaller than top_n ({})",
                    self.top_n
                )));
            }
        }

        let query_vector = self.embedder.embed(query)?;

        // Independent retrievals, issued concurrently and joined before
        // fusion.
        let (lexical_result, vector_result) = futures::join!(
            self.lexical
                .search(query, &self.field_weights, self.candidate_pool),
            self.vector.search(&query_vector, self.candidate_pool),
        );

        let mut degraded_sources = Vec::new();
        let lexical_list =
            Self::recover_source(LEXICAL_SOURCE, lexical_result, &mut degraded_sources)?;
        let vector_list =
            Self::recover_source(VECTOR_SOURCE, vector_result, &mut degraded_sources)?;
        debug!(
            lexical_hits = lexical_list.len(),
            vector_hits = vector_list.len(),
            "Retrieval complete"
        );

        let fused = fuse(&[lexical_list, vector_list], &self.config)?;

        let texts = self.texts.clone();
        let lookup = move |doc_id: &str| -> Option<String> {
            texts.as_ref().and_then(|t| t.text(doc_id))
        };
        let mut results = self.rerank.apply(query, fused, &lookup).await?;
        results.truncate(self.top_n);

        info!(
            results = results.len(),
            degraded = degraded_sources.len(),
            "Search complete"
        );
        Ok(SearchResponse {
            results,
            degraded_sources,
        })
    }

    /// Degrades an unavailable source to an explicit empty list and records
    /// it in `degraded`; any other error (scoring, dimension, query) aborts
    /// the request.
    fn recover_source(
        source: &str,
        result: Result<RankedList, SearchError>,
        degraded: &mut Vec<String>,
    ) -> Result<RankedList, SearchError> {
        match result {
            Ok(list) => Ok(list),
            Err(SearchError::SourceUnavailable { source: s, reason }) => {
                warn!(source = %s, %reason, "Source unavailable, degrading to empty list");
                degraded.push(source.to_string());
                Ok(RankedList::empty(source))
            }
            Err(other) => Err(other),
        }
    }
}

#[async_trait]
impl<L, V, E> SearchPipeline for HybridPipeline<L, V, E>
where
    L: LexicalSource,
    V: VectorSource,
    E: Embedder,
{
    async fn run(&self, query: &str) -> Result<SearchResponse, SearchError> {
        self.search(query).await
    }
}
