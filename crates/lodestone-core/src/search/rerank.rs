//! Cross-encoder reranking of a fused candidate pool.
//!
//! Reranking is an optional stage: the pipeline is
//! `retrieve → fuse → [rerank]`, where this stage is either the identity or
//! a real reorder ([`RerankStage`]). The component's contract is purely the
//! reordering and tie-break discipline; the scoring function is an external
//! model behind the [`CrossEncoder`] trait and may be arbitrarily slow.
//!
//! Candidates are scored concurrently (no ordering dependency between
//! them), but the reorder waits for every score: there is no partial or
//! streaming output, and a single scoring failure fails the whole call.
//! Callers decide whether to fall back to the unreranked fused order.
//!
//! The candidate pool size M must be at least the number of results
//! ultimately returned; reranking a pool that excludes relevant documents is
//! a caller configuration error, and this component never silently expands
//! the pool.

use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::try_join_all;
use tracing::debug;

use crate::error::SearchError;

use super::types::{by_score_then_doc_id, ScoredDocument};

/// A pairwise relevance model: jointly scores a (query, document) pair.
///
/// Higher scores mean more relevant. Typically backed by an external
/// cross-encoder model; implementations own their own batching and I/O.
#[async_trait]
pub trait CrossEncoder: Send + Sync {
    /// Scores how relevant `doc_text` is to `query`.
    async fn score(&self, query: &str, doc_text: &str) -> Result<f32, SearchError>;
}

/// Reorders `candidates` by cross-encoder relevance.
///
/// Each candidate's fused score is replaced by the encoder's score for
/// `(query, doc_text)`; the pool is then re-sorted descending with the usual
/// doc_id-ascending tie-break. Per-source raw scores are preserved for
/// explainability.
///
/// # Errors
///
/// Fails the whole call (no partial reorder) if the encoder fails for any
/// candidate or returns a non-finite score.
pub async fn rerank<E: CrossEncoder + ?Sized>(
    query: &str,
    candidates: Vec<(ScoredDocument, String)>,
    encoder: &E,
) -> Result<Vec<ScoredDocument>, SearchError> {
    let scored = try_join_all(candidates.into_iter().map(|(doc, text)| async move {
        let score = encoder.score(query, &text).await.map_err(|e| {
            SearchError::RerankFailed {
                doc_id: doc.doc_id.clone(),
                reason: e.to_string(),
            }
        })?;
        if !score.is_finite() {
            return Err(SearchError::RerankFailed {
                doc_id: doc.doc_id.clone(),
                reason: format!("encoder returned non-finite score {score}"),
            });
        }
        Ok(ScoredDocument { score, ..doc })
    }))
    .await?;

    let mut reranked = scored;
    reranked.sort_by(by_score_then_doc_id);
    debug!("Reranked {} candidates", reranked.len());
    Ok(reranked)
}

/// The optional reranking stage of the pipeline.
///
/// Keeping this as a value (rather than an `if rerank { ... }` branch) lets
/// the evaluator swap the stage in and out for ablation runs.
#[derive(Clone)]
pub enum RerankStage {
    /// Pass the fused ranking through unchanged.
    Identity,
    /// Rerank the top `pool_size` fused candidates with a cross-encoder.
    CrossEncoder {
        /// The pairwise scoring model
        encoder: Arc<dyn CrossEncoder>,
        /// Candidate pool size M; must be >= the final result count
        pool_size: usize,
    },
}

impl RerankStage {
    /// Applies the stage to a fused ranking.
    ///
    /// `doc_text` supplies the text handed to the encoder for each
    /// candidate; documents without text are scored against the empty
    /// string. Candidates beyond the pool are dropped, not reordered;
    /// callers size the pool via `pool_size >= top_n`.
    pub async fn apply(
        &self,
        query: &str,
        fused: Vec<ScoredDocument>,
        doc_text: &(dyn Fn(&str) -> Option<String> + Sync),
    ) -> Result<Vec<ScoredDocument>, SearchError> {
        match self {
            RerankStage::Identity => Ok(fused),
            RerankStage::CrossEncoder { encoder, pool_size } => {
                let pool: Vec<(ScoredDocument, String)> = fused
                    .into_iter()
                    .take(*pool_size)
                    .map(|doc| {
                        let text = doc_text(&doc.doc_id).unwrap_or_default();
                        (doc, text)
                    })
                    .collect();
                rerank(query, pool, encoder.as_ref()).await
            }
        }
    }
}

/// Deterministic token-overlap relevance scorer.
///
/// A stand-in for a real cross-encoder model: scores the fraction of query
/// tokens that occur in the document (Jaccard-style overlap on lowercase
/// alphanumeric tokens). Useful for tests and for running `--rerank`
/// end-to-end without model weights; real models implement [`CrossEncoder`]
/// the same way.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokenOverlapEncoder;

#[async_trait]
impl CrossEncoder for TokenOverlapEncoder {
    async fn score(&self, query: &str, doc_text: &str) -> Result<f32, SearchError> {
        let query_tokens: BTreeSet<String> = tokens(query).collect();
        if query_tokens.is_empty() {
            return Ok(0.0);
        }
        let doc_tokens: BTreeSet<String> = tokens(doc_text).collect();
        let overlap = query_tokens.intersection(&doc_tokens).count();
        Ok(overlap as f32 / query_tokens.len() as f32)
    }
}

fn tokens(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}
