//! Retrieval quality evaluation: MRR@N and Recall@N over a judgment set.
//!
//! Judgments are newline-delimited JSON, one query per line, each naming the
//! set of relevant document ids. The evaluator runs each query through a
//! [`SearchPipeline`] and aggregates reciprocal rank and recall over the
//! top N results.
//!
//! A single bad query never sinks a batch: a query whose pipeline run fails
//! is flagged and excluded from both aggregates, and a query with an empty
//! relevant set contributes a reciprocal rank of zero but no recall sample
//! (recall is undefined over an empty set).

use std::collections::BTreeSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::corpus::read_jsonl_lossy;
use crate::error::SearchError;
use crate::search::pipeline::SearchPipeline;

/// One labeled query: the query text and the ids judged relevant to it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelevanceJudgment {
    pub query: String,
    #[serde(rename = "relevant")]
    pub relevant_doc_ids: BTreeSet<String>,
}

/// Why a query's contribution to the aggregates is partial or absent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum QueryFlag {
    /// The judgment listed no relevant documents.
    EmptyRelevantSet,
    /// The pipeline returned an error for this query.
    PipelineFailed(String),
}

/// Per-query evaluation outcome.
#[derive(Debug, Clone, Serialize)]
pub struct QueryOutcome {
    pub query: String,
    pub reciprocal_rank: f64,
    /// `None` when recall is undefined or the query was not evaluated.
    pub recall: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub flag: Option<QueryFlag>,
}

/// Aggregated evaluation result for a judgment set.
#[derive(Debug, Clone, Serialize)]
pub struct EvalResult {
    /// Outcomes in the same order as the input judgments.
    pub per_query: Vec<QueryOutcome>,
    pub mrr_at_n: f64,
    pub recall_at_n: f64,
    /// Queries that contributed to the MRR aggregate.
    pub evaluated: usize,
    /// Queries excluded because their pipeline run failed.
    pub failed: usize,
}

/// Loads a judgment set from a JSONL file.
///
/// Returns the judgments alongside the count of malformed lines skipped.
///
/// # Errors
///
/// Returns [`SearchError::Config`] if the file cannot be opened or read.
pub fn load_judgments(
    path: impl AsRef<Path>,
) -> Result<(Vec<RelevanceJudgment>, usize), SearchError> {
    let (judgments, skipped) = read_jsonl_lossy::<RelevanceJudgment>(path.as_ref())?;
    info!(
        queries = judgments.len(),
        skipped,
        "Loaded judgments from {}",
        path.as_ref().display()
    );
    Ok((judgments, skipped))
}

/// Runs every judgment through `pipeline` and aggregates MRR@N and
/// Recall@N over the top `n` results.
///
/// Queries are evaluated sequentially in input order so per-query output is
/// stable across runs.
pub async fn evaluate<P: SearchPipeline + ?Sized>(
    judgments: &[RelevanceJudgment],
    pipeline: &P,
    n: usize,
) -> EvalResult {
    let mut per_query = Vec::with_capacity(judgments.len());
    let mut failed = 0usize;

    for judgment in judgments {
        if judgment.relevant_doc_ids.is_empty() {
            warn!(query = %judgment.query, "Judgment has no relevant documents");
            per_query.push(QueryOutcome {
                query: judgment.query.clone(),
                reciprocal_rank: 0.0,
                recall: None,
                flag: Some(QueryFlag::EmptyRelevantSet),
            });
            continue;
        }

        match pipeline.run(&judgment.query).await {
            Ok(response) => {
                let top: Vec<&str> = response
                    .results
                    .iter()
                    .take(n)
                    .map(|doc| doc.doc_id.as_str())
                    .collect();

                let reciprocal_rank = top
                    .iter()
                    .position(|doc_id| judgment.relevant_doc_ids.contains(*doc_id))
                    .map_or(0.0, |idx| 1.0 / (idx as f64 + 1.0));

                let found = top
                    .iter()
                    .filter(|doc_id| judgment.relevant_doc_ids.contains(**doc_id))
                    .count();
                let recall = found as f64 / judgment.relevant_doc_ids.len() as f64;

                per_query.push(QueryOutcome {
                    query: judgment.query.clone(),
                    reciprocal_rank,
                    recall: Some(recall),
                    flag: None,
                });
            }
            Err(e) => {
                warn!(query = %judgment.query, error = %e, "Pipeline failed, excluding query");
                failed += 1;
                per_query.push(QueryOutcome {
                    query: judgment.query.clone(),
                    reciprocal_rank: 0.0,
                    recall: None,
                    flag: Some(QueryFlag::PipelineFailed(e.to_string())),
                });
            }
        }
    }

    let mrr_samples: Vec<f64> = per_query
        .iter()
        .filter(|outcome| !matches!(outcome.flag, Some(QueryFlag::PipelineFailed(_))))
        .map(|outcome| outcome.reciprocal_rank)
        .collect();
    let recall_samples: Vec<f64> = per_query
        .iter()
        .filter_map(|outcome| outcome.recall)
        .collect();

    let mrr_at_n = mean(&mrr_samples);
    let recall_at_n = mean(&recall_samples);

    info!(
        evaluated = mrr_samples.len(),
        failed, mrr_at_n, recall_at_n, "Evaluation complete"
    );

    EvalResult {
        per_query,
        mrr_at_n,
        recall_at_n,
        evaluated: mrr_samples.len(),
        failed,
    }
}

fn mean(samples: &[f64]) -> f64 {
    if samples.is_empty() {
        0.0
    } else {
        samples.iter().sum::<f64>() / samples.len() as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::pipeline::SearchResponse;
    use crate::search::types::ScoredDocument;
    use async_trait::async_trait;
    use std::collections::BTreeMap;

    /// A pipeline returning a canned ranking per query.
    struct FixedPipeline {
        rankings: BTreeMap<String, Vec<&'static str>>,
    }

    #[async_trait]
    impl SearchPipeline for FixedPipeline {
        async fn run(&self, query: &str) -> Result<SearchResponse, SearchError> {
            let doc_ids = self
                .rankings
                .get(query)
                .ok_or_else(|| SearchError::InvalidQuery(format!("no ranking for {query}")))?;
            Ok(SearchResponse::new(
                doc_ids
                    .iter()
                    .enumerate()
                    .map(|(idx, doc_id)| {
                        ScoredDocument::from_source("lexical", *doc_id, 1.0 - idx as f32 * 0.1)
                    })
                    .collect(),
            ))
        }
    }

    fn judgment(query: &str, relevant: &[&str]) -> RelevanceJudgment {
        RelevanceJudgment {
            query: query.to_string(),
            relevant_doc_ids: relevant.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[tokio::test]
    async fn test_relevant_at_rank_two_scores_half() {
        let pipeline = FixedPipeline {
            rankings: [("q1".to_string(), vec!["d1", "d2", "d3"])].into(),
        };
        let result = evaluate(&[judgment("q1", &["d2"])], &pipeline, 5).await;

        assert_eq!(result.per_query[0].reciprocal_rank, 0.5);
        assert_eq!(result.per_query[0].recall, Some(1.0));
        assert_eq!(result.mrr_at_n, 0.5);
        assert_eq!(result.recall_at_n, 1.0);
    }

    #[tokio::test]
    async fn test_relevant_outside_top_n_scores_zero() {
        let pipeline = FixedPipeline {
            rankings: [("q1".to_string(), vec!["d1", "d2", "d3"])].into(),
        };
        let result = evaluate(&[judgment("q1", &["d3"])], &pipeline, 2).await;

        assert_eq!(result.per_query[0].reciprocal_rank, 0.0);
        assert_eq!(result.per_query[0].recall, Some(0.0));
    }

    #[tokio::test]
    async fn test_partial_recall_with_multiple_relevant() {
        let pipeline = FixedPipeline {
            rankings: [("q1".to_string(), vec!["d1", "d2", "d3"])].into(),
        };
        let result = evaluate(&[judgment("q1", &["d1", "d9"])], &pipeline, 3).await;

        assert_eq!(result.per_query[0].reciprocal_rank, 1.0);
        assert_eq!(result.per_query[0].recall, Some(0.5));
    }

    #[tokio::test]
    async fn test_empty_relevant_set_flagged_and_excluded_from_recall() {
        let pipeline = FixedPipeline {
            rankings: [("q1".to_string(), vec!["d1"])].into(),
        };
        let judgments = vec![judgment("q1", &["d1"]), judgment("q2", &[])];
        let result = evaluate(&judgments, &pipeline, 5).await;

        assert_eq!(result.per_query[1].flag, Some(QueryFlag::EmptyRelevantSet));
        // Zero reciprocal rank still counts toward MRR.
        assert_eq!(result.mrr_at_n, 0.5);
        // But recall has a single sample.
        assert_eq!(result.recall_at_n, 1.0);
    }

    #[tokio::test]
    async fn test_pipeline_failure_excluded_from_aggregates() {
        let pipeline = FixedPipeline {
            rankings: [("q1".to_string(), vec!["d1"])].into(),
        };
        let judgments = vec![judgment("q1", &["d1"]), judgment("broken", &["d1"])];
        let result = evaluate(&judgments, &pipeline, 5).await;

        assert_eq!(result.failed, 1);
        assert_eq!(result.evaluated, 1);
        assert!(matches!(
            result.per_query[1].flag,
            Some(QueryFlag::PipelineFailed(_))
        ));
        // The failure does not drag MRR down.
        assert_eq!(result.mrr_at_n, 1.0);
    }

    #[tokio::test]
    async fn test_empty_judgment_set() {
        let pipeline = FixedPipeline {
            rankings: BTreeMap::new(),
        };
        let result = evaluate(&[], &pipeline, 5).await;
        assert_eq!(result.mrr_at_n, 0.0);
        assert_eq!(result.recall_at_n, 0.0);
        assert!(result.per_query.is_empty());
    }
}
