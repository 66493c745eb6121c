//! Fusion engine: blends per-source rankings into one list.
//!
//! Two interchangeable strategies, selected by [`FusionConfig`]:
//!
//! - **Weighted sum**: each source is min-max normalized, then
//!   `final = sum of weight[source] * normalized[source]`. A document missing
//!   from a source scores 0 for that source: absence is "no evidence",
//!   never imputed from the other source. (The complementary degenerate-case
//!   policy, an undiscriminating source normalizing to all 1.0, lives in
//!   [`super::normalize`].)
//! - **RRF**: `final = sum of 1 / (k + rank)` with 1-based positional ranks.
//!   A document absent from a source contributes 0 (an infinite rank). Used
//!   when score scales are not comparable even after normalization.
//!
//! The output contains the union of doc_ids seen in any input list and is a
//! total order: strictly descending by score with doc_id-ascending
//! tie-break. Accumulation is folded through a single `BTreeMap` keyed by
//! doc_id, so the missing-score policy is one code path and re-running
//! `fuse` on the same inputs yields byte-identical ordering.

use std::collections::BTreeMap;

use crate::config::{FusionConfig, FusionStrategy};
use crate::error::SearchError;

use super::normalize::min_max_normalize;
use super::types::{by_score_then_doc_id, RankedList, ScoredDocument};

/// Accumulates per-source contributions into the union of documents.
///
/// The builder owns the missing-score policy: a document simply never
/// receives a contribution from a source it is absent from, leaving that
/// term at 0.
struct ScoreBoard {
    docs: BTreeMap<String, ScoredDocument>,
}

impl ScoreBoard {
    fn new() -> Self {
        Self {
            docs: BTreeMap::new(),
        }
    }

    /// Adds one source's contribution for a document, recording the raw
    /// score the source assigned it.
    fn add(&mut self, source: &str, doc_id: &str, contribution: f32, raw_score: f32) {
        let doc = self
            .docs
            .entry(doc_id.to_string())
            .or_insert_with(|| ScoredDocument {
                doc_id: doc_id.to_string(),
                score: 0.0,
                raw_scores: BTreeMap::new(),
            });
        doc.score += contribution;
        doc.raw_scores.insert(source.to_string(), raw_score);
    }

    /// Finalizes into a totally ordered ranking.
    fn into_ranking(self) -> Vec<ScoredDocument> {
        let mut fused: Vec<ScoredDocument> = self.docs.into_values().collect();
        fused.sort_by(by_score_then_doc_id);
        fused
    }
}

/// Fuses per-source ranked lists into one blended ranking.
///
/// Returns the union of documents across all `lists`, strictly descending by
/// fused score with doc_id-ascending tie-break. Each output document's
/// `raw_scores` records what every source that returned it scored it
/// (normalized scores under weighted-sum, raw scores under RRF).
///
/// # Errors
///
/// Returns [`SearchError::Config`] if `config` fails validation. Score
/// hygiene (finite, unique doc_ids per list) is already guaranteed by
/// [`RankedList`] construction.
pub fn fuse(lists: &[RankedList], config: &FusionConfig) -> Result<Vec<ScoredDocument>, SearchError> {
    config.validate()?;

    let mut board = ScoreBoard::new();

    match config.strategy {
        FusionStrategy::WeightedSum => {
            for list in lists {
                let weight = config.weight(list.source());
                let normalized = min_max_normalize(list);
                for entry in normalized.entries() {
                    board.add(list.source(), &entry.doc_id, weight * entry.score, entry.score);
                }
            }
        }
        FusionStrategy::Rrf => {
            let k = config.rrf_k as f32;
            for list in lists {
                // Ranks are positional and 1-based; the list's own tie-break
                // already resolved equal raw scores deterministically.
                for (rank, entry) in list.entries().iter().enumerate() {
                    let contribution = 1.0 / (k + (rank + 1) as f32);
                    board.add(list.source(), &entry.doc_id, contribution, entry.score);
                }
            }
        }
    }

    Ok(board.into_ranking())
}
