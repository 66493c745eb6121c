//! Core result types shared across retrieval, fusion, and evaluation.
//!
//! A [`RankedList`] is what a single retrieval source returns: descending by
//! that source's raw score, unique doc_ids, finite scores only. All three
//! invariants are enforced at construction so downstream code never has to
//! re-check them. A [`ScoredDocument`] is one entry of a fused (or source)
//! ranking, carrying the blended score plus the raw per-source scores it was
//! derived from.
//!
//! `doc_id` is an opaque string join key. It is never parsed, never assumed
//! numeric, and ties are always broken by its lexical (byte) order so that
//! every ranking in the system is a total order.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;

/// Canonical name of the lexical (term-frequency) retrieval source.
pub const LEXICAL_SOURCE: &str = "lexical";

/// Canonical name of the vector (embedding-similarity) retrieval source.
pub const VECTOR_SOURCE: &str = "vector";

/// One entry of a ranking, with its per-source raw scores preserved.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredDocument {
    /// Opaque document identifier, the join key across sources
    pub doc_id: String,
    /// Current score: raw within a single source's list, blended after fusion,
    /// cross-encoder relevance after reranking
    pub score: f32,
    /// Raw score per source name, for explainability and output
    pub raw_scores: BTreeMap<String, f32>,
}

impl ScoredDocument {
    /// Creates a document scored by a single source.
    pub fn from_source(source: &str, doc_id: impl Into<String>, score: f32) -> Self {
        let doc_id = doc_id.into();
        let mut raw_scores = BTreeMap::new();
        raw_scores.insert(source.to_string(), score);
        Self {
            doc_id,
            score,
            raw_scores,
        }
    }
}

/// Orders by score descending, then doc_id ascending.
///
/// Uses `f32::total_cmp`, so the ordering is total even though scores are
/// floats; construction-time finiteness checks keep NaN out of the system.
pub fn by_score_then_doc_id(a: &ScoredDocument, b: &ScoredDocument) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| a.doc_id.cmp(&b.doc_id))
}

/// A ranking produced by exactly one retrieval source.
///
/// Invariants (enforced by [`RankedList::new`]):
/// - every score is finite (NaN/Inf rejected, never propagated),
/// - each doc_id appears at most once,
/// - entries are sorted descending by score, ties broken by doc_id ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct RankedList {
    source: String,
    entries: Vec<ScoredDocument>,
}

impl RankedList {
    /// Builds a ranked list from `(doc_id, raw_score)` pairs.
    ///
    /// Input order is irrelevant; the list is sorted on construction.
    ///
    /// # Errors
    ///
    /// - [`SearchError::NonFiniteScore`] if any score is NaN or infinite
    /// - [`SearchError::DuplicateDoc`] if a doc_id appears more than once
    pub fn new(
        source: impl Into<String>,
        hits: impl IntoIterator<Item = (String, f32)>,
    ) -> Result<Self, SearchError> {
        let source = source.into();
        let mut entries = Vec::new();
        let mut seen = std::collections::BTreeSet::new();

        for (doc_id, score) in hits {
            if !score.is_finite() {
                return Err(SearchError::NonFiniteScore {
                    source,
                    doc_id,
                });
            }
            if !seen.insert(doc_id.clone()) {
                return Err(SearchError::DuplicateDoc { source, doc_id });
            }
            entries.push(ScoredDocument::from_source(&source, doc_id, score));
        }

        entries.sort_by(by_score_then_doc_id);
        Ok(Self { source, entries })
    }

    /// Builds an empty list for `source`.
    ///
    /// Used when a source is unavailable or timed out: a zero-result list is
    /// a valid, well-defined fusion input.
    pub fn empty(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            entries: Vec::new(),
        }
    }

    /// The source that produced this list.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Entries in descending score order.
    pub fn entries(&self) -> &[ScoredDocument] {
        &self.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if the list has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Rebuilds the list with scores transformed by `f`.
    ///
    /// Only meaningful for monotonic transforms (normalization); the
    /// descending-order invariant is preserved by re-sorting.
    pub(crate) fn map_scores(&self, f: impl Fn(f32) -> f32) -> Self {
        let mut entries: Vec<ScoredDocument> = self
            .entries
            .iter()
            .map(|e| {
                let score = f(e.score);
                ScoredDocument::from_source(&self.source, e.doc_id.clone(), score)
            })
            .collect();
        entries.sort_by(by_score_then_doc_id);
        Self {
            source: self.source.clone(),
            entries,
        }
    }
}
