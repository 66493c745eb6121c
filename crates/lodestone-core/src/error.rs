//! Error types for lodestone-core.
//!
//! The taxonomy distinguishes four failure classes with different blast radii:
//!
//! - [`SearchError::Config`]: invalid fusion configuration, surfaced before
//!   any query executes.
//! - [`SearchError::SourceUnavailable`]: a retrieval source failed or timed
//!   out. Recoverable: the pipeline substitutes an empty ranked list and
//!   degrades to single-source ranking.
//! - Scoring errors ([`SearchError::NonFiniteScore`],
//!   [`SearchError::RerankFailed`]): fatal for the current request; no
//!   partial or corrupt ranking is ever returned.
//! - Query/input errors ([`SearchError::InvalidQuery`],
//!   [`SearchError::DimensionMismatch`]): caller mistakes, rejected up front.
//!
//! Evaluation-input problems (malformed judgment records, empty relevant
//! sets) are deliberately *not* errors: the evaluator flags the affected
//! query and continues the batch. See [`crate::evaluation::QueryFlag`].

use std::fmt;

/// Errors that can occur in the search and fusion pipeline.
#[derive(Debug, Clone)]
pub enum SearchError {
    /// Invalid fusion configuration (unknown strategy, bad rrf_k, bad weight).
    /// Fatal: surfaced before any query executes.
    Config(String),

    /// A retrieval source call failed or timed out.
    SourceUnavailable {
        /// Name of the failing source ("lexical", "vector", ...)
        source: String,
        /// Underlying failure description
        reason: String,
    },

    /// A raw score was NaN or infinite. Rejected fast rather than propagated.
    NonFiniteScore {
        /// Source that produced the score
        source: String,
        /// Offending document
        doc_id: String,
    },

    /// A source emitted the same doc_id twice within one ranked list.
    DuplicateDoc {
        /// Source that produced the list
        source: String,
        /// Duplicated document
        doc_id: String,
    },

    /// Cross-encoder scoring failed for a candidate. The whole rerank call
    /// fails; callers decide whether to fall back to the unreranked order.
    RerankFailed {
        /// Candidate being scored when the failure occurred
        doc_id: String,
        /// Underlying failure description
        reason: String,
    },

    /// Embedding dimension mismatch (expected vs actual).
    /// A fatal configuration error: ingestion and query time must agree.
    DimensionMismatch {
        /// Expected embedding dimension
        expected: usize,
        /// Actual dimension received
        actual: usize,
    },

    /// Invalid search query (empty text, zero result count, bad syntax).
    InvalidQuery(String),
}

impl fmt::Display for SearchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchError::Config(msg) => write!(f, "Invalid configuration: {msg}"),
            SearchError::SourceUnavailable { source, reason } => {
                write!(f, "Source '{source}' unavailable: {reason}")
            }
            SearchError::NonFiniteScore { source, doc_id } => {
                write!(f, "Non-finite score for doc '{doc_id}' from source '{source}'")
            }
            SearchError::DuplicateDoc { source, doc_id } => {
                write!(f, "Duplicate doc '{doc_id}' in ranked list from source '{source}'")
            }
            SearchError::RerankFailed { doc_id, reason } => {
                write!(f, "Rerank failed for doc '{doc_id}': {reason}")
            }
            SearchError::DimensionMismatch { expected, actual } => {
                write!(f, "Dimension mismatch: expected {expected}, got {actual}")
            }
            SearchError::InvalidQuery(msg) => write!(f, "Invalid query: {msg}"),
        }
    }
}

impl std::error::Error for SearchError {}

/// Validates that an embedding has the expected dimension.
///
/// Returns `Err(SearchError::DimensionMismatch)` otherwise.
pub fn validate_dimension(expected: usize, actual: usize) -> Result<(), SearchError> {
    if actual == expected {
        Ok(())
    } else {
        Err(SearchError::DimensionMismatch { expected, actual })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_dimension() {
        assert!(validate_dimension(384, 384).is_ok());
        let err = validate_dimension(384, 512).unwrap_err();
        assert!(matches!(
            err,
            SearchError::DimensionMismatch {
                expected: 384,
                actual: 512
            }
        ));
    }
}
