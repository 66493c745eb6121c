//! Lexical (term-frequency) retrieval.
//!
//! The inverted-index engine itself is an external collaborator; this module
//! defines the [`LexicalSource`] interface the pipeline retrieves through,
//! plus [`InMemoryLexicalSource`], a reference implementation backed by the
//! [`bm25`](https://crates.io/crates/bm25) crate. Each text field gets its
//! own BM25 engine and per-field scores are combined with the caller's
//! field weights.

use std::collections::BTreeMap;

use async_trait::async_trait;
use bm25::{Document, Language, SearchEngine, SearchEngineBuilder};
use tracing::debug;

use crate::error::SearchError;

use super::types::{RankedList, LEXICAL_SOURCE};

/// A term-frequency retrieval source.
///
/// Returns a ranked list of `(doc_id, bm25_score)` for a query string.
/// An empty list is the well-defined "no match" result; malformed query
/// syntax is an error.
#[async_trait]
pub trait LexicalSource: Send + Sync {
    /// Searches `query` across the weighted fields, returning at most
    /// `top_k` hits ranked by relevance.
    async fn search(
        &self,
        query: &str,
        field_weights: &BTreeMap<String, f32>,
        top_k: usize,
    ) -> Result<RankedList, SearchError>;
}

/// In-memory BM25 lexical source with per-field indexes.
///
/// Case-insensitive, English tokenization and stemming, upsert semantics on
/// re-added doc_ids, matching the `bm25` crate's defaults. Not thread-safe
/// for writes; index fully before sharing read-only with the pipeline.
pub struct InMemoryLexicalSource {
    /// One BM25 engine per field name ("title", "body", ...)
    engines: BTreeMap<String, SearchEngine<String>>,
    doc_count: usize,
}

impl InMemoryLexicalSource {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self {
            engines: BTreeMap::new(),
            doc_count: 0,
        }
    }

    /// Indexes one document's fields.
    ///
    /// Fields are created on first use; re-adding a doc_id replaces its
    /// previous contents (upsert).
    pub fn add_document<'a>(
        &mut self,
        doc_id: &str,
        fields: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        for (field, text) in fields {
            let engine = self.engines.entry(field.to_string()).or_insert_with(|| {
                let empty: Vec<Document<String>> = Vec::new();
                SearchEngineBuilder::<String>::with_documents(Language::English, empty).build()
            });
            engine.upsert(Document {
                id: doc_id.to_string(),
                contents: text.to_string(),
            });
        }
        self.doc_count += 1;
    }

    /// Number of indexed documents.
    pub fn len(&self) -> usize {
        self.doc_count
    }

    /// Returns `true` if nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.doc_count == 0
    }
}

impl Default for InMemoryLexicalSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LexicalSource for InMemoryLexicalSource {
    async fn search(
        &self,
        query: &str,
        field_weights: &BTreeMap<String, f32>,
        top_k: usize,
    ) -> Result<RankedList, SearchError> {
        if query.trim().is_empty() {
            return Err(SearchError::InvalidQuery(
                "Query text cannot be empty".to_string(),
            ));
        }

        // Weighted sum of per-field BM25 scores, folded by doc_id.
        let mut combined: BTreeMap<String, f32> = BTreeMap::new();
        for (field, weight) in field_weights {
            if *weight <= 0.0 {
                continue;
            }
            let Some(engine) = self.engines.get(field) else {
                continue;
            };
            for result in engine.search(query, top_k) {
                *combined.entry(result.document.id.clone()).or_insert(0.0) +=
                    weight * result.score;
            }
        }

        let mut hits: Vec<(String, f32)> = combined.into_iter().collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(top_k);

        debug!("Lexical search found {} hits", hits.len());
        RankedList::new(LEXICAL_SOURCE, hits)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_fields() -> BTreeMap<String, f32> {
        let mut weights = BTreeMap::new();
        weights.insert("title".to_string(), 1.0);
        weights.insert("body".to_string(), 1.0);
        weights
    }

    fn sample_source() -> InMemoryLexicalSource {
        let mut source = InMemoryLexicalSource::new();
        source.add_document(
            "t1",
            [
                ("title", "rotate s3 access key"),
                ("body", "steps to rotate an expired access key in the console"),
            ],
        );
        source.add_document(
            "t2",
            [
                ("title", "reset account password"),
                ("body", "password reset flow for locked accounts"),
            ],
        );
        source.add_document(
            "t3",
            [
                ("title", "s3 bucket permissions"),
                ("body", "granting read access to an s3 bucket"),
            ],
        );
        source
    }

    #[tokio::test]
    async fn test_search_ranks_matching_docs() {
        let source = sample_source();
        let results = source
            .search("rotate access key", &default_fields(), 10)
            .await
            .unwrap();

        assert!(!results.is_empty());
        assert_eq!(results.entries()[0].doc_id, "t1");
    }

    #[tokio::test]
    async fn test_no_match_returns_empty_list() {
        let source = sample_source();
        let results = source
            .search("unrelated zebra query", &default_fields(), 10)
            .await
            .unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_empty_query_rejected() {
        let source = sample_source();
        let err = source.search("   ", &default_fields(), 10).await.unwrap_err();
        assert!(matches!(err, SearchError::InvalidQuery(_)));
    }

    #[tokio::test]
    async fn test_field_weights_shift_ranking() {
        let mut source = InMemoryLexicalSource::new();
        source.add_document(
            "title_hit",
            [("title", "kernel panic"), ("body", "unrelated words here")],
        );
        source.add_document(
            "body_hit",
            [("title", "unrelated words"), ("body", "kernel panic trace")],
        );

        let mut title_heavy = BTreeMap::new();
        title_heavy.insert("title".to_string(), 5.0);
        title_heavy.insert("body".to_string(), 0.1);

        let results = source.search("kernel panic", &title_heavy, 10).await.unwrap();
        assert_eq!(results.entries()[0].doc_id, "title_hit");
    }

    #[tokio::test]
    async fn test_zero_weight_field_ignored() {
        let source = sample_source();
        let mut body_only = BTreeMap::new();
        body_only.insert("title".to_string(), 0.0);
        body_only.insert("body".to_string(), 1.0);

        // "reset" appears in t2's title and body; with the title voteless the
        // doc should still be found via body.
        let results = source.search("password reset", &body_only, 10).await.unwrap();
        assert!(results.entries().iter().any(|e| e.doc_id == "t2"));
    }

    #[tokio::test]
    async fn test_empty_index_returns_empty() {
        let source = InMemoryLexicalSource::new();
        let results = source.search("anything", &default_fields(), 10).await.unwrap();
        assert!(results.is_empty());
    }
}
