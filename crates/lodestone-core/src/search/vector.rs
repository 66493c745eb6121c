//! Vector (embedding-similarity) retrieval.
//!
//! The similarity store is an external collaborator; this module defines the
//! [`VectorSource`] interface plus [`InMemoryVectorSource`], a reference
//! implementation that scans stored embeddings exactly. Distances are
//! euclidean and surfaced as `score = 1 / (1 + distance)`, so scores fall in
//! (0, 1] with 1.0 meaning an exact match.
//!
//! Dimensionality is fixed at construction and checked on every insert and
//! query; a mismatch means ingestion and query time disagree about the
//! embedding model, which is a fatal configuration error.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tracing::debug;

use crate::error::{validate_dimension, SearchError};

use super::types::{RankedList, VECTOR_SOURCE};

/// An embedding-similarity retrieval source.
#[async_trait]
pub trait VectorSource: Send + Sync {
    /// Returns at most `top_k` nearest documents to `query_vector`, ranked
    /// by similarity (descending).
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<RankedList, SearchError>;
}

/// In-memory exact-scan vector store.
///
/// Suitable for corpora that fit in memory; approximate-nearest-neighbor
/// stores plug in behind the same [`VectorSource`] trait.
pub struct InMemoryVectorSource {
    dim: usize,
    embeddings: BTreeMap<String, Vec<f32>>,
}

impl InMemoryVectorSource {
    /// Creates an empty store for `dim`-dimensional embeddings.
    pub fn new(dim: usize) -> Self {
        Self {
            dim,
            embeddings: BTreeMap::new(),
        }
    }

    /// Stores a document embedding (upsert).
    ///
    /// # Errors
    ///
    /// [`SearchError::DimensionMismatch`] if the embedding's length differs
    /// from the store's dimension; [`SearchError::InvalidQuery`] if it
    /// contains non-finite values.
    pub fn insert(&mut self, doc_id: &str, embedding: Vec<f32>) -> Result<(), SearchError> {
        validate_dimension(self.dim, embedding.len())?;
        if embedding.iter().any(|v| !v.is_finite()) {
            return Err(SearchError::InvalidQuery(format!(
                "embedding for doc '{doc_id}' contains non-finite values"
            )));
        }
        self.embeddings.insert(doc_id.to_string(), embedding);
        Ok(())
    }

    /// Number of stored embeddings.
    pub fn len(&self) -> usize {
        self.embeddings.len()
    }

    /// Returns `true` if the store is empty.
    pub fn is_empty(&self) -> bool {
        self.embeddings.is_empty()
    }

    /// Embedding dimension this store expects.
    pub fn dim(&self) -> usize {
        self.dim
    }
}

fn euclidean_distance(a: &[f32], b: &[f32]) -> f32 {
    a.iter()
        .zip(b.iter())
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f32>()
        .sqrt()
}

#[async_trait]
impl VectorSource for InMemoryVectorSource {
    async fn search(&self, query_vector: &[f32], top_k: usize) -> Result<RankedList, SearchError> {
        validate_dimension(self.dim, query_vector.len())?;
        if query_vector.iter().any(|v| !v.is_finite()) {
            return Err(SearchError::InvalidQuery(
                "query vector contains non-finite values".to_string(),
            ));
        }

        let mut hits: Vec<(String, f32)> = self
            .embeddings
            .iter()
            .map(|(doc_id, embedding)| {
                let distance = euclidean_distance(query_vector, embedding);
                (doc_id.clone(), 1.0 / (1.0 + distance))
            })
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        hits.truncate(top_k);

        debug!("Vector search found {} hits", hits.len());
        RankedList::new(VECTOR_SOURCE, hits)
    }
}
