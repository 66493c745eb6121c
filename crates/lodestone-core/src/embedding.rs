//! Text embedding.
//!
//! The embedding model is an external collaborator behind the [`Embedder`]
//! trait: text in, fixed-length float vector out, with the same
//! dimensionality at ingestion and query time. [`HashingEmbedder`] is the
//! shipped reference implementation: a deterministic bag-of-words hashing
//! embedder that needs no model weights. It is not semantically smart, but
//! it is stable across runs and machines, which is what the evaluation
//! harness needs for reproducible baselines.

use crate::error::SearchError;

/// Produces fixed-dimensional embeddings for text.
pub trait Embedder: Send + Sync {
    /// The dimensionality of every vector this embedder produces.
    fn dim(&self) -> usize;

    /// Embeds `text` into a `dim()`-length vector.
    fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError>;
}

/// Deterministic hashing embedder.
///
/// Tokenizes to lowercase ASCII-alphanumeric runs, hashes each token with
/// MD5 into one of `dim` buckets, counts occurrences, and L2-normalizes the
/// result. MD5 (not the stdlib hasher) because the bucket assignment must be
/// identical across runs and machines.
#[derive(Debug, Clone, Copy)]
pub struct HashingEmbedder {
    dim: usize,
}

/// Default embedding dimension for the hashing embedder.
pub const DEFAULT_EMBEDDING_DIM: usize = 384;

impl HashingEmbedder {
    /// Creates a hashing embedder producing `dim`-length vectors.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `dim` is zero.
    pub fn new(dim: usize) -> Result<Self, SearchError> {
        if dim == 0 {
            return Err(SearchError::Config(
                "embedding dimension must be positive".to_string(),
            ));
        }
        Ok(Self { dim })
    }
}

impl Default for HashingEmbedder {
    fn default() -> Self {
        Self {
            dim: DEFAULT_EMBEDDING_DIM,
        }
    }
}

impl Embedder for HashingEmbedder {
    fn dim(&self) -> usize {
        self.dim
    }

    fn embed(&self, text: &str) -> Result<Vec<f32>, SearchError> {
        let mut vec = vec![0.0f32; self.dim];
        for token in tokenize(text) {
            vec[stable_bucket(token, self.dim)] += 1.0;
        }
        l2_normalize(&mut vec);
        Ok(vec)
    }
}

/// Lowercase ASCII-alphanumeric token runs.
fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(|t| t.to_ascii_lowercase())
}

/// Maps a token to a bucket index, stably across runs and machines.
fn stable_bucket(token: String, dim: usize) -> usize {
    let digest = md5::compute(token.as_bytes());
    let hash = u64::from_be_bytes([
        digest[0], digest[1], digest[2], digest[3], digest[4], digest[5], digest[6], digest[7],
    ]);
    (hash % dim as u64) as usize
}

/// Scales `vec` to unit length; the zero vector is left unchanged.
fn l2_normalize(vec: &mut [f32]) {
    let norm = vec.iter().map(|v| v * v).sum::<f32>().sqrt();
    if norm == 0.0 {
        return;
    }
    for v in vec.iter_mut() {
        *v /= norm;
    }
}
