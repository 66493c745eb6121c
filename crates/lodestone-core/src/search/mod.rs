//! Hybrid search: retrieval, normalization, fusion, and reranking.
//!
//! This module implements the result-side of a hybrid retrieval system that
//! combines:
//! - **Lexical search** (BM25 over weighted fields)
//! - **Vector search** (embedding distance converted to similarity)
//! - **Score fusion** (weighted-sum over normalized scores, or RRF)
//! - **Optional cross-encoder reranking** of the fused pool
//!
//! # Architecture
//!
//! - `types`: Core types (`ScoredDocument`, `RankedList`, source names)
//! - `normalize`: Min-max normalization onto `[0, 1]`
//! - `fusion`: Weighted-sum and Reciprocal Rank Fusion strategies
//! - `rerank`: Cross-encoder trait and rerank stage
//! - `lexical`: BM25 lexical source trait and in-memory implementation
//! - `vector`: Vector source trait and in-memory exact-scan implementation
//! - `pipeline`: `HybridPipeline` orchestrating retrieve → fuse → rerank
//!
//! # Usage
//!
//! ```ignore
//! use lodestone_core::config::FusionConfig;
//! use lodestone_core::embedding::HashingEmbedder;
//! use lodestone_core::search::{HybridPipeline, InMemoryLexicalSource, InMemoryVectorSource};
//!
//! let embedder = HashingEmbedder::default();
//! let mut lexical = InMemoryLexicalSource::new();
//! let mut vector = InMemoryVectorSource::new(embedder.dim());
//! lexical.add_document("t1", [("title", "reset password"), ("body", "steps")]);
//! vector.insert("t1", embedder.embed("reset password\nsteps")?)?;
//!
//! let pipeline = HybridPipeline::new(lexical, vector, embedder, FusionConfig::default())?;
//! let results = pipeline.search("password reset").await?;
//! ```
//!
//! # Algorithm Details
//!
//! **Weighted sum**: each source list is min-max normalized onto `[0, 1]`,
//! then `fused = Σ weight(source) · normalized(source)`. A document missing
//! from a source contributes zero for that source.
//!
//! **Reciprocal Rank Fusion**: `score = Σ 1 / (k + rank)` with 1-based
//! ranks and k=60 by default. Operates on ranks only, so it is robust to
//! scale differences between sources.
//!
//! Ties in every ordered output break by ascending `doc_id`, which makes
//! rankings total and repeat runs byte-identical.

pub mod types;

pub mod fusion;
pub mod lexical;
pub mod normalize;
pub mod pipeline;
pub mod rerank;
pub mod vector;

pub use types::{by_score_then_doc_id, RankedList, ScoredDocument, LEXICAL_SOURCE, VECTOR_SOURCE};

pub use fusion::fuse;
pub use lexical::{InMemoryLexicalSource, LexicalSource};
pub use normalize::min_max_normalize;
pub use pipeline::{
    HybridPipeline, SearchPipeline, SearchResponse, DEFAULT_CANDIDATE_POOL, DEFAULT_TOP_N,
};
pub use rerank::{rerank, CrossEncoder, RerankStage, TokenOverlapEncoder};
pub use vector::{InMemoryVectorSource, VectorSource};
