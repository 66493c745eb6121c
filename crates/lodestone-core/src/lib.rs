//! # Lodestone Core
//!
//! Library for hybrid search result fusion: blending lexical (BM25) and
//! vector rankings into a single relevance-ordered list, with optional
//! cross-encoder reranking and built-in retrieval quality evaluation.
//!
//! This crate holds the algorithms and traits used by the Lodestone CLI,
//! with no I/O beyond corpus loading so it can back other frontends.
//!
//! ## Modules
//!
//! - [`search`] - Retrieval sources, normalization, fusion, reranking, and
//!   the hybrid pipeline
//! - [`evaluation`] - MRR@N / Recall@N evaluation over labeled judgments
//! - [`corpus`] - JSONL corpus loading and text lookup
//! - [`embedding`] - Embedder trait and deterministic hashing fallback
//! - [`config`] - Fusion strategy configuration and defaults
//! - [`error`] - Error types shared across the pipeline

pub mod config;
pub mod corpus;
pub mod embedding;
pub mod error;
pub mod evaluation;
pub mod search;

pub use config::{FusionConfig, FusionStrategy};
pub use error::SearchError;
