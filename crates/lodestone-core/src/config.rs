//! Fusion configuration.
//!
//! [`FusionConfig`] is an explicit immutable value threaded through every
//! call. It is validated once, before any query executes, and then shared
//! read-only across concurrent queries, never read from ambient process
//! state, so concurrent evaluation runs with different configs cannot
//! interfere.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SearchError;
use crate::search::types::{LEXICAL_SOURCE, VECTOR_SOURCE};

/// Standard RRF k parameter from the original paper.
///
/// Cormack, Clarke & Buettcher (SIGIR 2009): "Reciprocal Rank Fusion
/// outperforms Condorcet and individual Rank Learning Methods". Smaller k
/// emphasizes top ranks; larger k flattens the weighting. 60 is a good
/// balance in most IR scenarios.
pub const DEFAULT_RRF_K: u32 = 60;

/// Default blend weight for the lexical source under weighted-sum fusion.
pub const DEFAULT_LEXICAL_WEIGHT: f32 = 0.6;

/// Default blend weight for the vector source under weighted-sum fusion.
pub const DEFAULT_VECTOR_WEIGHT: f32 = 0.4;

/// How two source rankings are blended into one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionStrategy {
    /// Min-max normalize each source, then sum weighted normalized scores.
    /// A doc missing from a source scores 0 there (absence is "no evidence").
    WeightedSum,
    /// Reciprocal rank fusion: `sum over sources of 1 / (k + rank)`.
    /// Rank-positional, so incomparable score scales don't matter.
    Rrf,
}

/// Configuration for the fusion engine.
///
/// Weights are relative; they need not sum to 1. `rrf_k` only affects the
/// [`FusionStrategy::Rrf`] strategy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FusionConfig {
    /// Blending strategy
    pub strategy: FusionStrategy,
    /// Relative weight per source name (weighted-sum only). A source with no
    /// entry here contributes 0: present in the union, but voteless.
    pub weights: BTreeMap<String, f32>,
    /// RRF k constant; must be positive
    pub rrf_k: u32,
}

impl Default for FusionConfig {
    fn default() -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(LEXICAL_SOURCE.to_string(), DEFAULT_LEXICAL_WEIGHT);
        weights.insert(VECTOR_SOURCE.to_string(), DEFAULT_VECTOR_WEIGHT);
        Self {
            strategy: FusionStrategy::WeightedSum,
            weights,
            rrf_k: DEFAULT_RRF_K,
        }
    }
}

impl FusionConfig {
    /// Convenience constructor for a weighted-sum config over the two
    /// standard sources.
    pub fn weighted(lexical_weight: f32, vector_weight: f32) -> Self {
        let mut weights = BTreeMap::new();
        weights.insert(LEXICAL_SOURCE.to_string(), lexical_weight);
        weights.insert(VECTOR_SOURCE.to_string(), vector_weight);
        Self {
            strategy: FusionStrategy::WeightedSum,
            weights,
            rrf_k: DEFAULT_RRF_K,
        }
    }

    /// Convenience constructor for an RRF config.
    pub fn rrf(rrf_k: u32) -> Self {
        Self {
            strategy: FusionStrategy::Rrf,
            rrf_k,
            ..Self::default()
        }
    }

    /// Checks the configuration before any query runs.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if `rrf_k` is zero or any weight is
    /// negative or non-finite.
    pub fn validate(&self) -> Result<(), SearchError> {
        if self.rrf_k == 0 {
            return Err(SearchError::Config("rrf_k must be positive".to_string()));
        }
        for (source, weight) in &self.weights {
            if !weight.is_finite() || *weight < 0.0 {
                return Err(SearchError::Config(format!(
                    "weight for source '{source}' must be finite and non-negative, got {weight}"
                )));
            }
        }
        Ok(())
    }

    /// The weight assigned to `source`, 0 if unweighted.
    pub fn weight(&self, source: &str) -> f32 {
        self.weights.get(source).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = FusionConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.rrf_k, 60);
        assert_eq!(config.weight(LEXICAL_SOURCE), 0.6);
        assert_eq!(config.weight(VECTOR_SOURCE), 0.4);
    }

    #[test]
    fn test_zero_rrf_k_rejected() {
        let mut config = FusionConfig::rrf(60);
        config.rrf_k = 0;
        assert!(matches!(config.validate(), Err(SearchError::Config(_))));
    }

    #[test]
    fn test_negative_weight_rejected() {
        let config = FusionConfig::weighted(-0.1, 0.5);
        assert!(matches!(config.validate(), Err(SearchError::Config(_))));
    }

    #[test]
    fn test_nan_weight_rejected() {
        let config = FusionConfig::weighted(f32::NAN, 0.5);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_unknown_source_is_voteless() {
        let config = FusionConfig::default();
        assert_eq!(config.weight("graph"), 0.0);
    }

    #[test]
    fn test_strategy_serde_names() {
        let json = serde_json::to_string(&FusionStrategy::WeightedSum).unwrap();
        assert_eq!(json, "\"weighted_sum\"");
        let json = serde_json::to_string(&FusionStrategy::Rrf).unwrap();
        assert_eq!(json, "\"rrf\"");
    }
}
