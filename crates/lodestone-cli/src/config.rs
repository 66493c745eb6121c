//! Option resolution for the CLI.
//!
//! Tuning options come from three layers, highest precedence first:
//! command-line flags, the optional `--config` JSON file, and built-in
//! defaults. An unknown key in the config file is an error rather than a
//! silent no-op.

use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::Deserialize;
use std::fs;
use std::path::Path;

use lodestone_core::config::{
    FusionConfig, FusionStrategy, DEFAULT_LEXICAL_WEIGHT, DEFAULT_RRF_K, DEFAULT_VECTOR_WEIGHT,
};
use lodestone_core::search::{DEFAULT_CANDIDATE_POOL, DEFAULT_TOP_N};

/// `--blend` flag values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlendArg {
    Weighted,
    Rrf,
}

/// Optional defaults loaded from a `--config` JSON file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FileConfig {
    blend: Option<BlendArg>,
    top_n: Option<usize>,
    candidates: Option<usize>,
    w_lexical: Option<f32>,
    w_vector: Option<f32>,
    rrf_k: Option<u32>,
    rerank: Option<bool>,
}

/// Fully resolved pipeline options.
#[derive(Debug, Clone)]
pub struct Options {
    pub fusion: FusionConfig,
    pub top_n: usize,
    pub candidates: usize,
    pub rerank: bool,
}

/// Merges CLI flags over the config file over defaults.
pub fn resolve(args: &crate::CommonArgs) -> Result<Options> {
    let file = match &args.config {
        Some(path) => load_file(path)?,
        None => FileConfig::default(),
    };

    let blend = args.blend.or(file.blend).unwrap_or(BlendArg::Weighted);
    let w_lexical = args
        .w_lexical
        .or(file.w_lexical)
        .unwrap_or(DEFAULT_LEXICAL_WEIGHT);
    let w_vector = args
        .w_vector
        .or(file.w_vector)
        .unwrap_or(DEFAULT_VECTOR_WEIGHT);
    let rrf_k = args.rrf_k.or(file.rrf_k).unwrap_or(DEFAULT_RRF_K);

    let mut fusion = match blend {
        BlendArg::Weighted => FusionConfig::weighted(w_lexical, w_vector),
        BlendArg::Rrf => FusionConfig::rrf(rrf_k),
    };
    // Keep both knobs populated so a strategy switch via config alone
    // behaves the same as via flags.
    fusion.rrf_k = rrf_k;
    if fusion.strategy == FusionStrategy::Rrf {
        fusion.weights.clear();
    }
    fusion
        .validate()
        .context("Invalid fusion configuration")?;

    Ok(Options {
        fusion,
        top_n: args.top_n.or(file.top_n).unwrap_or(DEFAULT_TOP_N),
        candidates: args
            .candidates
            .or(file.candidates)
            .unwrap_or(DEFAULT_CANDIDATE_POOL),
        rerank: args.rerank || file.rerank.unwrap_or(false),
    })
}

fn load_file(path: &Path) -> Result<FileConfig> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "lodestone-cli-config-test-{}.json",
            std::process::id()
        ));
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_file_config_parses_known_keys() {
        let path = write_config(r#"{"blend": "rrf", "top_n": 5, "rrf_k": 30}"#);
        let config = load_file(&path).unwrap();
        fs::remove_file(&path).ok();

        assert_eq!(config.blend, Some(BlendArg::Rrf));
        assert_eq!(config.top_n, Some(5));
        assert_eq!(config.rrf_k, Some(30));
        assert!(config.w_lexical.is_none());
    }

    #[test]
    fn test_unknown_key_rejected() {
        let path = write_config(r#"{"blend": "rrf", "bogus": 1}"#);
        let result = load_file(&path);
        fs::remove_file(&path).ok();
        assert!(result.is_err());
    }
}
