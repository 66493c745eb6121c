//! Eval command implementation.
//!
//! Loads a judgment set, runs every query through the pipeline, and reports
//! MRR@N and Recall@N with optional per-query detail.

use anyhow::{bail, Context, Result};
use serde::Serialize;
use std::path::Path;

use lodestone_core::evaluation::{evaluate, load_judgments, EvalResult, QueryFlag};
use lodestone_core::search::SearchPipeline;

/// Full evaluation report, serializable for `--json`.
#[derive(Serialize)]
pub struct Report {
    /// The N in MRR@N / Recall@N
    pub n: usize,
    pub queries: usize,
    /// Malformed judgment lines skipped at load time
    pub malformed_skipped: usize,
    #[serde(flatten)]
    pub result: EvalResult,
}

/// Loads judgments from `queries_path` and evaluates `pipeline` at depth `n`.
pub async fn run<P: SearchPipeline>(
    pipeline: &P,
    queries_path: &Path,
    n: usize,
) -> Result<Report> {
    let (judgments, malformed_skipped) = load_judgments(queries_path)
        .with_context(|| format!("Failed to load judgments: {}", queries_path.display()))?;
    if judgments.is_empty() {
        bail!(
            "Judgment file {} contains no usable queries",
            queries_path.display()
        );
    }

    let result = evaluate(&judgments, pipeline, n).await;
    Ok(Report {
        n,
        queries: judgments.len(),
        malformed_skipped,
        result,
    })
}

/// Formats the report as JSON.
pub fn format_json(report: &Report) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats the report for terminal output.
pub fn format_human(report: &Report, per_query: bool) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "Evaluated {} quer{} (top {}):\n",
        report.queries,
        if report.queries == 1 { "y" } else { "ies" },
        report.n
    ));
    output.push_str(&format!("  MRR@{}:    {:.4}\n", report.n, report.result.mrr_at_n));
    output.push_str(&format!(
        "  Recall@{}: {:.4}\n",
        report.n, report.result.recall_at_n
    ));
    if report.result.failed > 0 {
        output.push_str(&format!(
            "  {} quer{} failed and {} excluded from the aggregates\n",
            report.result.failed,
            if report.result.failed == 1 { "y" } else { "ies" },
            if report.result.failed == 1 { "was" } else { "were" },
        ));
    }
    if report.malformed_skipped > 0 {
        output.push_str(&format!(
            "  {} malformed judgment line{} skipped\n",
            report.malformed_skipped,
            if report.malformed_skipped == 1 { "" } else { "s" }
        ));
    }

    if per_query {
        output.push('\n');
        for outcome in &report.result.per_query {
            let recall = outcome
                .recall
                .map_or_else(|| "   -  ".to_string(), |r| format!("{r:.4}"));
            let note = match &outcome.flag {
                Some(QueryFlag::EmptyRelevantSet) => "  (no relevant docs)",
                Some(QueryFlag::PipelineFailed(_)) => "  (failed)",
                None => "",
            };
            output.push_str(&format!(
                "  rr={:.4}  recall={}  {}{}\n",
                outcome.reciprocal_rank, recall, outcome.query, note
            ));
        }
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::evaluation::QueryOutcome;

    fn sample_report() -> Report {
        Report {
            n: 5,
            queries: 2,
            malformed_skipped: 1,
            result: EvalResult {
                per_query: vec![
                    QueryOutcome {
                        query: "good".to_string(),
                        reciprocal_rank: 1.0,
                        recall: Some(1.0),
                        flag: None,
                    },
                    QueryOutcome {
                        query: "bad".to_string(),
                        reciprocal_rank: 0.0,
                        recall: None,
                        flag: Some(QueryFlag::PipelineFailed("boom".to_string())),
                    },
                ],
                mrr_at_n: 1.0,
                recall_at_n: 1.0,
                evaluated: 1,
                failed: 1,
            },
        }
    }

    #[test]
    fn test_human_report_mentions_metrics_and_failures() {
        let rendered = format_human(&sample_report(), true);
        assert!(rendered.contains("MRR@5"));
        assert!(rendered.contains("Recall@5"));
        assert!(rendered.contains("malformed"));
        assert!(rendered.contains("(failed)"));
    }

    #[test]
    fn test_json_report_parses() {
        let rendered = format_json(&sample_report());
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["n"], 5);
        assert_eq!(parsed["mrr_at_n"], 1.0);
        assert_eq!(parsed["per_query"][0]["reciprocal_rank"], 1.0);
    }
}
