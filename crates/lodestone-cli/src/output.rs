//! Output formatting for search results.
//!
//! Supports both human-readable terminal output and JSON for scripting.
//! Per-source raw scores are carried through so callers can see which side
//! of the blend produced each hit.

use serde::Serialize;
use std::collections::BTreeMap;

use lodestone_core::corpus::{snippet, Corpus};
use lodestone_core::search::{ScoredDocument, SearchResponse};

/// Maximum characters to show in a text snippet
const SNIPPET_MAX_LEN: usize = 160;

/// JSON output structure for search results
#[derive(Serialize)]
pub struct JsonOutput {
    pub query: String,
    /// Sources that were unavailable for this query; their absence from
    /// `raw_scores` means "down", not "no match"
    pub degraded_sources: Vec<String>,
    pub results: Vec<JsonResult>,
}

/// Single ranked document in JSON format
#[derive(Serialize)]
pub struct JsonResult {
    pub doc_id: String,
    /// Fused (or reranked) relevance score
    pub score: f32,
    /// Per-source scores as they entered fusion
    pub raw_scores: BTreeMap<String, f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

fn to_json_result(doc: &ScoredDocument, corpus: &Corpus) -> JsonResult {
    let record = corpus.get(&doc.doc_id);
    JsonResult {
        doc_id: doc.doc_id.clone(),
        score: doc.score,
        raw_scores: doc.raw_scores.clone(),
        title: record.map(|r| r.title.clone()),
        snippet: record.map(|r| snippet(&r.body, SNIPPET_MAX_LEN)),
    }
}

/// Formats search results as JSON.
pub fn format_json(query: &str, response: &SearchResponse, corpus: &Corpus) -> String {
    let output = JsonOutput {
        query: query.to_string(),
        degraded_sources: response.degraded_sources.clone(),
        results: response
            .results
            .iter()
            .map(|doc| to_json_result(doc, corpus))
            .collect(),
    };
    serde_json::to_string_pretty(&output).unwrap_or_else(|_| "{}".to_string())
}

/// Formats search results for human-readable terminal output.
pub fn format_human(query: &str, response: &SearchResponse, corpus: &Corpus) -> String {
    let results = &response.results;
    let mut output = String::new();
    for source in &response.degraded_sources {
        output.push_str(&format!(
            "warning: source '{source}' was unavailable; results exclude it\n"
        ));
    }

    if results.is_empty() {
        output.push_str(&format!("No results found for \"{query}\""));
        return output;
    }

    output.push_str(&format!(
        "Found {} result{} for \"{}\":\n\n",
        results.len(),
        if results.len() == 1 { "" } else { "s" },
        query
    ));

    for (rank, doc) in results.iter().enumerate() {
        let sources = doc
            .raw_scores
            .iter()
            .map(|(source, score)| format!("{source}={score:.4}"))
            .collect::<Vec<_>>()
            .join(", ");

        match corpus.get(&doc.doc_id) {
            Some(record) => {
                output.push_str(&format!(
                    "{:>2}. [{:.4}] {} - {}\n",
                    rank + 1,
                    doc.score,
                    doc.doc_id,
                    record.title
                ));
                let body = snippet(&record.body, SNIPPET_MAX_LEN);
                if !body.is_empty() {
                    output.push_str(&format!("    {body}\n"));
                }
            }
            None => {
                output.push_str(&format!(
                    "{:>2}. [{:.4}] {}\n",
                    rank + 1,
                    doc.score,
                    doc.doc_id
                ));
            }
        }
        if !sources.is_empty() {
            output.push_str(&format!("    ({sources})\n"));
        }
        output.push('\n');
    }

    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use lodestone_core::corpus::DocRecord;

    fn sample() -> (SearchResponse, Corpus) {
        let mut corpus = Corpus::default();
        corpus.insert(DocRecord {
            doc_id: "t1".to_string(),
            title: "reset password".to_string(),
            body: "steps to reset a password".to_string(),
            tags: vec![],
            source: None,
        });
        let doc = ScoredDocument::from_source("lexical", "t1", 0.9);
        (SearchResponse::new(vec![doc]), corpus)
    }

    #[test]
    fn test_human_output_includes_title_and_sources() {
        let (response, corpus) = sample();
        let rendered = format_human("password", &response, &corpus);
        assert!(rendered.contains("t1"));
        assert!(rendered.contains("reset password"));
        assert!(rendered.contains("lexical="));
        assert!(!rendered.contains("unavailable"));
    }

    #[test]
    fn test_human_output_empty() {
        let corpus = Corpus::default();
        let rendered = format_human("nothing", &SearchResponse::new(vec![]), &corpus);
        assert!(rendered.contains("No results"));
    }

    #[test]
    fn test_json_output_round_trips() {
        let (response, corpus) = sample();
        let rendered = format_json("password", &response, &corpus);
        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        assert_eq!(parsed["query"], "password");
        assert_eq!(parsed["results"][0]["doc_id"], "t1");
        assert!(parsed["results"][0]["raw_scores"]["lexical"].is_number());
        assert_eq!(parsed["degraded_sources"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_degraded_source_surfaced_in_both_formats() {
        let (mut response, corpus) = sample();
        response.degraded_sources = vec!["vector".to_string()];

        let human = format_human("password", &response, &corpus);
        assert!(human.contains("source 'vector' was unavailable"));

        let json = format_json("password", &response, &corpus);
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["degraded_sources"][0], "vector");
    }
}
