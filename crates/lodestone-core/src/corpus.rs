//! Document corpus loading and text lookup.
//!
//! Corpora are newline-delimited JSON, one document per line. Loading is
//! lossy by policy: a malformed line is skipped with a warning and counted,
//! so one bad record does not block an otherwise usable corpus.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::SearchError;

/// A single document record as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocRecord {
    /// Stable document identifier.
    pub doc_id: String,
    /// Short title, weighted separately by the lexical source.
    #[serde(default)]
    pub title: String,
    /// Full document text.
    #[serde(default)]
    pub body: String,
    /// Free-form labels, unused by scoring.
    #[serde(default)]
    pub tags: Vec<String>,
    /// Where the record came from (ingest system, export name), unused by
    /// scoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl DocRecord {
    /// The text handed to embedders and cross-encoders: title and body on
    /// separate lines.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.title, self.body)
    }
}

/// Resolves a document id to its text for reranking.
pub trait TextLookup: Send + Sync {
    fn text(&self, doc_id: &str) -> Option<String>;
}

/// An in-memory corpus keyed by document id.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    docs: BTreeMap<String, DocRecord>,
}

impl Corpus {
    /// Loads a corpus from a JSONL file, skipping malformed lines.
    ///
    /// # Errors
    ///
    /// Returns [`SearchError::Config`] if the file cannot be opened or read.
    /// A document id appearing twice keeps the last record and logs the
    /// replacement.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SearchError> {
        let (records, skipped) = read_jsonl_lossy::<DocRecord>(path.as_ref())?;
        let mut docs = BTreeMap::new();
        for record in records {
            if docs.insert(record.doc_id.clone(), record).is_some() {
                warn!("Duplicate doc_id in corpus, keeping the later record");
            }
        }
        info!(
            documents = docs.len(),
            skipped, "Loaded corpus from {}",
            path.as_ref().display()
        );
        Ok(Self { docs })
    }

    pub fn insert(&mut self, record: DocRecord) {
        self.docs.insert(record.doc_id.clone(), record);
    }

    pub fn get(&self, doc_id: &str) -> Option<&DocRecord> {
        self.docs.get(doc_id)
    }

    /// Documents in ascending doc_id order.
    pub fn iter(&self) -> impl Iterator<Item = &DocRecord> {
        self.docs.values()
    }

    pub fn len(&self) -> usize {
        self.docs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.docs.is_empty()
    }
}

impl TextLookup for Corpus {
    fn text(&self, doc_id: &str) -> Option<String> {
        self.docs.get(doc_id).map(DocRecord::text)
    }
}

/// Reads a JSONL file, deserializing each line as `T`.
///
/// Returns the parsed records alongside the count of malformed lines that
/// were skipped. Blank lines are ignored without counting.
pub fn read_jsonl_lossy<T: DeserializeOwned>(
    path: &Path,
) -> Result<(Vec<T>, usize), SearchError> {
    let file = File::open(path)
        .map_err(|e| SearchError::Config(format!("cannot open {}: {e}", path.display())))?;
    let reader = BufReader::new(file);

    let mut records = Vec::new();
    let mut skipped = 0usize;
    for (line_no, line) in reader.lines().enumerate() {
        let line = line
            .map_err(|e| SearchError::Config(format!("cannot read {}: {e}", path.display())))?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<T>(&line) {
            Ok(record) => records.push(record),
            Err(e) => {
                warn!(line = line_no + 1, %e, "Skipping malformed JSONL line");
                skipped += 1;
            }
        }
    }
    Ok((records, skipped))
}

/// Produces a short display snippet from document text: the first `max_len`
/// characters of the body with newlines collapsed, ellipsised if truncated.
pub fn snippet(text: &str, max_len: usize) -> String {
    let flat: String = text
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    if flat.chars().count() <= max_len {
        flat
    } else {
        let cut: String = flat.chars().take(max_len).collect();
        format!("{}...", cut.trim_end())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> std::path::PathBuf {
        let path = std::env::temp_dir().join(format!(
            "lodestone-corpus-test-{}.jsonl",
            std::process::id()
        ));
        let mut file = File::create(&path).unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_load_skips_malformed_lines() {
        let path = write_temp(concat!(
            "{\"doc_id\": \"t1\", \"title\": \"a\", \"body\": \"b\"}\n",
            "not json at all\n",
            "\n",
            "{\"doc_id\": \"t2\", \"title\": \"c\", \"body\": \"d\"}\n",
        ));
        let (records, skipped) = read_jsonl_lossy::<DocRecord>(&path).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(records.len(), 2);
        assert_eq!(skipped, 1);
        assert_eq!(records[0].doc_id, "t1");
    }

    #[test]
    fn test_missing_optional_fields_default() {
        let record: DocRecord = serde_json::from_str("{\"doc_id\": \"t9\"}").unwrap();
        assert_eq!(record.doc_id, "t9");
        assert!(record.title.is_empty());
        assert!(record.tags.is_empty());
    }

    #[test]
    fn test_text_joins_title_and_body() {
        let record = DocRecord {
            doc_id: "t1".to_string(),
            title: "reset password".to_string(),
            body: "steps to reset".to_string(),
            tags: vec![],
            source: None,
        };
        assert_eq!(record.text(), "reset password\nsteps to reset");
    }

    #[test]
    fn test_corpus_text_lookup() {
        let mut corpus = Corpus::default();
        corpus.insert(DocRecord {
            doc_id: "t1".to_string(),
            title: "a".to_string(),
            body: "b".to_string(),
            tags: vec![],
            source: None,
        });
        assert_eq!(corpus.text("t1").as_deref(), Some("a\nb"));
        assert!(corpus.text("t2").is_none());
    }

    #[test]
    fn test_snippet_truncates_and_collapses_whitespace() {
        let text = "first line\nsecond   line with lots of extra text here";
        let short = snippet(text, 20);
        assert!(short.ends_with("..."));
        assert!(!short.contains('\n'));
        assert_eq!(snippet("tiny", 20), "tiny");
    }
}
