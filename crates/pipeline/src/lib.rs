pub mod cache;
pub mod config;
pub mod job;
pub mod sinks;

pub use cache::ResponseCache;
pub use config::{CacheConfig, PipelineConfig, RetryConfig};
pub use job::{ExtractionJob, JobSummary, OutputPaths};
pub use sinks::{SpreadsheetSink, TraceLog, completed_ids};

use anyhow::{Context, Result};
use extract::Document;
use std::path::Path;

/// Load the bulk-job input: one `{"id": ..., "content": ...}` JSON object
/// per line. Blank lines are allowed; anything else malformed is an error
/// naming the offending line.
pub fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read documents from {}", path.display()))?;

    let mut documents = Vec::new();
    for (lineno, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let doc: Document = serde_json::from_str(line)
            .with_context(|| format!("bad document record at {}:{}", path.display(), lineno + 1))?;
        documents.push(doc);
    }

    Ok(documents)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_load_documents() {
        let path = std::env::temp_dir().join(format!("pipeline-docs-{}.jsonl", std::process::id()));
        std::fs::write(
            &path,
            "{\"id\": \"d1\", \"content\": \"first\"}\n\n{\"id\": \"d2\", \"content\": \"second\"}\n",
        )
        .unwrap();

        let docs = load_documents(&path).unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0].id, "d1");
        assert_eq!(docs[1].content, "second");

        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn test_load_documents_reports_bad_line() {
        let path =
            std::env::temp_dir().join(format!("pipeline-bad-docs-{}.jsonl", std::process::id()));
        std::fs::write(&path, "{\"id\": \"d1\", \"content\": \"ok\"}\nnot json\n").unwrap();

        let err = load_documents(&path).unwrap_err();
        assert!(format!("{err}").contains(":2"));

        let _ = std::fs::remove_file(&path);
    }
}
