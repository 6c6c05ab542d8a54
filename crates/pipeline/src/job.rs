use anyhow::{Context, Result};
use extract::{Document, EntityRow, Extractor, RelationshipRow, TraceRecord};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info, warn};

use crate::cache::ResponseCache;
use crate::config::PipelineConfig;
use crate::sinks::{SpreadsheetSink, TraceLog, completed_ids};

/// Output locations of one bulk run: the two CSV sheets plus the
/// append-only trace log (which doubles as the resume ledger).
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub entities: PathBuf,
    pub relationships: PathBuf,
    pub trace: PathBuf,
}

impl OutputPaths {
    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            entities: PathBuf::from(format!("{prefix}_entities.csv")),
            relationships: PathBuf::from(format!("{prefix}_relationships.csv")),
            trace: PathBuf::from(format!("{prefix}_trace.jsonl")),
        }
    }
}

/// What one worker hands to the writer for one document.
struct ResultBatch {
    entities: Vec<EntityRow>,
    relationships: Vec<RelationshipRow>,
    trace: TraceRecord,
}

#[derive(Debug, Default)]
pub struct JobSummary {
    pub enqueued: usize,
    pub written: usize,
    pub failed: usize,
    pub skipped_short: usize,
    pub skipped_done: usize,
    pub entity_rows: usize,
    pub relationship_rows: usize,
}

/// Bounded producer/consumer bulk-extraction job: one coordinator filling a
/// bounded task channel, N workers calling the model, one writer appending
/// to the sinks so concurrent tasks never race on the same file.
pub struct ExtractionJob {
    config: PipelineConfig,
    extractor: Arc<Extractor>,
    cache: Option<Arc<ResponseCache>>,
}

impl ExtractionJob {
    pub fn new(config: PipelineConfig, extractor: Extractor) -> Self {
        let cache = if config.cache.enabled {
            Some(Arc::new(ResponseCache::new(config.cache.max_entries)))
        } else {
            None
        };
        Self {
            config,
            extractor: Arc::new(extractor),
            cache,
        }
    }

    /// Swap in a pre-built cache (shared across jobs, or seeded in tests).
    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub async fn run(&self, documents: Vec<Document>, outputs: &OutputPaths) -> Result<JobSummary> {
        let mut summary = JobSummary::default();

        let done = completed_ids(&outputs.trace)?;
        if !done.is_empty() {
            info!(count = done.len(), "resuming: documents already in trace log");
        }

        // Coordinator-side filtering: short documents never reach a worker.
        let mut eligible = Vec::new();
        for doc in documents {
            if eligible.len() >= self.config.max_tasks {
                break;
            }
            if done.contains(&doc.id) {
                summary.skipped_done += 1;
            } else if doc.content.chars().count() < self.config.min_content_len {
                debug!(id = %doc.id, "skipping short content");
                summary.skipped_short += 1;
            } else {
                eligible.push(doc);
            }
        }
        summary.enqueued = eligible.len();

        let sheets = SpreadsheetSink::open(&outputs.entities, &outputs.relationships)?;
        let trace_log = TraceLog::open(&outputs.trace)?;

        let (task_tx, task_rx) = mpsc::channel::<Document>(self.config.queue_capacity);
        let task_rx = Arc::new(Mutex::new(task_rx));
        let (result_tx, result_rx) = mpsc::unbounded_channel::<ResultBatch>();

        let bar = ProgressBar::new(summary.enqueued as u64);
        bar.set_style(
            ProgressStyle::with_template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap(),
        );

        let writer = tokio::spawn(write_loop(result_rx, sheets, trace_log, bar.clone()));

        let failed = Arc::new(AtomicUsize::new(0));
        let mut workers = Vec::new();
        for _ in 0..self.config.num_workers {
            workers.push(tokio::spawn(worker_loop(
                Arc::clone(&self.extractor),
                self.cache.clone(),
                Arc::clone(&task_rx),
                result_tx.clone(),
                Arc::clone(&failed),
            )));
        }
        // Workers hold the only remaining result senders; once they finish,
        // the writer drains and stops.
        drop(result_tx);

        for doc in eligible {
            // Blocks when the queue is full, bounding memory.
            task_tx
                .send(doc)
                .await
                .context("all workers exited before the queue drained")?;
        }
        // Closing the channel is the shutdown signal for every worker.
        drop(task_tx);

        for worker in workers {
            worker.await.context("worker panicked")?;
        }
        let (written, entity_rows, relationship_rows) =
            writer.await.context("writer panicked")?;
        bar.finish_and_clear();

        summary.failed = failed.load(Ordering::SeqCst);
        summary.written = written;
        summary.entity_rows = entity_rows;
        summary.relationship_rows = relationship_rows;

        info!(
            enqueued = summary.enqueued,
            written = summary.written,
            failed = summary.failed,
            skipped_short = summary.skipped_short,
            skipped_done = summary.skipped_done,
            "bulk extraction finished"
        );
        Ok(summary)
    }
}

async fn worker_loop(
    extractor: Arc<Extractor>,
    cache: Option<Arc<ResponseCache>>,
    task_rx: Arc<Mutex<mpsc::Receiver<Document>>>,
    result_tx: mpsc::UnboundedSender<ResultBatch>,
    failed: Arc<AtomicUsize>,
) {
    loop {
        // Hold the lock only while receiving, not while extracting.
        let doc = { task_rx.lock().await.recv().await };
        let Some(doc) = doc else {
            break;
        };

        match process_document(&extractor, cache.as_deref(), &doc).await {
            Ok(Some(batch)) => {
                if result_tx.send(batch).is_err() {
                    // Writer is gone; nothing useful left to do.
                    break;
                }
            }
            Ok(None) => {
                warn!(id = %doc.id, "empty extraction result");
                failed.fetch_add(1, Ordering::SeqCst);
            }
            Err(e) => {
                // One document failing never aborts the batch.
                warn!(id = %doc.id, error = %e, "extraction failed");
                failed.fetch_add(1, Ordering::SeqCst);
            }
        }
    }
}

async fn process_document(
    extractor: &Extractor,
    cache: Option<&ResponseCache>,
    doc: &Document,
) -> Result<Option<ResultBatch>> {
    let conversation = Extractor::conversation(&doc.content);

    let outcome = match cache.and_then(|c| c.get(&doc.content)) {
        Some(hit) => {
            debug!(id = %doc.id, "response cache hit");
            hit
        }
        None => {
            let outcome = extractor.respond(&conversation).await?;
            if let Some(cache) = cache {
                cache.put(&doc.content, &outcome);
            }
            outcome
        }
    };

    let result = extract::assemble(&doc.id, conversation, outcome)?;
    if result.extraction.is_empty() {
        return Ok(None);
    }

    let (entities, relationships) = result.extraction.into_rows(&doc.id, &doc.content);
    Ok(Some(ResultBatch {
        entities,
        relationships,
        trace: result.trace,
    }))
}

/// Single consumer for both sinks. A write error is logged per result and
/// the loop keeps going.
async fn write_loop(
    mut result_rx: mpsc::UnboundedReceiver<ResultBatch>,
    mut sheets: SpreadsheetSink,
    mut trace_log: TraceLog,
    bar: ProgressBar,
) -> (usize, usize, usize) {
    let mut written = 0usize;
    let mut entity_rows = 0usize;
    let mut relationship_rows = 0usize;

    while let Some(batch) = result_rx.recv().await {
        if let Err(e) = sheets.append(&batch.entities, &batch.relationships) {
            warn!(id = %batch.trace.id, error = %e, "spreadsheet write failed");
        } else {
            entity_rows += batch.entities.len();
            relationship_rows += batch.relationships.len();
        }

        if let Err(e) = trace_log.append(&batch.trace) {
            warn!(id = %batch.trace.id, error = %e, "trace log write failed");
        }

        written += 1;
        bar.inc(1);
    }

    (written, entity_rows, relationship_rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use extract::{ChatClient, ChatOutcome, RetryPolicy};

    fn temp_outputs(tag: &str) -> OutputPaths {
        let dir = std::env::temp_dir();
        let prefix = format!("{}/pipeline-job-{}-{tag}", dir.display(), std::process::id());
        OutputPaths::with_prefix(&prefix)
    }

    fn cleanup(outputs: &OutputPaths) {
        let _ = std::fs::remove_file(&outputs.entities);
        let _ = std::fs::remove_file(&outputs.relationships);
        let _ = std::fs::remove_file(&outputs.trace);
    }

    fn offline_extractor() -> Extractor {
        // Never actually called: every eligible document is served from the
        // seeded cache.
        let client = ChatClient::new(
            "http://localhost:0".to_string(),
            "test-key".to_string(),
            "test-model".to_string(),
        );
        Extractor::new(client, RetryPolicy::new(0, 1, 1))
    }

    #[tokio::test]
    async fn test_job_with_seeded_cache() {
        let outputs = temp_outputs("seeded");
        cleanup(&outputs);

        let long_content = "a clinical abstract that is long enough to process".to_string();
        let documents = vec![
            Document {
                id: "doc1".to_string(),
                content: long_content.clone(),
            },
            Document {
                id: "short".to_string(),
                content: "too short".to_string(),
            },
        ];

        let cache = Arc::new(ResponseCache::new(16));
        cache.put(
            &long_content,
            &ChatOutcome {
                content: r#"{"Entities": {"aspirin": "drug"}, "Relationships": [["aspirin", "drug", "treat", "headache", "symptom"]]}"#.to_string(),
                reasoning: Some("cached trace".to_string()),
            },
        );

        let job = ExtractionJob::new(PipelineConfig::default(), offline_extractor())
            .with_cache(cache);
        let summary = job.run(documents, &outputs).await.unwrap();

        assert_eq!(summary.enqueued, 1);
        assert_eq!(summary.skipped_short, 1);
        assert_eq!(summary.written, 1);
        assert_eq!(summary.failed, 0);
        assert_eq!(summary.entity_rows, 1);
        assert_eq!(summary.relationship_rows, 1);

        let trace = std::fs::read_to_string(&outputs.trace).unwrap();
        let record: serde_json::Value = serde_json::from_str(trace.lines().next().unwrap()).unwrap();
        assert_eq!(record["id"], "doc1");
        assert_eq!(record["reasoner"], "cached trace");

        cleanup(&outputs);
    }

    #[tokio::test]
    async fn test_job_resumes_from_trace_log() {
        let outputs = temp_outputs("resume");
        cleanup(&outputs);

        std::fs::write(&outputs.trace, "{\"id\": \"doc1\"}\n").unwrap();

        let documents = vec![Document {
            id: "doc1".to_string(),
            content: "a clinical abstract that is long enough to process".to_string(),
        }];

        let job = ExtractionJob::new(PipelineConfig::default(), offline_extractor());
        let summary = job.run(documents, &outputs).await.unwrap();

        assert_eq!(summary.skipped_done, 1);
        assert_eq!(summary.enqueued, 0);
        assert_eq!(summary.written, 0);

        cleanup(&outputs);
    }
}
