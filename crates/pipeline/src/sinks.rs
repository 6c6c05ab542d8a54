use anyhow::{Context, Result};
use extract::{EntityRow, RelationshipRow, TraceRecord};
use std::collections::HashSet;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::Path;

/// The two-sheet spreadsheet of the batch job, rendered as two CSV files:
/// one for entity rows, one for relationship rows. Only the writer task
/// ever touches these files.
pub struct SpreadsheetSink {
    entities: csv::Writer<File>,
    relationships: csv::Writer<File>,
}

impl SpreadsheetSink {
    /// Open (or create) both sheets in append mode. Headers are written
    /// only when a sheet is new or empty, so re-runs keep appending.
    pub fn open(entities_path: &Path, relationships_path: &Path) -> Result<Self> {
        Ok(Self {
            entities: open_sheet(entities_path)?,
            relationships: open_sheet(relationships_path)?,
        })
    }

    pub fn append(
        &mut self,
        entities: &[EntityRow],
        relationships: &[RelationshipRow],
    ) -> Result<()> {
        for row in entities {
            self.entities.serialize(row).context("failed to append entity row")?;
        }
        for row in relationships {
            self.relationships
                .serialize(row)
                .context("failed to append relationship row")?;
        }
        self.entities.flush()?;
        self.relationships.flush()?;
        Ok(())
    }
}

fn open_sheet(path: &Path) -> Result<csv::Writer<File>> {
    let needs_headers = match std::fs::metadata(path) {
        Ok(meta) => meta.len() == 0,
        Err(_) => true,
    };

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("failed to open sheet {}", path.display()))?;

    Ok(csv::WriterBuilder::new()
        .has_headers(needs_headers)
        .from_writer(file))
}

/// Append-only JSONL log of the full prompt/response conversation per
/// document. Never rewritten; doubles as the resume ledger.
pub struct TraceLog {
    file: File,
}

impl TraceLog {
    pub fn open(path: &Path) -> Result<Self> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .with_context(|| format!("failed to open trace log {}", path.display()))?;
        Ok(Self { file })
    }

    pub fn append(&mut self, record: &TraceRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        writeln!(self.file, "{}", line).context("failed to append trace record")?;
        Ok(())
    }
}

/// Ids already present in a trace log from a previous run. Unparseable
/// lines are skipped; a missing file means a fresh start.
pub fn completed_ids(path: &Path) -> Result<HashSet<String>> {
    let mut ids = HashSet::new();

    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ids),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read trace log {}", path.display()));
        }
    };

    for line in raw.lines() {
        if let Ok(value) = serde_json::from_str::<serde_json::Value>(line) {
            if let Some(id) = value.get("id").and_then(|v| v.as_str()) {
                ids.insert(id.to_string());
            }
        }
    }

    Ok(ids)
}
