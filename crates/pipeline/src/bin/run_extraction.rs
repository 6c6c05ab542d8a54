/*
cargo run --bin run_extraction --release -- \
  data/literature.jsonl output/deepseek_r1 \
  --workers 10 --max-tasks 2000
*/

use anyhow::{Context, Result};
use clap::Parser;
use extract::{ChatClient, Extractor};
use pipeline::{ExtractionJob, OutputPaths, PipelineConfig, load_documents};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about = "Bulk biomedical entity/relationship extraction via an LLM")]
struct Cli {
    /// JSONL input: one {"id", "content"} document per line
    documents: PathBuf,
    /// Output prefix; writes <prefix>_entities.csv, <prefix>_relationships.csv,
    /// <prefix>_trace.jsonl
    output_prefix: String,

    #[arg(long, default_value = "https://api.deepseek.com")]
    base_url: String,
    #[arg(long, default_value = "deepseek-reasoner")]
    model: String,
    /// Environment variable holding the API key
    #[arg(long, default_value = "LLM_API_KEY")]
    api_key_env: String,

    #[arg(long)]
    workers: Option<usize>,
    #[arg(long)]
    max_tasks: Option<usize>,
    /// Preset for heavily rate-limited endpoints
    #[arg(long)]
    rate_limited: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();
    let api_key = std::env::var(&cli.api_key_env)
        .with_context(|| format!("{} not set", cli.api_key_env))?;

    let mut config = if cli.rate_limited {
        PipelineConfig::rate_limited()
    } else {
        PipelineConfig::default()
    };
    if let Some(workers) = cli.workers {
        config.num_workers = workers;
    }
    if let Some(max_tasks) = cli.max_tasks {
        config.max_tasks = max_tasks;
    }

    let documents = load_documents(&cli.documents)?;
    println!("Loaded {} documents from {}", documents.len(), cli.documents.display());

    let client = ChatClient::new(cli.base_url, api_key, cli.model)
        .with_sampling(config.temperature, config.max_tokens);
    let extractor = Extractor::new(client, config.retry_policy());
    let outputs = OutputPaths::with_prefix(&cli.output_prefix);

    let job = ExtractionJob::new(config, extractor);
    let summary = job.run(documents, &outputs).await?;

    println!("\n=== Bulk extraction summary ===");
    println!("  Enqueued:          {}", summary.enqueued);
    println!("  Written:           {}", summary.written);
    println!("  Failed:            {}", summary.failed);
    println!("  Skipped (short):   {}", summary.skipped_short);
    println!("  Skipped (done):    {}", summary.skipped_done);
    println!("  Entity rows:       {}", summary.entity_rows);
    println!("  Relationship rows: {}", summary.relationship_rows);
    println!("\nSheets: {} / {}", outputs.entities.display(), outputs.relationships.display());
    println!("Trace log: {}", outputs.trace.display());

    Ok(())
}
