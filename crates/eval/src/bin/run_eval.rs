/*
cargo run --bin run_eval --release -- \
  data/test_gold.jsonl output/deepseek_r1.jsonl result/deepseek-r1- \
  --judge exact
*/

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use eval::{Judge, LlmJudge, evaluate, load_gold, load_test, print_metrics_table, report};
use extract::ChatClient;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
enum JudgeMode {
    Exact,
    Llm,
}

#[derive(Parser, Debug)]
#[command(version, about = "Score extraction output against gold annotations")]
struct Cli {
    /// Gold-standard JSONL file
    gold: PathBuf,
    /// Model-output JSONL file
    test: PathBuf,
    /// Prefix for the report files (judgment CSVs, metrics plot)
    output_prefix: String,

    #[arg(long, value_enum, default_value_t = JudgeMode::Exact)]
    judge: JudgeMode,

    #[arg(long, default_value = "https://api.deepseek.com")]
    base_url: String,
    #[arg(long, default_value = "deepseek-chat")]
    model: String,
    /// Environment variable holding the API key (LLM judge only)
    #[arg(long, default_value = "LLM_API_KEY")]
    api_key_env: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();

    let cli = Cli::parse();

    let gold = load_gold(&cli.gold)?;
    let test = load_test(&cli.test)?;
    println!(
        "Loaded {} gold / {} test documents",
        gold.len(),
        test.len()
    );

    let judge = match cli.judge {
        JudgeMode::Exact => Judge::Exact,
        JudgeMode::Llm => {
            let api_key = std::env::var(&cli.api_key_env)
                .with_context(|| format!("{} not set", cli.api_key_env))?;
            Judge::Llm(LlmJudge::new(ChatClient::new(cli.base_url, api_key, cli.model)))
        }
    };

    let outcome = evaluate(&gold, &test, &judge).await?;

    let rows = [
        ("Entities", outcome.entity_counts.metrics()),
        ("Relationships", outcome.relationship_counts.metrics()),
    ];
    print_metrics_table(&rows);

    let entity_path = PathBuf::from(format!("{}entity_results.csv", cli.output_prefix));
    let relationship_path =
        PathBuf::from(format!("{}relationship_results.csv", cli.output_prefix));
    let plot_path = PathBuf::from(format!("{}metrics.png", cli.output_prefix));

    report::write_entity_judgments(&entity_path, &outcome.entity_judgments)?;
    report::write_relationship_judgments(&relationship_path, &outcome.relationship_judgments)?;
    report::plot_metrics(&plot_path, &rows)?;

    println!("\nJudgments written to {} and {}", entity_path.display(), relationship_path.display());
    println!("Metrics plot written to {}", plot_path.display());

    Ok(())
}
