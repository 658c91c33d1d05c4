//! Rankeval CLI - Command-line evaluation of ranked retrieval runs.
//!
//! # Usage
//!
//! ```bash
//! # Evaluate every configuration in a TREC run file
//! rankeval --run runs/lab.txt
//!
//! # Explicit inputs, two configurations compared side by side
//! rankeval --queries query.txt --qrels qrels.txt --run run.txt \
//!     --config standard --config english
//!
//! # Per-query breakdown as JSON, keep going past failed queries
//! rankeval --run run.txt --per-query --json --best-effort
//!
//! # Show help
//! rankeval --help
//! ```

mod config;
mod evaluate;
mod output;

use anyhow::Result;
use clap::Parser;
use evaluate::EvaluateArgs;
use rankeval_core::config::{DEFAULT_BACKEND_TIMEOUT, DEFAULT_CONCURRENCY, METRICS_FILENAME};
use rankeval_core::CancellationFlag;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Rankeval retrieval evaluation CLI.
///
/// Scores a TREC run file against binary relevance judgments: precision,
/// recall, F-measure, MAP, R-Precision and the 11-point interpolated
/// precision-recall curve.
#[derive(Parser)]
#[command(name = "rankeval", version, about)]
struct Cli {
    /// TREC run file (`qid Q0 docno rank score tag`); each tag is a configuration
    #[arg(long)]
    run: PathBuf,

    /// Directory holding query.txt and qrels.txt (default: $RANKEVAL_DATA_DIR, ./evaluation, platform location)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Query source (`id<TAB>text` per line)
    #[arg(long)]
    queries: Option<PathBuf>,

    /// Relevance judgments (`id;doc,doc,...` per line)
    #[arg(long)]
    qrels: Option<PathBuf>,

    /// Configuration to evaluate, repeatable; the first is the baseline (default: every run tag)
    #[arg(long = "config", value_name = "NAME")]
    configurations: Vec<String>,

    /// Maximum backend calls in flight
    #[arg(long, default_value_t = DEFAULT_CONCURRENCY)]
    concurrency: usize,

    /// Per-call backend timeout in seconds
    #[arg(long, default_value_t = DEFAULT_BACKEND_TIMEOUT.as_secs())]
    timeout_secs: u64,

    /// Exclude queries whose backend call fails instead of aborting
    #[arg(long)]
    best_effort: bool,

    /// Include a per-query breakdown
    #[arg(long)]
    per_query: bool,

    /// Output results as JSON
    #[arg(long)]
    json: bool,

    /// File the rendered report is also written to
    #[arg(long, default_value = METRICS_FILENAME)]
    output: PathBuf,

    /// Do not write the metrics file
    #[arg(long)]
    no_output: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    // Ctrl-C stops new backend calls; in-flight ones finish or time out
    let cancel = CancellationFlag::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, finishing in-flight queries");
            on_interrupt.cancel();
        }
    });

    let args = EvaluateArgs {
        data_dir: cli.data_dir,
        queries: cli.queries,
        qrels: cli.qrels,
        run: cli.run,
        configurations: cli.configurations,
        concurrency: cli.concurrency,
        timeout: Duration::from_secs(cli.timeout_secs),
        best_effort: cli.best_effort,
        per_query: cli.per_query,
        show_progress: !cli.json,
    };

    let report = evaluate::execute_evaluation(&args, cancel).await?;

    let rendered = if cli.json {
        output::format_json(&report)
    } else {
        output::format_human(&report)
    };
    println!("{}", rendered);

    if !cli.no_output {
        output::write_metrics_file(&cli.output, &rendered)?;
        info!("Wrote {}", cli.output.display());
    }

    Ok(())
}
