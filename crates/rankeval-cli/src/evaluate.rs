//! Evaluate command implementation.
//!
//! Loads the evaluation inputs, serves the run file as the retrieval backend
//! and drives every configuration through the core evaluator.

use crate::config;
use anyhow::{bail, Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use rankeval_core::backend::load_run;
use rankeval_core::evaluation::{load_qrels, load_queries};
use rankeval_core::{
    CancellationFlag, DriverOptions, EvalProgress, EvaluationDriver, EvaluationReport,
    FailurePolicy, InputSummary, RetrievalBackend,
};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

/// Inputs and tuning for one evaluation.
#[derive(Debug, Clone)]
pub struct EvaluateArgs {
    pub data_dir: Option<PathBuf>,
    pub queries: Option<PathBuf>,
    pub qrels: Option<PathBuf>,
    pub run: PathBuf,
    /// Configurations to evaluate; empty means every run tag
    pub configurations: Vec<String>,
    pub concurrency: usize,
    pub timeout: Duration,
    pub best_effort: bool,
    pub per_query: bool,
    pub show_progress: bool,
}

/// Runs the evaluation and returns the report.
///
/// This function:
/// 1. Resolves and loads the query source and relevance judgments
/// 2. Loads the run file as the retrieval backend
/// 3. Evaluates each configuration with a progress bar
/// 4. Attaches input counts to the report
///
/// Malformed input lines are logged and counted, never fatal. A failed
/// configuration is listed in the report; the command fails only when no
/// configuration produced a summary.
pub async fn execute_evaluation(
    args: &EvaluateArgs,
    cancel: CancellationFlag,
) -> Result<EvaluationReport> {
    let paths = config::resolve_inputs(
        args.data_dir.as_ref(),
        args.queries.as_ref(),
        args.qrels.as_ref(),
    )?;

    info!("Loading queries: {}", paths.queries.display());
    let queries = load_queries(&paths.queries)
        .with_context(|| format!("Failed to load queries: {}", paths.queries.display()))?;

    info!("Loading relevance judgments: {}", paths.qrels.display());
    let qrels = load_qrels(&paths.qrels)
        .with_context(|| format!("Failed to load judgments: {}", paths.qrels.display()))?;

    info!("Loading run: {}", args.run.display());
    let run = load_run(&args.run)
        .with_context(|| format!("Failed to load run file: {}", args.run.display()))?;

    let inputs = InputSummary {
        queries: queries.records.len(),
        judged_queries: qrels.records.len(),
        malformed_queries: queries.malformed.len(),
        malformed_qrels: qrels.malformed.len(),
        malformed_run_lines: run.malformed.len(),
    };
    if inputs.malformed_total() > 0 {
        warn!(
            "Skipped {} malformed input lines ({} query, {} judgment, {} run)",
            inputs.malformed_total(),
            inputs.malformed_queries,
            inputs.malformed_qrels,
            inputs.malformed_run_lines
        );
    }

    let configurations = if args.configurations.is_empty() {
        run.records.configurations()
    } else {
        args.configurations.clone()
    };
    if configurations.is_empty() {
        bail!("Run file {} contains no configurations", args.run.display());
    }

    info!(
        "Evaluating {} configurations over {} queries",
        configurations.len(),
        queries.records.len()
    );

    let policy = if args.best_effort {
        FailurePolicy::BestEffort
    } else {
        FailurePolicy::Abort
    };
    let options = DriverOptions::default()
        .with_concurrency(args.concurrency)
        .with_timeout(args.timeout)
        .with_failure_policy(policy);
    let driver = EvaluationDriver::with_options(run.records, options).with_cancellation(cancel);

    let total = (queries.records.len() * configurations.len()) as u64;
    let pb = if args.show_progress {
        ProgressBar::new(total)
    } else {
        ProgressBar::hidden()
    };
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg} [{bar:40}] {pos}/{len}")
            .context("Invalid progress bar template")?,
    );

    let report = driver
        .evaluate_all(
            &configurations,
            &queries.records,
            &qrels.records,
            Some(|progress: EvalProgress| {
                pb.set_message(progress.configuration);
                pb.inc(1);
            }),
        )
        .await;
    pb.finish_and_clear();

    let report = report.context("Evaluation failed")?.with_inputs(inputs);
    if report.configurations.is_empty() {
        if let Some(failure) = report.failed.first() {
            bail!("Every configuration failed, first error: {}", failure.error);
        }
    }
    Ok(if args.per_query {
        report
    } else {
        report.without_per_query()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn args(dir: &TempDir) -> EvaluateArgs {
        EvaluateArgs {
            data_dir: Some(dir.path().to_path_buf()),
            queries: None,
            qrels: None,
            run: dir.path().join("run.txt"),
            configurations: Vec::new(),
            concurrency: 2,
            timeout: Duration::from_secs(5),
            best_effort: false,
            per_query: false,
            show_progress: false,
        }
    }

    fn write_inputs(dir: &TempDir, run: &str) {
        fs::write(dir.path().join("query.txt"), "1\ta\n2\tb\nbroken\n").unwrap();
        fs::write(dir.path().join("qrels.txt"), "1;10,20\n2;30\n").unwrap();
        fs::write(dir.path().join("run.txt"), run).unwrap();
    }

    #[tokio::test]
    async fn test_execute_evaluation() {
        let dir = TempDir::new().unwrap();
        write_inputs(
            &dir,
            "1 Q0 10 1 1 default\n1 Q0 5 2 1 default\n1 Q0 20 3 1 default\n2 Q0 31 1 1 default\n2 Q0 30 2 1 default\n",
        );

        let report = execute_evaluation(&args(&dir), CancellationFlag::new())
            .await
            .unwrap();

        let summary = report.summary("default").unwrap();
        let map = summary.mean_average_precision.unwrap();
        assert!((map - 0.6667).abs() < 1e-3);
        assert!(report.configurations[0].per_query.is_empty());

        let inputs = report.inputs.unwrap();
        assert_eq!(inputs.queries, 2);
        assert_eq!(inputs.malformed_queries, 1);
    }

    #[tokio::test]
    async fn test_selected_configurations_and_per_query() {
        let dir = TempDir::new().unwrap();
        write_inputs(&dir, "1 Q0 10 1 1 a\n1 Q0 10 1 1 b\n");

        let mut args = args(&dir);
        args.configurations = vec!["b".to_string()];
        args.per_query = true;
        let report = execute_evaluation(&args, CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(report.configurations.len(), 1);
        assert_eq!(report.baseline(), Some("b"));
        assert_eq!(report.configurations[0].per_query.len(), 2);
    }

    #[tokio::test]
    async fn test_missing_run_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("query.txt"), "1\ta\n").unwrap();
        fs::write(dir.path().join("qrels.txt"), "1;1\n").unwrap();

        let err = execute_evaluation(&args(&dir), CancellationFlag::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Failed to load run file"));
    }

    #[tokio::test]
    async fn test_empty_run_file() {
        let dir = TempDir::new().unwrap();
        write_inputs(&dir, "");

        let err = execute_evaluation(&args(&dir), CancellationFlag::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no configurations"));
    }

    #[tokio::test]
    async fn test_unknown_configuration_is_reported_not_fatal() {
        let dir = TempDir::new().unwrap();
        write_inputs(&dir, "1 Q0 10 1 1 a\n2 Q0 30 1 1 a\n");

        let mut args = args(&dir);
        args.configurations = vec!["a".to_string(), "typo".to_string()];
        let report = execute_evaluation(&args, CancellationFlag::new())
            .await
            .unwrap();

        assert_eq!(report.baseline(), Some("a"));
        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].configuration, "typo");

        args.configurations = vec!["typo".to_string()];
        let err = execute_evaluation(&args, CancellationFlag::new())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("unknown configuration 'typo'"));
    }
}
