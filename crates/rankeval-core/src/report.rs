//! Side-by-side evaluation report.
//!
//! Collects the [`ConfigurationRun`] of every configuration in evaluation
//! order, plus paired AP comparisons of each configuration against the
//! first one. Configurations that produced no summary are listed in
//! [`EvaluationReport::failed`] and take no part in comparisons. Rendering to text or JSON is left to the caller; the report
//! only derives `Serialize`.

use crate::driver::{serialize_display, ConfigurationRun};
use crate::error::EvalError;
use crate::evaluation::aggregate::CorpusSummary;
use crate::evaluation::stats::{compare_average_precision, PairedComparison};
use serde::Serialize;

/// Counts describing the loaded inputs.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct InputSummary {
    /// Queries loaded from the query source
    pub queries: usize,
    /// Queries with at least one relevance judgment line
    pub judged_queries: usize,
    /// Skipped query-source lines
    pub malformed_queries: usize,
    /// Skipped judgment lines
    pub malformed_qrels: usize,
    /// Skipped run-file lines
    pub malformed_run_lines: usize,
}

impl InputSummary {
    /// Total skipped lines across every source.
    pub fn malformed_total(&self) -> usize {
        self.malformed_queries + self.malformed_qrels + self.malformed_run_lines
    }
}

/// A configuration that failed without a summary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationFailure {
    pub configuration: String,
    #[serde(serialize_with = "serialize_display")]
    pub error: EvalError,
}

/// Results for every evaluated configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationReport {
    /// Per-configuration results in evaluation order
    pub configurations: Vec<ConfigurationRun>,
    /// Each configuration after the first compared against the first
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub comparisons: Vec<PairedComparison>,
    /// Configurations that failed, in evaluation order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failed: Vec<ConfigurationFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inputs: Option<InputSummary>,
}

impl EvaluationReport {
    /// Builds a report, comparing every run against the first.
    ///
    /// Comparisons with fewer than two paired queries are omitted.
    pub fn from_runs(runs: Vec<ConfigurationRun>) -> Self {
        let comparisons = match runs.split_first() {
            Some((baseline, candidates)) => candidates
                .iter()
                .filter_map(|candidate| {
                    compare_average_precision(
                        &baseline.summary.configuration,
                        &baseline.per_query,
                        &candidate.summary.configuration,
                        &candidate.per_query,
                    )
                })
                .collect(),
            None => Vec::new(),
        };

        Self {
            configurations: runs,
            comparisons,
            failed: Vec::new(),
            inputs: None,
        }
    }

    /// Attaches configurations that failed.
    pub fn with_failures(mut self, failed: Vec<ConfigurationFailure>) -> Self {
        self.failed = failed;
        self
    }

    /// Attaches input counts.
    pub fn with_inputs(mut self, inputs: InputSummary) -> Self {
        self.inputs = Some(inputs);
        self
    }

    /// Drops per-query records, keeping summaries and comparisons.
    pub fn without_per_query(mut self) -> Self {
        for run in &mut self.configurations {
            run.per_query.clear();
        }
        self
    }

    /// Name of the baseline configuration, the first one with a summary.
    pub fn baseline(&self) -> Option<&str> {
        self.configurations
            .first()
            .map(|run| run.summary.configuration.as_str())
    }

    pub fn summaries(&self) -> impl Iterator<Item = &CorpusSummary> {
        self.configurations.iter().map(|run| &run.summary)
    }

    /// Looks up a configuration's summary by name.
    pub fn summary(&self, configuration: &str) -> Option<&CorpusSummary> {
        self.summaries()
            .find(|summary| summary.configuration == configuration)
    }
}
