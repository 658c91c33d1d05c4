//! Configuration driver.
//!
//! Runs every query of a configuration through a [`RetrievalBackend`],
//! scores the rankings and folds them into a [`CorpusSummary`]. The driver
//! holds no metric logic of its own.
//!
//! # Concurrency
//!
//! Backend calls are issued through a bounded pool of `concurrency` in-flight
//! requests, each wrapped in a timeout. Results are consumed in query order,
//! so per-query records come out in the same order as the input queries
//! regardless of which call finishes first. Aggregation runs once every call
//! has returned.
//!
//! # Failures
//!
//! Under [`FailurePolicy::Abort`] the first failure stops new calls, waits
//! for the ones in flight and returns [`EvalError::Backend`]. Under
//! [`FailurePolicy::BestEffort`] the failing query is excluded from every
//! metric and recorded in [`ConfigurationRun::failures`].
//!
//! [`EvaluationDriver::evaluate_all`] scopes those failures to a single
//! configuration: a failed configuration is listed in the report and the
//! remaining ones are still evaluated. Only cancellation ends the whole run.

mod options;
mod progress;

pub use options::{DriverOptions, FailurePolicy};
pub use progress::{CancellationFlag, EvalProgress};

use crate::backend::RetrievalBackend;
use crate::error::{BackendError, EvalError};
use crate::evaluation::aggregate::{aggregate, CorpusSummary};
use crate::evaluation::metrics::PerQueryMetrics;
use crate::evaluation::qrels::RelevanceTable;
use crate::evaluation::types::{Query, QueryId, RankedList};
use crate::report::{ConfigurationFailure, EvaluationReport};
use futures::stream::{self, StreamExt};
use serde::{Serialize, Serializer};
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;
use tracing::{debug, info, instrument, warn};

/// A query excluded from a configuration after its backend call failed.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QueryFailure {
    pub query_id: QueryId,
    #[serde(serialize_with = "serialize_display")]
    pub error: BackendError,
}

/// Everything produced for one configuration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConfigurationRun {
    pub summary: CorpusSummary,
    /// Per-query records in input query order
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub per_query: Vec<PerQueryMetrics>,
    /// Queries excluded under the best-effort policy
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub failures: Vec<QueryFailure>,
}

pub(crate) fn serialize_display<E, S>(error: &E, serializer: S) -> Result<S::Ok, S::Error>
where
    E: Display,
    S: Serializer,
{
    serializer.collect_str(error)
}

enum CallOutcome {
    Ranked(RankedList),
    Failed(BackendError),
    /// Not issued: the run was stopped before the call started
    Skipped,
}

/// Evaluates configurations against a retrieval backend.
pub struct EvaluationDriver<B> {
    backend: B,
    options: DriverOptions,
    cancel: CancellationFlag,
}

impl<B: RetrievalBackend> EvaluationDriver<B> {
    /// Creates a driver with default options.
    pub fn new(backend: B) -> Self {
        Self::with_options(backend, DriverOptions::default())
    }

    pub fn with_options(backend: B, options: DriverOptions) -> Self {
        Self {
            backend,
            options,
            cancel: CancellationFlag::new(),
        }
    }

    /// Replaces the cancellation flag with a shared one.
    pub fn with_cancellation(mut self, cancel: CancellationFlag) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Returns a handle that cancels this driver's runs.
    pub fn cancellation(&self) -> CancellationFlag {
        self.cancel.clone()
    }

    /// Evaluates one configuration without progress reporting.
    pub async fn evaluate_configuration(
        &self,
        configuration: &str,
        queries: &[Query],
        qrels: &RelevanceTable,
    ) -> Result<ConfigurationRun, EvalError> {
        self.evaluate_configuration_with_progress(
            configuration,
            queries,
            qrels,
            None::<fn(EvalProgress)>,
        )
        .await
    }

    /// Evaluates one configuration, reporting progress after each query.
    ///
    /// # Errors
    ///
    /// - [`EvalError::EmptyQuerySet`] if `queries` is empty, or if every
    ///   query was excluded under the best-effort policy
    /// - [`EvalError::Backend`] on the first failure under the abort policy
    /// - [`EvalError::Cancelled`] if the run was cancelled before every
    ///   query was searched
    #[instrument(skip_all, fields(configuration = %configuration, queries = queries.len()))]
    pub async fn evaluate_configuration_with_progress<F>(
        &self,
        configuration: &str,
        queries: &[Query],
        qrels: &RelevanceTable,
        mut progress_callback: Option<F>,
    ) -> Result<ConfigurationRun, EvalError>
    where
        F: FnMut(EvalProgress),
    {
        if queries.is_empty() {
            return Err(EvalError::EmptyQuerySet {
                configuration: configuration.to_string(),
            });
        }

        info!(
            "Evaluating configuration '{}' over {} queries (concurrency: {}, timeout: {:?})",
            configuration,
            queries.len(),
            self.options.concurrency,
            self.options.timeout
        );

        let start = Instant::now();
        let stop = AtomicBool::new(false);
        let backend = &self.backend;
        let cancel = &self.cancel;
        let stop_ref = &stop;
        let timeout = self.options.timeout;

        let mut outcomes = stream::iter(queries)
            .map(move |query| async move {
                if stop_ref.load(Ordering::SeqCst) || cancel.is_cancelled() {
                    return (query, CallOutcome::Skipped);
                }
                debug!(query_id = %query.id, "Searching");
                let outcome =
                    match tokio::time::timeout(timeout, backend.search(query, configuration)).await
                    {
                        Ok(Ok(ranking)) => CallOutcome::Ranked(ranking),
                        Ok(Err(e)) => CallOutcome::Failed(e),
                        Err(_) => CallOutcome::Failed(BackendError::Timeout(timeout)),
                    };
                (query, outcome)
            })
            .buffered(self.options.concurrency.max(1));

        let mut per_query = Vec::with_capacity(queries.len());
        let mut failures = Vec::new();
        let mut first_failure: Option<(QueryId, BackendError)> = None;
        let mut completed = 0;
        let mut skipped = 0;

        while let Some((query, outcome)) = outcomes.next().await {
            match outcome {
                CallOutcome::Ranked(ranking) => {
                    per_query.push(PerQueryMetrics::compute(
                        query.id,
                        &ranking,
                        qrels.relevant_for(query.id),
                    ));
                }
                CallOutcome::Failed(error) => match self.options.failure_policy {
                    FailurePolicy::Abort => {
                        stop.store(true, Ordering::SeqCst);
                        if first_failure.is_none() {
                            warn!(
                                "Query {} failed for '{}', aborting: {}",
                                query.id, configuration, error
                            );
                            first_failure = Some((query.id, error));
                        }
                    }
                    FailurePolicy::BestEffort => {
                        warn!(
                            "Excluding query {} from '{}': {}",
                            query.id, configuration, error
                        );
                        failures.push(QueryFailure {
                            query_id: query.id,
                            error,
                        });
                    }
                },
                CallOutcome::Skipped => {
                    skipped += 1;
                    continue;
                }
            }

            completed += 1;
            if let Some(ref mut callback) = progress_callback {
                callback(EvalProgress {
                    configuration: configuration.to_string(),
                    queries_completed: completed,
                    queries_total: queries.len(),
                    failures: failures.len() + usize::from(first_failure.is_some()),
                    elapsed_ms: start.elapsed().as_millis() as u64,
                });
            }
        }

        if let Some((query_id, source)) = first_failure {
            return Err(EvalError::Backend {
                configuration: configuration.to_string(),
                query_id,
                source,
            });
        }

        if skipped > 0 {
            info!(
                "Configuration '{}' cancelled after {} of {} queries",
                configuration,
                completed,
                queries.len()
            );
            return Err(EvalError::Cancelled {
                configuration: configuration.to_string(),
            });
        }

        let summary = aggregate(configuration, &per_query, failures.len())?;

        info!(
            "Configuration '{}' done in {:?}: MAP {}, {} excluded",
            configuration,
            start.elapsed(),
            summary
                .mean_average_precision
                .map_or_else(|| "undefined".to_string(), |map| format!("{map:.4}")),
            summary.excluded_query_count
        );

        Ok(ConfigurationRun {
            summary,
            per_query,
            failures,
        })
    }

    /// Evaluates every configuration in order and builds the comparison report.
    ///
    /// A configuration that fails is recorded in [`EvaluationReport::failed`]
    /// and the remaining configurations still run. The first configuration
    /// with a summary is the baseline for significance testing.
    ///
    /// # Errors
    ///
    /// - [`EvalError::NoConfigurations`] if `configurations` is empty
    /// - [`EvalError::Cancelled`] once the run is cancelled
    pub async fn evaluate_all<F>(
        &self,
        configurations: &[String],
        queries: &[Query],
        qrels: &RelevanceTable,
        mut progress_callback: Option<F>,
    ) -> Result<EvaluationReport, EvalError>
    where
        F: FnMut(EvalProgress),
    {
        if configurations.is_empty() {
            return Err(EvalError::NoConfigurations);
        }

        let mut runs = Vec::with_capacity(configurations.len());
        let mut failed = Vec::new();
        for configuration in configurations {
            if self.cancel.is_cancelled() {
                return Err(EvalError::Cancelled {
                    configuration: configuration.clone(),
                });
            }
            match self
                .evaluate_configuration_with_progress(
                    configuration,
                    queries,
                    qrels,
                    progress_callback.as_mut(),
                )
                .await
            {
                Ok(run) => runs.push(run),
                Err(error @ EvalError::Cancelled { .. }) => return Err(error),
                Err(error) => {
                    warn!("Configuration '{}' failed: {}", configuration, error);
                    failed.push(ConfigurationFailure {
                        configuration: configuration.clone(),
                        error,
                    });
                }
            }
        }

        Ok(EvaluationReport::from_runs(runs).with_failures(failed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::InMemoryBackend;
    use crate::evaluation::types::ranked_list;
    use crate::test_utils::{assert_close, queries, relevant_set, ScriptedBackend};
    use std::time::Duration;

    fn worked_qrels() -> RelevanceTable {
        let mut qrels = RelevanceTable::new();
        qrels.insert(QueryId::from_u64(1), relevant_set(&[10, 20]));
        qrels.insert(QueryId::from_u64(2), relevant_set(&[30]));
        qrels
    }

    fn worked_backend() -> ScriptedBackend {
        ScriptedBackend::new()
            .rank("a", &[10, 5, 20])
            .rank("b", &[31, 30])
    }

    fn ids(run: &ConfigurationRun) -> Vec<u64> {
        run.per_query.iter().map(|m| m.query_id.as_u64()).collect()
    }

    #[tokio::test]
    async fn test_end_to_end_example() {
        let driver = EvaluationDriver::new(worked_backend());
        let run = driver
            .evaluate_configuration("default", &queries(&[(1, "a"), (2, "b")]), &worked_qrels())
            .await
            .unwrap();

        let summary = &run.summary;
        assert_eq!(summary.configuration, "default");
        assert_eq!(summary.query_count, 2);
        assert_close(summary.avg_precision.unwrap(), 0.5833);
        assert_close(summary.avg_recall.unwrap(), 1.0);
        assert_close(summary.f_measure.unwrap(), 0.7368);
        assert_close(summary.mean_average_precision.unwrap(), 0.6667);
        assert_close(summary.avg_r_precision.unwrap(), 0.25);
        assert!(run.failures.is_empty());
    }

    #[tokio::test]
    async fn test_results_keep_query_order() {
        let backend = ScriptedBackend::new()
            .slow("a", Duration::from_millis(40), &[1])
            .slow("b", Duration::from_millis(5), &[2])
            .rank("c", &[3]);
        let driver =
            EvaluationDriver::with_options(backend, DriverOptions::default().with_concurrency(3));

        let run = driver
            .evaluate_configuration(
                "c",
                &queries(&[(7, "a"), (3, "b"), (5, "c")]),
                &RelevanceTable::new(),
            )
            .await
            .unwrap();

        assert_eq!(ids(&run), vec![7, 3, 5]);
    }

    #[tokio::test]
    async fn test_unjudged_query_uses_empty_relevant_set() {
        let driver = EvaluationDriver::new(worked_backend());
        let run = driver
            .evaluate_configuration("c", &queries(&[(9, "a")]), &worked_qrels())
            .await
            .unwrap();

        let m = &run.per_query[0];
        assert_eq!(m.relevant_count, 0);
        assert_eq!(m.precision, Some(0.0));
        assert_eq!(m.recall, None);
    }

    #[tokio::test]
    async fn test_empty_query_set() {
        let driver = EvaluationDriver::new(worked_backend());
        let err = driver
            .evaluate_configuration("english", &[], &worked_qrels())
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::EmptyQuerySet { .. }));
        assert_eq!(driver.backend().calls(), 0);
    }

    #[tokio::test]
    async fn test_abort_surfaces_failing_query() {
        let backend = worked_backend().fail("b", BackendError::Unavailable("down".to_string()));
        let driver = EvaluationDriver::new(backend);

        let err = driver
            .evaluate_configuration("c", &queries(&[(1, "a"), (2, "b")]), &worked_qrels())
            .await
            .unwrap_err();

        match err {
            EvalError::Backend {
                configuration,
                query_id,
                source,
            } => {
                assert_eq!(configuration, "c");
                assert_eq!(query_id, QueryId::from_u64(2));
                assert_eq!(source, BackendError::Unavailable("down".to_string()));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_abort_stops_issuing_calls() {
        let backend = ScriptedBackend::new().fail("a", BackendError::Unavailable("x".to_string()));
        let driver =
            EvaluationDriver::with_options(backend, DriverOptions::default().with_concurrency(1));

        let result = driver
            .evaluate_configuration(
                "c",
                &queries(&[(1, "a"), (2, "b"), (3, "c"), (4, "d")]),
                &RelevanceTable::new(),
            )
            .await;

        assert!(result.is_err());
        assert_eq!(driver.backend().calls(), 1);
    }

    #[tokio::test]
    async fn test_best_effort_excludes_failed_query() {
        let backend = worked_backend().fail("x", BackendError::Unavailable("down".to_string()));
        let options = DriverOptions::default().with_failure_policy(FailurePolicy::BestEffort);
        let driver = EvaluationDriver::with_options(backend, options);

        let run = driver
            .evaluate_configuration(
                "c",
                &queries(&[(1, "a"), (3, "x"), (2, "b")]),
                &worked_qrels(),
            )
            .await
            .unwrap();

        assert_eq!(ids(&run), vec![1, 2]);
        assert_eq!(run.summary.query_count, 2);
        assert_eq!(run.summary.excluded_query_count, 1);
        assert_eq!(run.failures.len(), 1);
        assert_eq!(run.failures[0].query_id, QueryId::from_u64(3));
        // The excluded query does not move the averages
        assert_close(run.summary.mean_average_precision.unwrap(), 0.6667);
    }

    #[tokio::test]
    async fn test_best_effort_with_every_query_failed() {
        let backend = ScriptedBackend::new().fail("a", BackendError::Unavailable("x".to_string()));
        let options = DriverOptions::default().with_failure_policy(FailurePolicy::BestEffort);
        let driver = EvaluationDriver::with_options(backend, options);

        let err = driver
            .evaluate_configuration("c", &queries(&[(1, "a")]), &worked_qrels())
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::EmptyQuerySet { .. }));
    }

    #[tokio::test]
    async fn test_timeout_is_backend_failure() {
        let backend = ScriptedBackend::new().slow("a", Duration::from_millis(500), &[10]);
        let options = DriverOptions::default().with_timeout(Duration::from_millis(20));
        let driver = EvaluationDriver::with_options(backend, options);

        let err = driver
            .evaluate_configuration("c", &queries(&[(1, "a")]), &worked_qrels())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            EvalError::Backend {
                source: BackendError::Timeout(_),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn test_cancelled_before_start_issues_no_calls() {
        let driver = EvaluationDriver::new(worked_backend());
        driver.cancellation().cancel();

        let err = driver
            .evaluate_configuration("c", &queries(&[(1, "a"), (2, "b")]), &worked_qrels())
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::Cancelled { .. }));
        assert_eq!(driver.backend().calls(), 0);
    }

    #[tokio::test]
    async fn test_cancel_mid_run_stops_new_calls() {
        let cancel = CancellationFlag::new();
        let driver =
            EvaluationDriver::with_options(worked_backend(), DriverOptions::default().with_concurrency(1))
                .with_cancellation(cancel.clone());

        let err = driver
            .evaluate_configuration_with_progress(
                "c",
                &queries(&[(1, "a"), (2, "b"), (3, "c")]),
                &worked_qrels(),
                Some(|_: EvalProgress| cancel.cancel()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::Cancelled { .. }));
        assert_eq!(driver.backend().seen(), vec!["a"]);
    }

    #[tokio::test]
    async fn test_progress_callback() {
        let driver = EvaluationDriver::new(worked_backend());
        let mut updates = Vec::new();

        driver
            .evaluate_configuration_with_progress(
                "c",
                &queries(&[(1, "a"), (2, "b")]),
                &worked_qrels(),
                Some(|p: EvalProgress| updates.push(p)),
            )
            .await
            .unwrap();

        assert_eq!(updates.len(), 2);
        assert_eq!(updates[1].queries_completed, 2);
        assert_eq!(updates[1].queries_total, 2);
        assert_eq!(updates[1].failures, 0);
        assert_eq!(updates[1].fraction(), 1.0);
    }

    #[tokio::test]
    async fn test_evaluate_all_requires_configurations() {
        let driver = EvaluationDriver::new(worked_backend());
        let err = driver
            .evaluate_all(
                &[],
                &queries(&[(1, "a")]),
                &worked_qrels(),
                None::<fn(EvalProgress)>,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::NoConfigurations));
    }

    #[tokio::test]
    async fn test_evaluate_all_side_by_side() {
        let backend = InMemoryBackend::new()
            .with_ranking("standard", QueryId::from_u64(1), ranked_list(&[5, 10, 20]))
            .with_ranking("standard", QueryId::from_u64(2), ranked_list(&[30]))
            .with_ranking("english", QueryId::from_u64(1), ranked_list(&[10, 20]))
            .with_ranking("english", QueryId::from_u64(2), ranked_list(&[31, 32, 30]));
        let driver = EvaluationDriver::new(backend);
        let configurations = vec!["standard".to_string(), "english".to_string()];

        let report = driver
            .evaluate_all(
                &configurations,
                &queries(&[(1, "a"), (2, "b")]),
                &worked_qrels(),
                None::<fn(EvalProgress)>,
            )
            .await
            .unwrap();

        let names: Vec<&str> = report
            .configurations
            .iter()
            .map(|run| run.summary.configuration.as_str())
            .collect();
        assert_eq!(names, vec!["standard", "english"]);
        assert_eq!(report.comparisons.len(), 1);
        assert_eq!(report.comparisons[0].baseline, "standard");
        assert_eq!(report.comparisons[0].candidate, "english");
    }

    #[tokio::test]
    async fn test_evaluate_all_continues_past_failed_configuration() {
        let backend = InMemoryBackend::new()
            .with_ranking("a", QueryId::from_u64(1), ranked_list(&[10, 20]))
            .with_ranking("a", QueryId::from_u64(2), ranked_list(&[30]))
            .with_ranking("b", QueryId::from_u64(1), ranked_list(&[5, 10]))
            .with_ranking("b", QueryId::from_u64(2), ranked_list(&[31, 30]));
        let driver = EvaluationDriver::new(backend);
        let configurations = vec!["a".to_string(), "missing".to_string(), "b".to_string()];

        let report = driver
            .evaluate_all(
                &configurations,
                &queries(&[(1, "a"), (2, "b")]),
                &worked_qrels(),
                None::<fn(EvalProgress)>,
            )
            .await
            .unwrap();

        let names: Vec<&str> = report
            .summaries()
            .map(|summary| summary.configuration.as_str())
            .collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(report.summary("a").unwrap().mean_average_precision, Some(1.0));

        assert_eq!(report.failed.len(), 1);
        assert_eq!(report.failed[0].configuration, "missing");
        assert!(matches!(
            report.failed[0].error,
            EvalError::Backend {
                source: BackendError::UnknownConfiguration(_),
                ..
            }
        ));
        assert_eq!(report.comparisons[0].candidate, "b");
    }

    #[tokio::test]
    async fn test_evaluate_all_stops_when_cancelled() {
        let cancel = CancellationFlag::new();
        let driver = EvaluationDriver::new(worked_backend()).with_cancellation(cancel.clone());
        let configurations = vec!["a".to_string(), "b".to_string()];

        let err = driver
            .evaluate_all(
                &configurations,
                &queries(&[(1, "a"), (2, "b")]),
                &worked_qrels(),
                Some(|_: EvalProgress| cancel.cancel()),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, EvalError::Cancelled { .. }));
    }
}
