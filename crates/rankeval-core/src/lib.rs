//! # Rankeval Core
//!
//! Library for evaluating ranked retrieval: precision, recall, F-measure,
//! Average Precision, MAP, R-Precision and the 11-point interpolated
//! precision-recall curve, computed against binary relevance judgments.
//!
//! The crate owns no search engine. Rankings come from a
//! [`backend::RetrievalBackend`], which the [`driver`] queries with bounded
//! concurrency before handing the results to the metric pipeline.
//!
//! ## Modules
//!
//! - [`evaluation`] - Input parsing, per-query metrics, interpolation, aggregation
//! - [`backend`] - Retrieval backend trait, in-memory and TREC run-file backends
//! - [`driver`] - Per-configuration orchestration (timeouts, failure policy, cancellation)
//! - [`report`] - Side-by-side report across configurations
//! - [`config`] - Production configuration constants
//! - [`error`] - Error types for parsing, loading, backends and evaluation

pub mod backend;
pub mod config;
pub mod driver;
pub mod error;
pub mod evaluation;
pub mod report;

#[cfg(test)]
pub(crate) mod test_utils;

pub use backend::{InMemoryBackend, RetrievalBackend};
pub use driver::{
    CancellationFlag, ConfigurationRun, DriverOptions, EvalProgress, EvaluationDriver,
    FailurePolicy, QueryFailure,
};
pub use error::{BackendError, DatasetError, EvalError, MalformedRecord, ParseError};
pub use report::{ConfigurationFailure, EvaluationReport, InputSummary};
