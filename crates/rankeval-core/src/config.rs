//! Production configuration constants.
//!
//! This module contains constants that define the default evaluation setup
//! for rankeval. These values are used by the parsers, the driver and the
//! CLI so that every entry point agrees on formats and limits.
//!
//! # Usage
//!
//! ```
//! use rankeval_core::config::{DEFAULT_CONCURRENCY, RECALL_LEVEL_COUNT};
//!
//! // One interpolated precision value per standard recall level
//! let curve = [0.0f64; RECALL_LEVEL_COUNT];
//! assert_eq!(curve.len(), 11);
//! assert!(DEFAULT_CONCURRENCY > 0);
//! ```

use std::time::Duration;

// =============================================================================
// Metric Configuration
// =============================================================================

/// Number of standard recall levels on the interpolated precision-recall curve.
///
/// Levels are 0.0, 0.1, ..., 1.0, so level `i` is `i / RECALL_LEVEL_STEPS`.
pub const RECALL_LEVEL_COUNT: usize = 11;

/// Denominator of the standard recall levels (level `i` is `i / 10`).
pub const RECALL_LEVEL_STEPS: usize = RECALL_LEVEL_COUNT - 1;

/// Significance level used when flagging configuration comparisons.
pub const SIGNIFICANCE_ALPHA: f64 = 0.05;

// =============================================================================
// Retrieval Backend Configuration
// =============================================================================

/// Maximum number of backend calls in flight for one configuration.
///
/// Keeps a single evaluation run from flooding the retrieval backend.
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Time allowed for a single backend call before it counts as failed.
pub const DEFAULT_BACKEND_TIMEOUT: Duration = Duration::from_secs(30);

// =============================================================================
// Input Formats
// =============================================================================

/// Separator between query id and query text in the query source.
pub const QUERY_FIELD_SEPARATOR: char = '\t';

/// Separator between query id and the relevant-document list in judgments.
pub const QRELS_FIELD_SEPARATOR: char = ';';

/// Separator between relevant document ids in judgments.
pub const QRELS_DOC_SEPARATOR: char = ',';

/// Default file name of the query source inside a data directory.
pub const QUERIES_FILENAME: &str = "query.txt";

/// Default file name of the relevance judgments inside a data directory.
pub const QRELS_FILENAME: &str = "qrels.txt";

/// Default file name the rendered report is written to.
pub const METRICS_FILENAME: &str = "metrics.txt";
