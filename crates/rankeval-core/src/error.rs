//! Error types for rankeval-core.
//!
//! This module defines the errors used across the core library: per-line
//! parse failures, fatal dataset loading errors, retrieval backend failures
//! and configuration-level evaluation errors.
//!
//! Undefined metrics (zero denominators) are deliberately absent here. They
//! are ordinary values, represented as `None` in the metric records.

use crate::evaluation::types::QueryId;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Why a single line of an input source could not be used.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// The field separator is missing from the line
    #[error("missing '{0}' separator")]
    MissingSeparator(char),
    /// The query id is not a non-negative integer
    #[error("invalid query id '{0}'")]
    InvalidQueryId(String),
    /// A document id is not a non-negative integer
    #[error("invalid document id '{0}'")]
    InvalidDocId(String),
    /// The query text is empty
    #[error("empty query text")]
    EmptyQueryText,
    /// The query id was already defined by an earlier line
    #[error("duplicate query id {0}")]
    DuplicateQueryId(QueryId),
    /// The line is not valid UTF-8
    #[error("line is not valid UTF-8")]
    InvalidEncoding,
    /// A run-file line does not have the six TREC columns
    #[error("invalid run line: {0}")]
    InvalidRunLine(String),
}

/// A skipped input line, kept for reporting.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {error}")]
pub struct MalformedRecord {
    /// 1-based line number in the source
    pub line: usize,
    /// Reason the line was skipped
    pub error: ParseError,
}

/// Errors that abort loading an input source.
#[derive(Debug, Error)]
pub enum DatasetError {
    /// Failed to read the source
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// Failed to read from a stream without a path
    #[error("Failed to read input: {0}")]
    Read(#[from] std::io::Error),
}

/// Errors reported by a retrieval backend for one call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// The call did not complete within the configured timeout
    #[error("search timed out after {0:?}")]
    Timeout(Duration),
    /// The backend could not serve the request
    #[error("backend unavailable: {0}")]
    Unavailable(String),
    /// The backend does not know the requested configuration
    #[error("unknown configuration '{0}'")]
    UnknownConfiguration(String),
}

/// Errors that prevent a configuration from producing a summary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// No queries were available for the configuration
    #[error("configuration '{configuration}' has no queries to evaluate")]
    EmptyQuerySet { configuration: String },
    /// A backend call failed under the abort policy
    #[error("configuration '{configuration}' aborted at query {query_id}: {source}")]
    Backend {
        configuration: String,
        query_id: QueryId,
        #[source]
        source: BackendError,
    },
    /// The run was cancelled before the configuration finished
    #[error("evaluation of configuration '{configuration}' was cancelled")]
    Cancelled { configuration: String },
    /// The run was started without any configuration
    #[error("no configurations to evaluate")]
    NoConfigurations,
}
