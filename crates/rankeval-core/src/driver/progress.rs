//! Progress reporting and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Snapshot sent to the progress callback after each finished query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvalProgress {
    /// Configuration being evaluated
    pub configuration: String,
    /// Queries whose backend call has finished (success or failure)
    pub queries_completed: usize,
    /// Queries in the run
    pub queries_total: usize,
    /// Backend calls that failed so far
    pub failures: usize,
    /// Time since the configuration started
    pub elapsed_ms: u64,
}

impl EvalProgress {
    /// Completed fraction in `[0, 1]`.
    pub fn fraction(&self) -> f64 {
        if self.queries_total == 0 {
            return 1.0;
        }
        self.queries_completed as f64 / self.queries_total as f64
    }
}

/// Shared flag that stops an evaluation run.
///
/// Clones share the same flag. Once set, the driver issues no new backend
/// calls; calls already in flight finish or time out.
#[derive(Debug, Clone, Default)]
pub struct CancellationFlag(Arc<AtomicBool>);

impl CancellationFlag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

impl From<Arc<AtomicBool>> for CancellationFlag {
    fn from(flag: Arc<AtomicBool>) -> Self {
        Self(flag)
    }
}
