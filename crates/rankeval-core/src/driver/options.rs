//! Driver tuning: worker-pool size, per-call timeout and failure policy.

use crate::config::{DEFAULT_BACKEND_TIMEOUT, DEFAULT_CONCURRENCY};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// What the driver does when a backend call fails or times out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FailurePolicy {
    /// Stop the configuration and surface the failing query
    #[default]
    Abort,
    /// Exclude the failing query from every metric and keep going
    BestEffort,
}

/// Options for [`EvaluationDriver`](super::EvaluationDriver).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriverOptions {
    /// Maximum backend calls in flight at once (at least 1)
    pub concurrency: usize,
    /// Per-call timeout
    pub timeout: Duration,
    /// Reaction to a failed backend call
    pub failure_policy: FailurePolicy,
}

impl Default for DriverOptions {
    fn default() -> Self {
        Self {
            concurrency: DEFAULT_CONCURRENCY,
            timeout: DEFAULT_BACKEND_TIMEOUT,
            failure_policy: FailurePolicy::default(),
        }
    }
}

impl DriverOptions {
    /// Sets the worker-pool size. Zero is raised to one.
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    /// Sets the per-call timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the failure policy.
    pub fn with_failure_policy(mut self, failure_policy: FailurePolicy) -> Self {
        self.failure_policy = failure_policy;
        self
    }
}
