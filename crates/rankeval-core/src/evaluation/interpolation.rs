//! 11-point interpolated precision-recall curve.
//!
//! For each standard recall level L in {0.0, 0.1, ..., 1.0}:
//!
//! ```text
//! P_interp(L) = max { precision(i) : recall(i) >= L }   (0 if no rank reaches L)
//! ```
//!
//! The feasible ranks for a higher level are a subset of those for a lower
//! level, so the curve never increases with L. Levels are compared with
//! integer arithmetic (`hits * 10 >= level * R`), so a rank whose recall is
//! exactly a level is never lost to floating-point rounding.

use super::metrics::PerQueryMetrics;
use crate::config::{RECALL_LEVEL_COUNT, RECALL_LEVEL_STEPS};
use serde::{Serialize, Serializer};

/// Recall value of standard level `index` (0.0 for 0, 1.0 for 10).
pub fn recall_level(index: usize) -> f64 {
    index as f64 / RECALL_LEVEL_STEPS as f64
}

/// Precision at the 11 standard recall levels, index `i` = recall `i / 10`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InterpolatedCurve {
    precision: [f64; RECALL_LEVEL_COUNT],
}

impl InterpolatedCurve {
    /// Creates a curve from precision values ordered by recall level.
    pub fn from_precision(precision: [f64; RECALL_LEVEL_COUNT]) -> Self {
        Self { precision }
    }

    /// Interpolated precision at standard level `index`.
    ///
    /// Returns `None` for an index past the last level.
    pub fn precision_at(&self, index: usize) -> Option<f64> {
        self.precision.get(index).copied()
    }

    /// Precision values ordered by recall level.
    pub fn values(&self) -> &[f64; RECALL_LEVEL_COUNT] {
        &self.precision
    }

    /// `(recall level, interpolated precision)` pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.precision
            .iter()
            .enumerate()
            .map(|(idx, &p)| (recall_level(idx), p))
    }

    /// Returns true if precision never increases with recall.
    pub fn is_non_increasing(&self) -> bool {
        self.precision.windows(2).all(|w| w[1] <= w[0])
    }
}

impl Serialize for InterpolatedCurve {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct Point {
            recall: f64,
            precision: f64,
        }

        serializer.collect_seq(self.points().map(|(recall, precision)| Point { recall, precision }))
    }
}

/// Interpolates a query's rank trace onto the 11 standard recall levels.
///
/// Queries without relevant documents have no meaningful recall and are
/// excluded: the result is `None`.
pub fn interpolate(metrics: &PerQueryMetrics) -> Option<InterpolatedCurve> {
    let relevant = metrics.relevant_count;
    if relevant == 0 {
        return None;
    }

    let mut precision = [0.0; RECALL_LEVEL_COUNT];
    for (level, slot) in precision.iter_mut().enumerate() {
        *slot = metrics
            .rank_trace
            .iter()
            .filter(|point| point.hits * RECALL_LEVEL_STEPS >= level * relevant)
            .map(|point| point.precision)
            .fold(0.0, f64::max);
    }

    Some(InterpolatedCurve { precision })
}
