//! Corpus-level aggregation of per-query metrics.
//!
//! Every average divides by the number of queries that contribute a
//! *defined* value to that metric, not by the total query count:
//!
//! | Metric | Contributing queries |
//! |--------|----------------------|
//! | `avg_precision` | N > 0 |
//! | `avg_recall`, MAP, `avg_r_precision`, curve | R > 0 |
//!
//! A query with no relevant documents therefore still counts toward
//! precision but is invisible to recall-based metrics.

use super::interpolation::InterpolatedCurve;
use super::metrics::{f_measure, PerQueryMetrics};
use crate::config::RECALL_LEVEL_COUNT;
use crate::error::EvalError;
use serde::Serialize;

/// Corpus-level summary for one configuration. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CorpusSummary {
    /// Configuration the summary belongs to
    pub configuration: String,
    /// Queries that contributed metrics
    pub query_count: usize,
    /// Queries dropped after backend failures (best-effort policy only)
    pub excluded_query_count: usize,
    /// Σ N over all queries
    pub total_retrieved: usize,
    /// Σ R over all queries
    pub total_relevant: usize,
    /// Σ relevant-retrieved over all queries
    pub total_retrieved_relevant: usize,
    /// Mean precision over queries that retrieved anything
    pub avg_precision: Option<f64>,
    /// Mean recall over queries with relevant documents
    pub avg_recall: Option<f64>,
    /// Harmonic mean of `avg_precision` and `avg_recall`
    pub f_measure: Option<f64>,
    /// MAP: mean AP over queries with relevant documents
    pub mean_average_precision: Option<f64>,
    /// Mean R-Precision over queries with relevant documents
    pub avg_r_precision: Option<f64>,
    /// Level-wise mean of the per-query interpolated curves
    pub interpolated_precision_recall_curve: Option<InterpolatedCurve>,
}

/// Running sum and count of defined values.
#[derive(Debug, Clone, Copy, Default)]
struct MeanAccumulator {
    sum: f64,
    count: usize,
}

impl MeanAccumulator {
    fn push(&mut self, value: Option<f64>) {
        if let Some(value) = value {
            self.sum += value;
            self.count += 1;
        }
    }

    fn mean(&self) -> Option<f64> {
        (self.count > 0).then(|| self.sum / self.count as f64)
    }
}

/// Reduces the per-query metrics of one configuration into a summary.
///
/// # Arguments
///
/// * `configuration` - Name of the configuration being summarized
/// * `metrics` - One record per evaluated query
/// * `excluded_query_count` - Queries dropped before metrics were computed
///
/// # Errors
///
/// Returns [`EvalError::EmptyQuerySet`] if `metrics` is empty.
pub fn aggregate(
    configuration: &str,
    metrics: &[PerQueryMetrics],
    excluded_query_count: usize,
) -> Result<CorpusSummary, EvalError> {
    if metrics.is_empty() {
        return Err(EvalError::EmptyQuerySet {
            configuration: configuration.to_string(),
        });
    }

    let mut precision = MeanAccumulator::default();
    let mut recall = MeanAccumulator::default();
    let mut average_precision = MeanAccumulator::default();
    let mut r_precision = MeanAccumulator::default();
    let mut curve = [MeanAccumulator::default(); RECALL_LEVEL_COUNT];

    let mut total_retrieved = 0;
    let mut total_relevant = 0;
    let mut total_retrieved_relevant = 0;

    for m in metrics {
        total_retrieved += m.retrieved_count;
        total_relevant += m.relevant_count;
        total_retrieved_relevant += m.retrieved_relevant_count;

        precision.push(m.precision);
        recall.push(m.recall);
        average_precision.push(m.average_precision);
        r_precision.push(m.r_precision);

        if let Some(query_curve) = m.interpolated_curve() {
            for (acc, &p) in curve.iter_mut().zip(query_curve.values()) {
                acc.push(Some(p));
            }
        }
    }

    let avg_precision = precision.mean();
    let avg_recall = recall.mean();

    let interpolated_precision_recall_curve = curve[0].mean().map(|_| {
        InterpolatedCurve::from_precision(curve.map(|acc| acc.mean().unwrap_or(0.0)))
    });

    Ok(CorpusSummary {
        configuration: configuration.to_string(),
        query_count: metrics.len(),
        excluded_query_count,
        total_retrieved,
        total_relevant,
        total_retrieved_relevant,
        avg_precision,
        avg_recall,
        f_measure: avg_precision.zip(avg_recall).and_then(|(p, r)| f_measure(p, r)),
        mean_average_precision: average_precision.mean(),
        avg_r_precision: r_precision.mean(),
        interpolated_precision_recall_curve,
    })
}
