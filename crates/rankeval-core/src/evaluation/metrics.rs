//! Per-query retrieval effectiveness metrics.
//!
//! This module computes, for one ranked result list and its ground truth:
//! - Precision and Recall over the full ranking
//! - Average Precision (AP)
//! - R-Precision
//! - A rank-indexed precision/recall trace (input to interpolation)
//!
//! Ratios with a zero denominator are **undefined** and represented as
//! `None`. They are never coerced to 0, so aggregation can exclude them.
//!
//! # References
//!
//! - Manning, Raghavan & Schütze (2008). "Introduction to Information Retrieval", ch. 8
//! - Voorhees & Harman (2005). "TREC: Experiment and Evaluation in Information Retrieval"

use super::interpolation::{interpolate, InterpolatedCurve};
use super::types::{DocId, QueryId};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};

/// Precision and recall after the first `rank` results.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RankPoint {
    /// 1-based rank
    pub rank: usize,
    /// Relevant documents among the first `rank` results
    pub hits: usize,
    /// `hits / rank`
    pub precision: f64,
    /// `hits / R`, fixed at 0 when the query has no relevant documents
    pub recall: f64,
}

/// Evaluation metrics for a single query under one configuration.
///
/// Built once by [`PerQueryMetrics::compute`] and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PerQueryMetrics {
    /// Query the metrics belong to
    pub query_id: QueryId,
    /// N: length of the ranked list
    pub retrieved_count: usize,
    /// R: size of the relevant set
    pub relevant_count: usize,
    /// Relevant documents found anywhere in the ranking
    pub retrieved_relevant_count: usize,
    /// Undefined when nothing was retrieved
    pub precision: Option<f64>,
    /// Undefined when the query has no relevant documents
    pub recall: Option<f64>,
    /// Undefined when the query has no relevant documents
    pub average_precision: Option<f64>,
    /// Undefined when the query has no relevant documents
    pub r_precision: Option<f64>,
    /// One point per rank, 1..=N
    #[serde(skip)]
    pub rank_trace: Vec<RankPoint>,
}

impl PerQueryMetrics {
    /// Computes all metrics for a ranking against its relevant set.
    ///
    /// A relevant document counts as a hit only at its first position in the
    /// ranking. Repeats of the same id are treated as non-relevant, which
    /// keeps recall and AP within [0, 1].
    ///
    /// # Arguments
    ///
    /// * `query_id` - Query being evaluated
    /// * `ranking` - Document ids in rank order (rank 1 first)
    /// * `relevant` - Ground-truth relevant documents for the query
    pub fn compute(query_id: QueryId, ranking: &[DocId], relevant: &BTreeSet<DocId>) -> Self {
        let retrieved_count = ranking.len();
        let relevant_count = relevant.len();

        let mut found: HashSet<DocId> = HashSet::with_capacity(relevant_count);
        let mut rank_trace = Vec::with_capacity(retrieved_count);
        let mut hits = 0;
        let mut precision_at_hits = 0.0;

        for (idx, doc) in ranking.iter().enumerate() {
            let rank = idx + 1;
            let is_hit = relevant.contains(doc) && found.insert(*doc);
            if is_hit {
                hits += 1;
            }

            let point = RankPoint {
                rank,
                hits,
                precision: hits as f64 / rank as f64,
                recall: ratio(hits, relevant_count).unwrap_or(0.0),
            };
            if is_hit {
                precision_at_hits += point.precision;
            }
            rank_trace.push(point);
        }

        let r_precision = (relevant_count > 0).then(|| {
            // Ranks past the end of a short ranking count as misses
            let cutoff = relevant_count.min(retrieved_count);
            let hits_at_cutoff = cutoff
                .checked_sub(1)
                .map_or(0, |last| rank_trace[last].hits);
            hits_at_cutoff as f64 / relevant_count as f64
        });

        Self {
            query_id,
            retrieved_count,
            relevant_count,
            retrieved_relevant_count: hits,
            precision: ratio(hits, retrieved_count),
            recall: ratio(hits, relevant_count),
            average_precision: (relevant_count > 0)
                .then(|| precision_at_hits / relevant_count as f64),
            r_precision,
            rank_trace,
        }
    }

    /// Harmonic mean of this query's precision and recall.
    ///
    /// Undefined when either input is undefined or both are zero.
    pub fn f_measure(&self) -> Option<f64> {
        f_measure(self.precision?, self.recall?)
    }

    /// 11-point interpolated precision-recall curve for this query.
    ///
    /// `None` when the query has no relevant documents.
    pub fn interpolated_curve(&self) -> Option<InterpolatedCurve> {
        interpolate(self)
    }

    /// Returns true if the query has at least one relevant document.
    pub fn has_relevant(&self) -> bool {
        self.relevant_count > 0
    }
}

/// Harmonic mean of precision and recall, undefined when both are zero.
pub fn f_measure(precision: f64, recall: f64) -> Option<f64> {
    let denominator = precision + recall;
    (denominator > 0.0).then(|| 2.0 * precision * recall / denominator)
}

fn ratio(numerator: usize, denominator: usize) -> Option<f64> {
    (denominator > 0).then(|| numerator as f64 / denominator as f64)
}

// ============================================================================
// Tests
// ============================================================================
