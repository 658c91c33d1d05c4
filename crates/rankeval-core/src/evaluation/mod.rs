//! Set-based retrieval evaluation.
//!
//! Scores ranked result lists against binary relevance judgments and reduces
//! the per-query scores to corpus-level summaries.
//!
//! # Pipeline
//!
//! | Stage | Module | Output |
//! |-------|--------|--------|
//! | Load inputs | [`datasets`] | queries, [`RelevanceTable`] |
//! | Score one query | [`metrics`] | [`PerQueryMetrics`] |
//! | Interpolate | [`interpolation`] | 11-point [`InterpolatedCurve`] |
//! | Reduce | [`aggregate`] | [`CorpusSummary`] |
//! | Compare | [`stats`] | [`PairedComparison`] |
//!
//! # Undefined metrics
//!
//! A ratio with a zero denominator is `None`, never 0. Precision is undefined
//! when nothing was retrieved; recall, AP, R-Precision and the curve are
//! undefined when the query has no relevant documents. Averages skip `None`.
//!
//! # Example
//!
//! ```ignore
//! use rankeval_core::evaluation::{aggregate, ranked_list, PerQueryMetrics, QueryId};
//!
//! let relevant = [10, 20].map(DocId::from_u64).into_iter().collect();
//! let m = PerQueryMetrics::compute(QueryId::from_u64(1), &ranked_list(&[10, 5, 20]), &relevant);
//! assert_eq!(m.retrieved_relevant_count, 2);
//!
//! let summary = aggregate("default", &[m], 0)?;
//! println!("MAP: {:?}", summary.mean_average_precision);
//! ```
//!
//! # Metrics Reference
//!
//! | Metric | Description |
//! |--------|-------------|
//! | Precision | Relevant retrieved / retrieved |
//! | Recall | Relevant retrieved / relevant |
//! | F-measure | Harmonic mean of precision and recall |
//! | AP | Mean precision at each relevant hit, over R |
//! | MAP | Mean AP across queries |
//! | R-Precision | Precision at rank R |

pub mod aggregate;
pub mod datasets;
pub mod interpolation;
pub mod metrics;
pub mod qrels;
pub mod stats;
pub mod types;

pub use aggregate::{aggregate, CorpusSummary};
pub use datasets::{load_qrels, load_queries, parse_qrels, parse_queries, Parsed};
pub use interpolation::{interpolate, recall_level, InterpolatedCurve};
pub use metrics::{f_measure, PerQueryMetrics, RankPoint};
pub use qrels::RelevanceTable;
pub use stats::{compare_average_precision, paired_ttest, PairedComparison, TTestResult};
pub use types::{ranked_list, DocId, Query, QueryId, RankedList};
