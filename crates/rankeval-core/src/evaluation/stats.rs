//! Statistical comparison of retrieval configurations.
//!
//! Configurations are evaluated on the same queries, so per-query scores
//! form paired observations. This module provides:
//! - A paired two-tailed Student t-test
//! - Paired effect size (Cohen's d_z)
//! - [`compare_average_precision`], which pairs two configurations' AP values
//!
//! # References
//!
//! - Smucker et al. (2007). "A comparison of statistical significance tests for IR evaluation"
//! - Sakai (2014). "Statistical reform in information retrieval?"

use super::metrics::PerQueryMetrics;
use super::types::QueryId;
use crate::config::SIGNIFICANCE_ALPHA;
use serde::Serialize;
use std::collections::HashMap;

/// Result of a paired t-test.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct TTestResult {
    /// t-statistic (positive if the first sample is larger on average)
    pub t_statistic: f64,
    /// Two-tailed p-value
    pub p_value: f64,
    /// Degrees of freedom
    pub df: usize,
}

impl TTestResult {
    /// Returns true if the difference is significant at the given alpha level.
    pub fn is_significant(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }

    /// Formats the result as `t(df)=..., p=...`, starred when p < 0.05.
    pub fn format(&self) -> String {
        let marker = if self.is_significant(SIGNIFICANCE_ALPHA) {
            "*"
        } else {
            ""
        };
        format!(
            "t({})={:.3}, p={:.4}{}",
            self.df, self.t_statistic, self.p_value, marker
        )
    }
}

/// Paired comparison of a candidate configuration against a baseline.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairedComparison {
    /// Configuration compared against
    pub baseline: String,
    /// Configuration being compared
    pub candidate: String,
    /// Per-query metric that was paired
    pub metric: String,
    /// Queries with a defined value under both configurations
    pub paired_queries: usize,
    /// Mean of `candidate - baseline`
    pub mean_difference: f64,
    /// Paired t-test of candidate vs. baseline
    pub ttest: TTestResult,
    /// Cohen's d_z of the differences
    pub effect_size: f64,
    /// p-value below the significance level
    pub significant: bool,
}

/// Performs a paired t-test comparing two systems on the same queries.
///
/// # Arguments
///
/// * `system_a` - Scores from system A
/// * `system_b` - Scores from system B (same queries, same order)
///
/// # Returns
///
/// `None` if the samples differ in length or have fewer than two pairs.
/// Positive t means system A > system B on average.
pub fn paired_ttest(system_a: &[f64], system_b: &[f64]) -> Option<TTestResult> {
    if system_a.len() != system_b.len() || system_a.len() < 2 {
        return None;
    }

    let diffs = differences(system_a, system_b);
    let n = diffs.len();
    let df = n - 1;
    let (mean, std_dev) = mean_and_std_dev(&diffs);
    let standard_error = std_dev / (n as f64).sqrt();

    let (t_statistic, p_value) = if standard_error > 0.0 {
        let t = mean / standard_error;
        (t, two_tailed_p_value(t, df))
    } else if mean == 0.0 {
        // Identical samples
        (0.0, 1.0)
    } else {
        // Constant non-zero shift
        (mean.signum() * f64::INFINITY, 0.0)
    };

    Some(TTestResult {
        t_statistic,
        p_value,
        df,
    })
}

/// Cohen's d_z for paired samples: mean difference over its standard deviation.
///
/// Returns 0.0 when fewer than two pairs exist or the differences are constant.
pub fn paired_effect_size(system_a: &[f64], system_b: &[f64]) -> f64 {
    if system_a.len() != system_b.len() || system_a.len() < 2 {
        return 0.0;
    }

    let (mean, std_dev) = mean_and_std_dev(&differences(system_a, system_b));
    if std_dev == 0.0 {
        0.0
    } else {
        mean / std_dev
    }
}

/// Interprets an effect size using Cohen's conventions.
pub fn interpret_effect_size(d: f64) -> &'static str {
    match d.abs() {
        d if d < 0.2 => "negligible",
        d if d < 0.5 => "small",
        d if d < 0.8 => "medium",
        _ => "large",
    }
}

/// Compares per-query Average Precision of two configurations.
///
/// Only queries where AP is defined under both configurations are paired.
/// Returns `None` when fewer than two such queries exist.
pub fn compare_average_precision(
    baseline_name: &str,
    baseline: &[PerQueryMetrics],
    candidate_name: &str,
    candidate: &[PerQueryMetrics],
) -> Option<PairedComparison> {
    let baseline_ap: HashMap<QueryId, f64> = baseline
        .iter()
        .filter_map(|m| m.average_precision.map(|ap| (m.query_id, ap)))
        .collect();

    let (candidate_scores, baseline_scores): (Vec<f64>, Vec<f64>) = candidate
        .iter()
        .filter_map(|m| {
            let ap = m.average_precision?;
            baseline_ap.get(&m.query_id).map(|&base| (ap, base))
        })
        .unzip();

    let ttest = paired_ttest(&candidate_scores, &baseline_scores)?;
    let (mean_difference, _) = mean_and_std_dev(&differences(&candidate_scores, &baseline_scores));

    Some(PairedComparison {
        baseline: baseline_name.to_string(),
        candidate: candidate_name.to_string(),
        metric: "AP".to_string(),
        paired_queries: candidate_scores.len(),
        mean_difference,
        ttest,
        effect_size: paired_effect_size(&candidate_scores, &baseline_scores),
        significant: ttest.is_significant(SIGNIFICANCE_ALPHA),
    })
}

fn differences(a: &[f64], b: &[f64]) -> Vec<f64> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Sample mean and (n - 1) standard deviation. Requires at least two values.
fn mean_and_std_dev(values: &[f64]) -> (f64, f64) {
    let n = values.len() as f64;
    let mean = values.iter().sum::<f64>() / n;
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    (mean, variance.sqrt())
}

// ============================================================================
// Internal: Student t-distribution tail probability
// ============================================================================

/// Two-tailed p-value of `t` under a t-distribution with `df` degrees of freedom.
///
/// Uses `p = I_x(df/2, 1/2)` with `x = df / (df + t²)`.
fn two_tailed_p_value(t: f64, df: usize) -> f64 {
    let df = df as f64;
    let x = df / (df + t * t);
    regularized_incomplete_beta(x, df / 2.0, 0.5).clamp(0.0, 1.0)
}

/// Regularized incomplete beta function I_x(a, b).
fn regularized_incomplete_beta(x: f64, a: f64, b: f64) -> f64 {
    if x <= 0.0 {
        return 0.0;
    }
    if x >= 1.0 {
        return 1.0;
    }

    let front =
        (ln_gamma(a + b) - ln_gamma(a) - ln_gamma(b) + a * x.ln() + b * (1.0 - x).ln()).exp();

    // The continued fraction converges fastest below the mean of the distribution
    if x < (a + 1.0) / (a + b + 2.0) {
        front * beta_continued_fraction(x, a, b) / a
    } else {
        1.0 - front * beta_continued_fraction(1.0 - x, b, a) / b
    }
}

/// Continued fraction for the incomplete beta, evaluated with modified Lentz.
fn beta_continued_fraction(x: f64, a: f64, b: f64) -> f64 {
    const MAX_ITERATIONS: usize = 200;
    const EPSILON: f64 = 1e-12;
    const TINY: f64 = 1e-300;

    let nudge = |v: f64| if v.abs() < TINY { TINY } else { v };

    let mut c = 1.0;
    let mut d = 1.0 / nudge(1.0 - (a + b) * x / (a + 1.0));
    let mut result = d;

    for m in 1..=MAX_ITERATIONS {
        let m = m as f64;
        let two_m = 2.0 * m;

        let even = m * (b - m) * x / ((a + two_m - 1.0) * (a + two_m));
        d = 1.0 / nudge(1.0 + even * d);
        c = nudge(1.0 + even / c);
        result *= c * d;

        let odd = -(a + m) * (a + b + m) * x / ((a + two_m) * (a + two_m + 1.0));
        d = 1.0 / nudge(1.0 + odd * d);
        c = nudge(1.0 + odd / c);
        let delta = c * d;
        result *= delta;

        if (delta - 1.0).abs() < EPSILON {
            break;
        }
    }

    result
}

/// Natural log of the gamma function (Lanczos, g = 7), for x > 0.
fn ln_gamma(x: f64) -> f64 {
    const G: f64 = 7.0;
    const LANCZOS: [f64; 9] = [
        0.999_999_999_999_809_9,
        676.520_368_121_885_1,
        -1_259.139_216_722_402_8,
        771.323_428_777_653_1,
        -176.615_029_162_140_6,
        12.507_343_278_686_905,
        -0.138_571_095_265_720_12,
        9.984_369_578_019_572e-6,
        1.505_632_735_149_311_6e-7,
    ];

    let x = x - 1.0;
    let t = x + G + 0.5;
    let series = LANCZOS
        .iter()
        .enumerate()
        .skip(1)
        .fold(LANCZOS[0], |acc, (i, &c)| acc + c / (x + i as f64));

    0.5 * (2.0 * std::f64::consts::PI).ln() + (x + 0.5) * t.ln() - t + series.ln()
}

// ============================================================================
// Tests
// ============================================================================
