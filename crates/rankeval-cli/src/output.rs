//! Output formatting for evaluation reports.
//!
//! Supports both human-readable terminal output and JSON for scripting.
//! Undefined metrics print as `-` in text and `null` in JSON.

use anyhow::{Context, Result};
use rankeval_core::config::RECALL_LEVEL_COUNT;
use rankeval_core::evaluation::stats::interpret_effect_size;
use rankeval_core::evaluation::{recall_level, PerQueryMetrics};
use rankeval_core::EvaluationReport;
use std::fmt::{self, Write as _};
use std::path::Path;

/// Width of section rules
const RULE_WIDTH: usize = 80;

/// Formats the report as JSON.
pub fn format_json(report: &EvaluationReport) -> String {
    serde_json::to_string_pretty(report).unwrap_or_else(|_| "{}".to_string())
}

/// Formats the report for human-readable terminal output.
pub fn format_human(report: &EvaluationReport) -> String {
    let mut out = String::new();
    write_human(&mut out, report)
        .map(|()| out)
        .unwrap_or_default()
}

fn write_human(out: &mut String, report: &EvaluationReport) -> fmt::Result {
    let banner = "=".repeat(RULE_WIDTH);
    writeln!(out, "{banner}")?;
    writeln!(out, "RETRIEVAL EVALUATION")?;
    writeln!(out, "{banner}")?;

    if let Some(inputs) = &report.inputs {
        writeln!(
            out,
            "Queries: {} ({} judged), skipped lines: {} query, {} judgment, {} run",
            inputs.queries,
            inputs.judged_queries,
            inputs.malformed_queries,
            inputs.malformed_qrels,
            inputs.malformed_run_lines
        )?;
    }

    write_summary(out, report)?;
    write_curve(out, report)?;
    write_comparisons(out, report)?;

    if !report.failed.is_empty() {
        section(out, "FAILED CONFIGURATIONS")?;
        for failure in &report.failed {
            writeln!(out, "  {}: {}", failure.configuration, failure.error)?;
        }
    }

    for run in &report.configurations {
        if !run.failures.is_empty() {
            section(out, &format!("EXCLUDED QUERIES ({})", run.summary.configuration))?;
            for failure in &run.failures {
                writeln!(out, "  query {}: {}", failure.query_id, failure.error)?;
            }
        }

        if !run.per_query.is_empty() {
            section(out, &format!("PER-QUERY ({})", run.summary.configuration))?;
            writeln!(
                out,
                "{:<8} {:>6} {:>6} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8}",
                "Query", "N", "R", "Rel", "Prec", "Recall", "F", "AP", "R-Prec"
            )?;
            for m in &run.per_query {
                writeln!(out, "{}", per_query_row(m))?;
            }
        }
    }

    write!(out, "{banner}")
}

fn section(out: &mut String, title: &str) -> fmt::Result {
    writeln!(out, "\n{}", "-".repeat(RULE_WIDTH))?;
    writeln!(out, "{title}")
}

fn write_summary(out: &mut String, report: &EvaluationReport) -> fmt::Result {
    section(out, "SUMMARY")?;
    writeln!(
        out,
        "{:<16} {:>7} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8}",
        "Configuration", "Queries", "Excl", "Prec", "Recall", "F", "MAP", "R-Prec"
    )?;
    for s in report.summaries() {
        writeln!(
            out,
            "{:<16} {:>7} {:>5} {:>8} {:>8} {:>8} {:>8} {:>8}",
            s.configuration,
            s.query_count,
            s.excluded_query_count,
            metric(s.avg_precision),
            metric(s.avg_recall),
            metric(s.f_measure),
            metric(s.mean_average_precision),
            metric(s.avg_r_precision)
        )?;
    }
    for s in report.summaries() {
        writeln!(
            out,
            "{}: retrieved {}, relevant {}, relevant retrieved {}",
            s.configuration, s.total_retrieved, s.total_relevant, s.total_retrieved_relevant
        )?;
    }
    Ok(())
}

fn write_curve(out: &mut String, report: &EvaluationReport) -> fmt::Result {
    section(out, "INTERPOLATED PRECISION @ RECALL")?;
    write!(out, "{:<8}", "Recall")?;
    for s in report.summaries() {
        write!(out, " {:>16}", s.configuration)?;
    }
    writeln!(out)?;

    for level in 0..RECALL_LEVEL_COUNT {
        write!(out, "{:<8.1}", recall_level(level))?;
        for s in report.summaries() {
            let value = s
                .interpolated_precision_recall_curve
                .as_ref()
                .and_then(|curve| curve.precision_at(level));
            write!(out, " {:>16}", metric(value))?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_comparisons(out: &mut String, report: &EvaluationReport) -> fmt::Result {
    if report.comparisons.is_empty() {
        return Ok(());
    }

    section(out, "STATISTICAL COMPARISONS (* = p < 0.05)")?;
    for c in &report.comparisons {
        let sig = if c.significant { "*" } else { "" };
        writeln!(
            out,
            "{} vs {} ({}, {} queries): diff={:+.4} p={:.4}{} d={:.3} ({})",
            c.candidate,
            c.baseline,
            c.metric,
            c.paired_queries,
            c.mean_difference,
            c.ttest.p_value,
            sig,
            c.effect_size,
            interpret_effect_size(c.effect_size)
        )?;
    }
    Ok(())
}

fn per_query_row(m: &PerQueryMetrics) -> String {
    format!(
        "{:<8} {:>6} {:>6} {:>6} {:>8} {:>8} {:>8} {:>8} {:>8}",
        m.query_id,
        m.retrieved_count,
        m.relevant_count,
        m.retrieved_relevant_count,
        metric(m.precision),
        metric(m.recall),
        metric(m.f_measure()),
        metric(m.average_precision),
        metric(m.r_precision)
    )
}

/// Four decimals, or `-` when undefined.
fn metric(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.4}"))
}

/// Writes the rendered report to the metrics file.
pub fn write_metrics_file(path: &Path, contents: &str) -> Result<()> {
    std::fs::write(path, format!("{contents}\n"))
        .with_context(|| format!("Failed to write metrics file: {}", path.display()))
}
