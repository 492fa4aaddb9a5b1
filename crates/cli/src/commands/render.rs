//! Text renderings of a [`SizeReport`].

use std::fmt::Write as _;

use anyhow::{Context, Result};
use assert_cost_core::report::SizeReport;
use serde::Serialize;

use super::OutputFormat;

/// Render `report` as a table or CSV. JSON serializes `envelope` instead.
pub fn render<T: Serialize>(
    report: &SizeReport,
    labels: &[String; 2],
    format: OutputFormat,
    envelope: &T,
) -> Result<String> {
    match format {
        OutputFormat::Table => Ok(render_table(report, labels)),
        OutputFormat::Csv => Ok(render_csv(report, labels)),
        OutputFormat::Json => render_json(envelope),
    }
}

pub fn render_json<T: Serialize>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to serialize report as JSON")
}

pub fn format_percent(percent: f64) -> String {
    format!("{percent:.2}%")
}

/// Function rows, then the per-architecture summaries, then whole-binary sizes.
pub fn render_csv(report: &SizeReport, labels: &[String; 2]) -> String {
    let [a, b] = labels;
    let mut out = String::new();
    let _ = writeln!(out, "function,arch,size_{a},size_{b},delta");
    for row in &report.rows {
        let _ = writeln!(
            out,
            "{},{},{},{},{}",
            row.function_name, row.architecture, row.size_variant_a, row.size_variant_b, row.delta
        );
    }

    out.push('\n');
    out.push_str("arch,total_diff,percent_change\n");
    for summary in &report.summaries {
        let _ = writeln!(
            out,
            "{},{},{}",
            summary.architecture,
            summary.total_delta,
            format_percent(summary.percent_change)
        );
    }

    if !report.binary_sizes.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "arch,total_elf_{a},total_elf_{b}");
        for row in &report.binary_sizes {
            let _ = writeln!(out, "{},{},{}", row.architecture, row.size_a, row.size_b);
        }
    }
    out
}

/// Aligned columns with one TOTAL line per architecture.
pub fn render_table(report: &SizeReport, labels: &[String; 2]) -> String {
    let [a, b] = labels;
    let name_width = report
        .rows
        .iter()
        .map(|r| r.function_name.len())
        .chain(std::iter::once("TOTAL".len()))
        .max()
        .unwrap_or(8)
        .max("function".len());
    let arch_width = report
        .summaries
        .iter()
        .map(|s| s.architecture.len())
        .chain(report.rows.iter().map(|r| r.architecture.len()))
        .max()
        .unwrap_or(4)
        .max("arch".len());

    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:<name_width$}  {:<arch_width$}  {:>10}  {:>10}  {:>8}",
        "function", "arch", a, b, "delta"
    );
    for summary in &report.summaries {
        for row in report.rows_for(&summary.architecture) {
            let _ = writeln!(
                out,
                "{:<name_width$}  {:<arch_width$}  {:>10}  {:>10}  {:>8}",
                row.function_name,
                row.architecture,
                row.size_variant_a,
                row.size_variant_b,
                row.delta
            );
        }
        let _ = writeln!(
            out,
            "{:<name_width$}  {:<arch_width$}  {:>10}  {:>10}  {:>8}  ({})",
            "TOTAL",
            summary.architecture,
            summary.total_size_a,
            summary.total_size_b,
            summary.total_delta,
            format_percent(summary.percent_change)
        );
    }

    if !report.binary_sizes.is_empty() {
        out.push('\n');
        let _ = writeln!(out, "{:<arch_width$}  {:>12}  {:>12}", "binary", a, b);
        for row in &report.binary_sizes {
            let _ = writeln!(
                out,
                "{:<arch_width$}  {:>12}  {:>12}",
                row.architecture, row.size_a, row.size_b
            );
        }
    }
    out
}
