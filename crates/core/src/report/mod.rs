//! Comparative reporting across build variants and architectures.
//!
//! Functions missing from one variant contribute size 0; that is a measurement,
//! not an error (the function may have been optimized away entirely).

use std::collections::BTreeSet;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::disasm::FunctionFilter;
use crate::model::{
    signed_delta, ArchitectureSummary, BinarySizeRow, ComparisonRow, DisassemblyIndex,
};

/// One row per function present in either index, ordered by function name.
pub fn compare_indexes(
    architecture: &str,
    variant_a: &DisassemblyIndex,
    variant_b: &DisassemblyIndex,
) -> Vec<ComparisonRow> {
    let names: BTreeSet<&str> = variant_a.names().chain(variant_b.names()).collect();
    names
        .into_iter()
        .map(|name| {
            ComparisonRow::new(name, architecture, variant_a.size_of(name), variant_b.size_of(name))
        })
        .collect()
}

/// Signed percentage of `total_delta` relative to `total_size_b`; 0 when there is no baseline.
pub fn percent_change(total_delta: i64, total_size_b: u64) -> f64 {
    if total_size_b == 0 {
        0.0
    } else {
        total_delta as f64 / total_size_b as f64 * 100.0
    }
}

/// Aggregate the allow-listed rows of `architecture`.
///
/// Marker-matched helpers appear in the rows but never in the summary.
pub fn summarize(
    architecture: &str,
    rows: &[ComparisonRow],
    filter: &FunctionFilter,
) -> ArchitectureSummary {
    let (total_size_a, total_size_b) = rows
        .iter()
        .filter(|r| r.architecture == architecture && filter.is_allowed(&r.function_name))
        .fold((0u64, 0u64), |(a, b), r| {
            (a.saturating_add(r.size_variant_a), b.saturating_add(r.size_variant_b))
        });
    let total_delta = signed_delta(total_size_a, total_size_b);
    ArchitectureSummary {
        architecture: architecture.to_string(),
        total_size_a,
        total_size_b,
        total_delta,
        percent_change: percent_change(total_delta, total_size_b),
    }
}

/// Final report: rows sorted by (function, architecture), summaries in measurement order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SizeReport {
    pub rows: Vec<ComparisonRow>,
    pub summaries: Vec<ArchitectureSummary>,
    #[serde(default)]
    pub binary_sizes: Vec<BinarySizeRow>,
}

impl SizeReport {
    pub fn summary(&self, architecture: &str) -> Option<&ArchitectureSummary> {
        self.summaries.iter().find(|s| s.architecture == architecture)
    }

    pub fn rows_for<'a>(&'a self, architecture: &'a str) -> impl Iterator<Item = &'a ComparisonRow> {
        self.rows.iter().filter(move |r| r.architecture == architecture)
    }
}

/// Accumulates per-architecture comparisons; at most one set of rows per architecture.
#[derive(Debug, Clone)]
pub struct ComparativeReporter {
    filter: FunctionFilter,
    architectures: Vec<String>,
    rows: Vec<ComparisonRow>,
    binary_sizes: Vec<BinarySizeRow>,
}

impl ComparativeReporter {
    pub fn new(filter: FunctionFilter) -> Self {
        Self { filter, architectures: Vec::new(), rows: Vec::new(), binary_sizes: Vec::new() }
    }

    /// Add the comparison of one architecture's two indexes.
    ///
    /// Adding an architecture again replaces its earlier rows, keeping its original
    /// position in the summaries.
    pub fn add_architecture(
        &mut self,
        architecture: &str,
        variant_a: &DisassemblyIndex,
        variant_b: &DisassemblyIndex,
    ) -> &mut Self {
        if self.architectures.iter().any(|a| a == architecture) {
            debug!("replacing earlier comparison rows for {architecture}");
            self.rows.retain(|r| r.architecture != architecture);
        } else {
            self.architectures.push(architecture.to_string());
        }
        self.rows.extend(compare_indexes(architecture, variant_a, variant_b));
        self
    }

    /// Record whole-binary sizes; a later row for the same architecture replaces the earlier one.
    pub fn add_binary_sizes(&mut self, row: BinarySizeRow) -> &mut Self {
        self.binary_sizes.retain(|r| r.architecture != row.architecture);
        self.binary_sizes.push(row);
        self
    }

    pub fn finish(self) -> SizeReport {
        let mut rows = self.rows;
        rows.sort_by(|a, b| {
            a.function_name.cmp(&b.function_name).then_with(|| a.architecture.cmp(&b.architecture))
        });
        let summaries =
            self.architectures.iter().map(|arch| summarize(arch, &rows, &self.filter)).collect();
        SizeReport { rows, summaries, binary_sizes: self.binary_sizes }
    }
}
