//! Core data model for size measurements.
//!
//! - `FunctionRecord`: one function recovered from disassembly text.
//! - `DisassemblyIndex`: the filtered functions of one (binary, architecture) pair.
//! - `ComparisonRow` / `ArchitectureSummary`: derived, read-only report records.
//! - `BinarySizeRow`: whole-file sizes of the two variants for one architecture.

use std::collections::btree_map;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Which of the two compared builds a measurement belongs to.
///
/// Variant A is the build with assertion checks compiled in, variant B the one without.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Variant {
    A,
    B,
}

/// A function recovered from one disassembly listing.
///
/// Records are finalized once and never mutated afterwards; `byte_size` is derived
/// from the address span and the size formula in effect when the listing was parsed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionRecord {
    /// Short name used as the index key (final `::` segment of the demangled name).
    pub name: String,
    /// Raw label as printed by the disassembler, possibly mangled.
    pub symbol: String,
    /// Display name returned by the demangler.
    pub demangled: String,
    pub start_address: u64,
    /// Address of the last instruction line seen for this function.
    pub end_address: u64,
    pub byte_size: u64,
    /// Raw instruction lines in listing order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub instruction_lines: Vec<String>,
}

/// Filtered functions of one binary, keyed by short name.
///
/// Duplicate short names resolve last-write-wins: a later label in the listing
/// replaces an earlier one with the same short name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisassemblyIndex {
    functions: BTreeMap<String, FunctionRecord>,
}

impl DisassemblyIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a record under its short name, returning the record it replaced.
    pub fn insert(&mut self, record: FunctionRecord) -> Option<FunctionRecord> {
        self.functions.insert(record.name.clone(), record)
    }

    pub fn get(&self, name: &str) -> Option<&FunctionRecord> {
        self.functions.get(name)
    }

    /// Byte size of `name`, or 0 when the function is absent from this binary.
    pub fn size_of(&self, name: &str) -> u64 {
        self.functions.get(name).map(|f| f.byte_size).unwrap_or(0)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.functions.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.functions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.functions.keys().map(String::as_str)
    }

    pub fn iter(&self) -> btree_map::Values<'_, String, FunctionRecord> {
        self.functions.values()
    }
}

impl FromIterator<FunctionRecord> for DisassemblyIndex {
    fn from_iter<I: IntoIterator<Item = FunctionRecord>>(iter: I) -> Self {
        let mut index = DisassemblyIndex::new();
        for record in iter {
            index.insert(record);
        }
        index
    }
}

/// Per-function, per-architecture size comparison between the two variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonRow {
    pub function_name: String,
    pub architecture: String,
    pub size_variant_a: u64,
    pub size_variant_b: u64,
    /// `size_variant_a - size_variant_b`; negative when variant A is smaller.
    pub delta: i64,
}

impl ComparisonRow {
    pub fn new(
        function_name: impl Into<String>,
        architecture: impl Into<String>,
        size_variant_a: u64,
        size_variant_b: u64,
    ) -> Self {
        Self {
            function_name: function_name.into(),
            architecture: architecture.into(),
            size_variant_a,
            size_variant_b,
            delta: signed_delta(size_variant_a, size_variant_b),
        }
    }
}

/// Aggregate of the allow-listed rows of one architecture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArchitectureSummary {
    pub architecture: String,
    pub total_size_a: u64,
    pub total_size_b: u64,
    pub total_delta: i64,
    /// `total_delta / total_size_b * 100`, or exactly 0 when `total_size_b` is 0.
    pub percent_change: f64,
}

/// On-disk size of each variant's binary for one architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinarySizeRow {
    pub architecture: String,
    pub size_a: u64,
    pub size_b: u64,
}

pub(crate) fn signed_delta(a: u64, b: u64) -> i64 {
    (i128::from(a) - i128::from(b)).clamp(i128::from(i64::MIN), i128::from(i64::MAX)) as i64
}
