use std::fmt;
use std::num::NonZeroU64;
use std::str::FromStr;
use std::sync::OnceLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// Textual layout of a disassembly listing.
///
/// The caller picks the format from the tool that produced the text; it is never
/// sniffed from the content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DisasmFormat {
    /// `otool -tV` style: `label:` headers, instruction lines start with an address.
    LinearScan,
    /// `llvm-objdump -D` style: `<addr> <label>:` headers, `<addr>: <bytes> <asm>` lines.
    Table,
}

impl DisasmFormat {
    /// Classify one listing line. Headers win over instruction lines.
    pub fn classify<'a>(&self, line: &'a str) -> LineKind<'a> {
        let line = line.trim_end_matches('\r');
        match self {
            DisasmFormat::LinearScan => classify_linear(line),
            DisasmFormat::Table => classify_table(line),
        }
    }
}

impl fmt::Display for DisasmFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisasmFormat::LinearScan => f.write_str("linear_scan"),
            DisasmFormat::Table => f.write_str("table"),
        }
    }
}

/// What a single listing line means for the scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineKind<'a> {
    Boundary { label: &'a str },
    Instruction { address: u64 },
    /// Headers, section banners, blank lines and anything else the format does not describe.
    Other,
}

static LINEAR_BOUNDARY_RE: OnceLock<Regex> = OnceLock::new();
static LINEAR_INSN_RE: OnceLock<Regex> = OnceLock::new();
static TABLE_BOUNDARY_RE: OnceLock<Regex> = OnceLock::new();
static TABLE_INSN_RE: OnceLock<Regex> = OnceLock::new();

fn classify_linear(line: &str) -> LineKind<'_> {
    let boundary = LINEAR_BOUNDARY_RE
        .get_or_init(|| Regex::new(r"^[^ \t].*:$").expect("linear boundary regex is valid"));
    if boundary.is_match(line) {
        let label = line.trim().trim_end_matches(':').trim();
        return LineKind::Boundary { label };
    }

    let insn = LINEAR_INSN_RE
        .get_or_init(|| Regex::new(r"^\s*([0-9a-f]+)\s").expect("linear insn regex is valid"));
    match insn.captures(line).and_then(|c| parse_hex(c.get(1)?.as_str())) {
        Some(address) => LineKind::Instruction { address },
        None => LineKind::Other,
    }
}

fn classify_table(line: &str) -> LineKind<'_> {
    let boundary = TABLE_BOUNDARY_RE
        .get_or_init(|| Regex::new(r"^([0-9a-f]+) <(.+)>:$").expect("table boundary regex is valid"));
    if let Some(label) = boundary.captures(line).and_then(|c| c.get(2)) {
        return LineKind::Boundary { label: label.as_str() };
    }

    let insn = TABLE_INSN_RE.get_or_init(|| {
        Regex::new(r"^\s*([0-9a-f]+):\s+([0-9a-f ]+)\s+(.+)$").expect("table insn regex is valid")
    });
    match insn.captures(line).and_then(|c| parse_hex(c.get(1)?.as_str())) {
        Some(address) => LineKind::Instruction { address },
        None => LineKind::Other,
    }
}

fn parse_hex(digits: &str) -> Option<u64> {
    u64::from_str_radix(digits, 16).ok()
}

/// How a function's byte size is derived from its first and last instruction addresses.
///
/// There is no default: each architecture must state which convention applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SizeFormula {
    /// `last - first + 1`: byte-granular addresses, whole bytes traversed.
    InclusiveBytes,
    /// `last - first + width`: the last instruction occupies a fixed-width slot.
    TrailingInstruction { width: NonZeroU64 },
}

impl SizeFormula {
    pub fn trailing(width: u64) -> Option<Self> {
        NonZeroU64::new(width).map(|width| SizeFormula::TrailingInstruction { width })
    }

    /// Smallest size any record can have under this formula.
    pub fn min_size(&self) -> u64 {
        match self {
            SizeFormula::InclusiveBytes => 1,
            SizeFormula::TrailingInstruction { width } => width.get(),
        }
    }

    /// Size of a function spanning `first..=last`. Never below `min_size()`.
    pub fn size(&self, first: u64, last: u64) -> u64 {
        last.saturating_sub(first).saturating_add(self.min_size())
    }
}

impl fmt::Display for SizeFormula {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SizeFormula::InclusiveBytes => f.write_str("inclusive"),
            SizeFormula::TrailingInstruction { width } => write!(f, "width:{width}"),
        }
    }
}

impl FromStr for SizeFormula {
    type Err = String;

    /// Accepts `inclusive` or `width:<N>` with N >= 1.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("inclusive") {
            return Ok(SizeFormula::InclusiveBytes);
        }
        let Some(width) = s.strip_prefix("width:") else {
            return Err(format!("Invalid size formula '{s}'. Expected 'inclusive' or 'width:<N>'"));
        };
        let width: u64 =
            width.trim().parse().map_err(|e| format!("Invalid instruction width '{width}': {e}"))?;
        SizeFormula::trailing(width).ok_or_else(|| "Instruction width must be at least 1".to_string())
    }
}
