//! Disassembly parsing.
//!
//! Turns the raw text output of a disassembler into a [`DisassemblyIndex`]:
//! - `format`: line classification for each supported listing layout and the size formulas.
//! - `scan`: the single-pass state machine that recovers function boundaries.
//! - `names`: demangling seam, short-name derivation and the keep/drop filter.
//!
//! Parsing is best-effort. Lines the format does not describe are skipped and
//! functions without instructions are dropped; neither is an error.

pub mod format;
pub mod names;
pub mod scan;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::model::{DisassemblyIndex, FunctionRecord};

pub use format::{DisasmFormat, LineKind, SizeFormula};
pub use names::{short_name, Demangler, FunctionFilter, IdentityDemangler};
pub use scan::{scan, RawFunction, ScanState};

/// Per-listing parse settings. Both fields must be chosen by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParseOptions {
    pub format: DisasmFormat,
    pub size_formula: SizeFormula,
}

impl ParseOptions {
    pub fn new(format: DisasmFormat, size_formula: SizeFormula) -> Self {
        Self { format, size_formula }
    }
}

/// Parses listings into filtered indexes.
pub struct DisassemblyParser<'a> {
    options: ParseOptions,
    filter: &'a FunctionFilter,
    demangler: &'a dyn Demangler,
}

impl<'a> DisassemblyParser<'a> {
    pub fn new(
        options: ParseOptions,
        filter: &'a FunctionFilter,
        demangler: &'a dyn Demangler,
    ) -> Self {
        Self { options, filter, demangler }
    }

    /// Parse a full listing. Pure with respect to `text` for a deterministic demangler.
    pub fn parse(&self, text: &str) -> DisassemblyIndex {
        let mut index = DisassemblyIndex::new();
        for raw in scan(text, self.options.format) {
            if let Some(record) = self.finalize(raw) {
                if let Some(previous) = index.insert(record) {
                    debug!(
                        "'{}' replaced earlier label '{}' with the same short name",
                        previous.name, previous.symbol
                    );
                }
            }
        }
        index
    }

    /// Demangle, name and size one scanned function; `None` if the filter drops it.
    pub fn finalize(&self, raw: RawFunction) -> Option<FunctionRecord> {
        let demangled = self.demangler.demangle(&raw.label);
        let name = short_name(&demangled).to_string();
        if !self.filter.keeps(&name, &demangled) {
            return None;
        }
        let byte_size = raw.byte_size(self.options.size_formula);
        debug!("{name}: {byte_size} bytes ({:#x}..={:#x})", raw.start_address, raw.last_address);
        Some(FunctionRecord {
            name,
            symbol: raw.label,
            demangled,
            start_address: raw.start_address,
            end_address: raw.last_address,
            byte_size,
            instruction_lines: raw.lines,
        })
    }
}
