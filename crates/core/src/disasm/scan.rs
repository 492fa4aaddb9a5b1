//! Single-pass scan of a listing into raw (unfiltered) functions.
//!
//! The scan is an explicit two-state machine; `ScanState::step` is a pure
//! transition so it can be driven line by line from tests.

use log::{debug, trace};

use super::format::{DisasmFormat, LineKind, SizeFormula};

/// A function boundary together with the instruction lines that followed it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawFunction {
    pub label: String,
    pub start_address: u64,
    pub last_address: u64,
    pub lines: Vec<String>,
}

impl RawFunction {
    pub fn byte_size(&self, formula: SizeFormula) -> u64 {
        formula.size(self.start_address, self.last_address)
    }
}

/// The function currently accumulating instruction lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenFunction {
    label: String,
    start_address: Option<u64>,
    last_address: Option<u64>,
    lines: Vec<String>,
}

impl OpenFunction {
    fn new(label: &str) -> Self {
        Self { label: label.to_string(), start_address: None, last_address: None, lines: Vec::new() }
    }

    /// Finalize; a boundary without any instruction lines yields nothing.
    fn close(self) -> Option<RawFunction> {
        match (self.start_address, self.last_address) {
            (Some(start_address), Some(last_address)) => Some(RawFunction {
                label: self.label,
                start_address,
                last_address,
                lines: self.lines,
            }),
            _ => {
                debug!("dropping '{}': no instruction lines", self.label);
                None
            }
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ScanState {
    #[default]
    NoOpenFunction,
    OpenFunction(OpenFunction),
}

impl ScanState {
    /// Advance by one line. Returns the next state and any function finalized by this line.
    pub fn step(self, line: &str, format: DisasmFormat) -> (ScanState, Option<RawFunction>) {
        match (format.classify(line), self) {
            (LineKind::Boundary { label }, ScanState::NoOpenFunction) => {
                (ScanState::OpenFunction(OpenFunction::new(label)), None)
            }
            (LineKind::Boundary { label }, ScanState::OpenFunction(open)) => {
                (ScanState::OpenFunction(OpenFunction::new(label)), open.close())
            }
            (LineKind::Instruction { address }, ScanState::OpenFunction(mut open)) => {
                open.start_address.get_or_insert(address);
                open.last_address = Some(address);
                open.lines.push(line.trim_end_matches('\r').to_string());
                (ScanState::OpenFunction(open), None)
            }
            (LineKind::Instruction { address }, ScanState::NoOpenFunction) => {
                trace!("instruction at {address:#x} outside any function");
                (ScanState::NoOpenFunction, None)
            }
            (LineKind::Other, state) => (state, None),
        }
    }

    /// End of input: finalize whatever is still open.
    pub fn finish(self) -> Option<RawFunction> {
        match self {
            ScanState::NoOpenFunction => None,
            ScanState::OpenFunction(open) => open.close(),
        }
    }
}

/// Scan the whole listing, returning functions in the order they were closed.
pub fn scan(text: &str, format: DisasmFormat) -> Vec<RawFunction> {
    let mut out = Vec::new();
    let mut state = ScanState::default();
    for line in text.lines() {
        let (next, closed) = state.step(line, format);
        out.extend(closed);
        state = next;
    }
    out.extend(state.finish());
    out
}
