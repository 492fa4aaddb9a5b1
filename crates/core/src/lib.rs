//! assert-cost-core
//!
//! Core library for measuring the code-size cost of runtime assertions.
//!
//! Two builds of the same crate (with and without assertion checks) are
//! disassembled per architecture; this crate recovers per-function byte sizes from
//! the disassembler's text output and compares the two builds.
//!
//! All substantive logic lives here so it is testable without a toolchain and
//! reusable from multiple frontends. External tools are reached only through
//! [`tools::CommandRunner`].

pub mod config;
pub mod disasm;
pub mod model;
pub mod panics;
pub mod report;
pub mod services;
pub mod tools;

/// Returns the library version as encoded at compile time.
///
/// Useful for tests and for frontends to report consistent version info.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
