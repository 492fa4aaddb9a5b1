use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::PathBuf;
use std::process::Command;

use log::{debug, warn};

use super::{resolve_tool, CommandRunner};
use crate::disasm::Demangler;

/// Demangles through `rustfilt` (override with `RUSTFILT_BIN`), caching per symbol.
///
/// Any failure (tool missing, non-zero exit, empty output) returns the symbol unchanged.
/// The first fallback is logged at `warn`, later ones at `debug`.
pub struct ToolDemangler<'a> {
    runner: &'a dyn CommandRunner,
    program: PathBuf,
    cache: RefCell<HashMap<String, String>>,
    fallbacks: Cell<usize>,
}

impl<'a> ToolDemangler<'a> {
    pub fn new(runner: &'a dyn CommandRunner) -> Self {
        Self {
            runner,
            program: resolve_tool("RUSTFILT_BIN", "rustfilt"),
            cache: RefCell::default(),
            fallbacks: Cell::new(0),
        }
    }

    /// Number of distinct symbols that were left mangled.
    pub fn fallbacks(&self) -> usize {
        self.fallbacks.get()
    }

    fn fall_back(&self, symbol: &str, reason: &str) {
        if self.fallbacks.get() == 0 {
            warn!("{} unavailable, keeping mangled names ({reason})", self.program.display());
        } else {
            debug!("keeping '{symbol}' mangled: {reason}");
        }
        self.fallbacks.set(self.fallbacks.get() + 1);
    }

    fn invoke(&self, symbol: &str) -> Option<String> {
        let mut cmd = Command::new(&self.program);
        let output = match self.runner.run_with_input(&mut cmd, symbol.as_bytes()) {
            Ok(output) if output.success => output,
            Ok(output) => {
                self.fall_back(symbol, output.stderr_lossy().trim());
                return None;
            }
            Err(e) => {
                self.fall_back(symbol, &e.to_string());
                return None;
            }
        };
        let demangled = output.stdout_lossy().trim().to_string();
        if demangled.is_empty() {
            self.fall_back(symbol, "empty output");
            return None;
        }
        Some(demangled)
    }
}

impl Demangler for ToolDemangler<'_> {
    fn demangle(&self, symbol: &str) -> String {
        if let Some(hit) = self.cache.borrow().get(symbol) {
            return hit.clone();
        }
        let demangled = self.invoke(symbol).unwrap_or_else(|| symbol.to_string());
        self.cache.borrow_mut().insert(symbol.to_string(), demangled.clone());
        demangled
    }
}
