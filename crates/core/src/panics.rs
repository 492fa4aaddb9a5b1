//! Tally of panic sites reported by a verifier or lint log.
//!
//! Lines of the form `... call to <function> may panic ...` are counted per function.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanicSite {
    pub function: String,
    pub count: usize,
}

/// Per-function counts in order of first appearance.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PanicTally {
    pub sites: Vec<PanicSite>,
}

impl PanicTally {
    pub fn unique_functions(&self) -> usize {
        self.sites.len()
    }

    pub fn total(&self) -> usize {
        self.sites.iter().map(|s| s.count).sum()
    }

    pub fn count(&self, function: &str) -> usize {
        self.sites.iter().find(|s| s.function == function).map_or(0, |s| s.count)
    }

    fn record(&mut self, function: &str) {
        match self.sites.iter_mut().find(|s| s.function == function) {
            Some(site) => site.count += 1,
            None => self.sites.push(PanicSite { function: function.to_string(), count: 1 }),
        }
    }
}

/// Extract the function named on one log line, if the line reports a panic site.
pub fn panic_site(line: &str) -> Option<&str> {
    if !line.contains("may panic") {
        return None;
    }
    let (_, rest) = line.split_once("call to ")?;
    let function = rest.split(" may panic").next()?.trim();
    (!function.is_empty()).then_some(function)
}

pub fn tally(log: &str) -> PanicTally {
    let mut tally = PanicTally::default();
    for function in log.lines().filter_map(panic_site) {
        tally.record(function);
    }
    tally
}
