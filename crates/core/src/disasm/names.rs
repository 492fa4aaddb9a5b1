use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Turns a raw (possibly mangled) symbol into a display name.
///
/// Implementations never fail: when demangling is not possible they return the
/// input unchanged.
pub trait Demangler {
    fn demangle(&self, symbol: &str) -> String;
}

/// Returns every symbol as-is. Useful when the listing is already demangled.
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityDemangler;

impl Demangler for IdentityDemangler {
    fn demangle(&self, symbol: &str) -> String {
        symbol.to_string()
    }
}

impl<F> Demangler for F
where
    F: Fn(&str) -> String,
{
    fn demangle(&self, symbol: &str) -> String {
        self(symbol)
    }
}

/// Collapse a demangled path to its final segment.
///
/// `<<RingBuffer<T> as Queue<T>>::has_elements>` becomes `has_elements`.
pub fn short_name(demangled: &str) -> &str {
    let trimmed = demangled.trim_matches(|c| c == '<' || c == '>');
    trimmed.rsplit("::").next().unwrap_or(trimmed)
}

/// Decides which demangled functions are kept in an index.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FunctionFilter {
    allow: BTreeSet<String>,
    marker: Option<String>,
}

impl FunctionFilter {
    /// An empty marker is treated as "no marker".
    pub fn new<I, S>(allow: I, marker: Option<&str>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            allow: allow.into_iter().map(Into::into).collect(),
            marker: marker.filter(|m| !m.is_empty()).map(str::to_string),
        }
    }

    /// True when `name` is one of the explicitly listed functions.
    pub fn is_allowed(&self, name: &str) -> bool {
        self.allow.contains(name)
    }

    pub fn marker(&self) -> Option<&str> {
        self.marker.as_deref()
    }

    /// Keep allow-listed short names and marker-matched demangled names; never `main`.
    pub fn keeps(&self, short: &str, demangled: &str) -> bool {
        if short == "main" || demangled == "main" {
            return false;
        }
        self.is_allowed(short) || self.marker.as_deref().is_some_and(|m| demangled.contains(m))
    }
}
