//! Frontend helpers for the `assert-cost` binary.
//!
//! Every subcommand lives in [`commands`] so it can be driven from tests without
//! spawning the binary.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

pub mod commands;

/// Canonicalize the root path if possible, falling back to the given path
/// relative to the current working directory.
pub fn canonicalize_or_current(root: &Path) -> Result<PathBuf> {
    if root == Path::new(".") {
        return env::current_dir().context("Failed to get current directory");
    }
    match root.canonicalize() {
        Ok(p) => Ok(p),
        Err(_) => {
            let cwd = env::current_dir().context("Failed to get current directory")?;
            Ok(cwd.join(root))
        }
    }
}

/// Initialize `env_logger`. `RUST_LOG` wins; otherwise `verbose` selects `debug` over `warn`.
pub fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .try_init();
}
