use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use assert_cost_core::config::HarnessConfig;
use assert_cost_core::services::measure::Listing;
use log::info;

/// Load the harness configuration, or the built-in defaults when no path is given.
pub fn load_config(path: Option<&Path>) -> Result<HarnessConfig> {
    match path {
        Some(path) => HarnessConfig::load(path)
            .with_context(|| format!("Failed to load config {}", path.display())),
        None => Ok(HarnessConfig::default()),
    }
}

pub fn read_text(path: &Path) -> Result<String> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(String::from_utf8_lossy(&bytes).into_owned())
}

/// `<dir>/<function>/<arch>-<function>-<variant>.asm`.
pub fn listing_path(dir: &Path, architecture: &str, function: &str, variant: &str) -> PathBuf {
    dir.join(function).join(format!("{architecture}-{function}-{variant}.asm"))
}

/// Write the instruction lines of every parsed function; existing files are overwritten.
pub fn write_listings(dir: &Path, listings: &[Listing]) -> Result<usize> {
    let mut written = 0;
    for listing in listings {
        for record in listing.index.iter() {
            let path = listing_path(dir, &listing.architecture, &record.name, &listing.label);
            if let Some(parent) = path.parent() {
                fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            let mut body = record.instruction_lines.join("\n");
            body.push('\n');
            fs::write(&path, body)
                .with_context(|| format!("Failed to write listing {}", path.display()))?;
            written += 1;
        }
    }
    info!("wrote {written} assembly listings under {}", dir.display());
    Ok(written)
}
