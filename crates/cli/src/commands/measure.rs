use std::path::PathBuf;

use anyhow::{Context, Result};
use assert_cost_core::services::measure::Measurement;
use assert_cost_core::tools::{SystemRunner, ToolDemangler};
use log::info;

use super::render::render;
use super::util::{load_config, write_listings};
use super::OutputFormat;
use crate::canonicalize_or_current;

#[derive(Debug, Clone)]
pub struct MeasureArgs {
    pub root: PathBuf,
    pub config: Option<PathBuf>,
    pub arch: Vec<String>,
    pub format: OutputFormat,
    pub asm_dir: Option<PathBuf>,
}

/// Build, disassemble and compare both variants for every configured architecture.
pub fn measure_command(args: &MeasureArgs) -> Result<()> {
    let root = canonicalize_or_current(&args.root)?;
    let mut config = load_config(args.config.as_deref())?;
    config.restrict_architectures(&args.arch).context("Invalid --arch selection")?;
    info!("measuring variants under {}", root.display());

    let runner = SystemRunner;
    let demangler = ToolDemangler::new(&runner);
    let measurement =
        Measurement { root: &root, config: &config, runner: &runner, demangler: &demangler };
    let result = measurement.run().context("Measurement failed")?;

    if let Some(dir) = &args.asm_dir {
        write_listings(dir, &result.listings)?;
    }

    print!("{}", render(&result.report, &result.variant_labels, args.format, &result)?);
    Ok(())
}
