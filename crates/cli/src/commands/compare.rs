use std::path::{Path, PathBuf};

use anyhow::Result;
use assert_cost_core::disasm::{Demangler, IdentityDemangler, ParseOptions, SizeFormula};
use assert_cost_core::model::BinarySizeRow;
use assert_cost_core::services::measure::compare_listings;
use assert_cost_core::tools::{binary_size, Disassembler, SystemRunner, ToolDemangler};

use super::render::render;
use super::util::{load_config, read_text};
use super::OutputFormat;

#[derive(Debug, Clone)]
pub struct CompareArgs {
    pub a: PathBuf,
    pub b: PathBuf,
    pub disassembler: Disassembler,
    pub size_formula: SizeFormula,
    pub arch: String,
    pub from_text: bool,
    pub no_demangle: bool,
    pub config: Option<PathBuf>,
    pub format: OutputFormat,
}

/// Compare two binaries (disassembled on the fly) or two captured listings.
pub fn compare_command(args: &CompareArgs) -> Result<()> {
    let config = load_config(args.config.as_deref())?;
    let filter = config.filter();
    let runner = SystemRunner;

    let listing = |path: &Path| -> Result<String> {
        if args.from_text {
            read_text(path)
        } else {
            Ok(args.disassembler.disassemble(&runner, path)?)
        }
    };
    let text_a = listing(&args.a)?;
    let text_b = listing(&args.b)?;

    let tool_demangler;
    let demangler: &dyn Demangler = if args.no_demangle {
        &IdentityDemangler
    } else {
        tool_demangler = ToolDemangler::new(&runner);
        &tool_demangler
    };

    let options = ParseOptions::new(args.disassembler.format(), args.size_formula);
    let mut report = compare_listings(&args.arch, &text_a, &text_b, options, &filter, demangler);
    if !args.from_text {
        report.binary_sizes.push(BinarySizeRow {
            architecture: args.arch.clone(),
            size_a: binary_size(&args.a),
            size_b: binary_size(&args.b),
        });
    }

    let labels = config.variant_labels()?;
    print!("{}", render(&report, &labels, args.format, &report)?);
    Ok(())
}
