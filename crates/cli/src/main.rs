use std::path::PathBuf;

use anyhow::Result;
use assert_cost::commands::{self, compare::CompareArgs, measure::MeasureArgs, OutputFormat};
use assert_cost::init_logging;
use clap::{Parser, Subcommand};

/// Measures the code-size cost of runtime assertions.
///
/// This CLI is a thin wrapper around `assert-cost-core` (exposed in code as
/// `assert_cost_core`). Building, parsing and reporting all live in the library.
#[derive(Parser, Debug)]
#[command(
    name = "assert-cost",
    version,
    about = "Per-function code-size comparison of two build variants",
    long_about = None
)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise.
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build both variants for every architecture, disassemble and compare.
    Measure {
        /// Directory holding the two variant projects.
        #[arg(long, env = "ASSERT_COST_ROOT", default_value = ".")]
        root: PathBuf,

        /// Harness configuration (.json, .yaml or .yml). Defaults are used when omitted.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Only measure these architectures (repeatable).
        #[arg(long = "arch")]
        arch: Vec<String>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,

        /// Write per-function assembly listings under this directory.
        #[arg(long)]
        asm_dir: Option<PathBuf>,
    },

    /// Compare two binaries, or two captured listings with `--from-text`.
    Compare {
        /// Variant A (with assertions).
        #[arg(long)]
        a: PathBuf,

        /// Variant B (without assertions).
        #[arg(long)]
        b: PathBuf,

        /// Tool that produced (or should produce) the listings: otool or llvm-objdump.
        #[arg(long)]
        disassembler: assert_cost_core::tools::Disassembler,

        /// `inclusive` or `width:<N>`.
        #[arg(long)]
        size_formula: assert_cost_core::disasm::SizeFormula,

        /// Architecture name used in the report.
        #[arg(long, default_value = "host")]
        arch: String,

        /// Treat --a/--b as disassembly text instead of binaries.
        #[arg(long, default_value_t = false)]
        from_text: bool,

        /// Skip rustfilt and use labels as they appear in the listing.
        #[arg(long, default_value_t = false)]
        no_demangle: bool,

        /// Configuration supplying the allow-list and marker.
        #[arg(long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },

    /// Count `call to <function> may panic` lines in a log.
    Panics {
        #[arg(long)]
        log: PathBuf,

        /// Emit JSON instead of human-readable text.
        #[arg(long, default_value_t = false)]
        json: bool,
    },

    /// Print the effective configuration as JSON.
    Config {
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Measure { root, config, arch, format, asm_dir } => {
            commands::measure::measure_command(&MeasureArgs { root, config, arch, format, asm_dir })?
        }
        Command::Compare {
            a,
            b,
            disassembler,
            size_formula,
            arch,
            from_text,
            no_demangle,
            config,
            format,
        } => commands::compare::compare_command(&CompareArgs {
            a,
            b,
            disassembler,
            size_formula,
            arch,
            from_text,
            no_demangle,
            config,
            format,
        })?,
        Command::Panics { log, json } => commands::panics::panics_command(&log, json)?,
        Command::Config { config } => commands::config::config_command(config.as_deref())?,
    }

    Ok(())
}
