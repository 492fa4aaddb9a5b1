use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::config::{ArchitectureConfig, ConfigError, HarnessConfig};
use crate::disasm::{Demangler, DisassemblyParser, FunctionFilter, ParseOptions};
use crate::model::{BinarySizeRow, DisassemblyIndex, Variant};
use crate::report::{ComparativeReporter, SizeReport};
use crate::tools::{binary_size, sha256_file, CargoBuilder, CommandRunner, ToolError};

#[derive(Debug, Error)]
pub enum MeasureError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("cargo clean failed for {}: {source}", dir.display())]
    Clean {
        dir: PathBuf,
        #[source]
        source: ToolError,
    },
    #[error("measurement of variant '{variant}' for {architecture} failed: {source}")]
    Tool {
        variant: String,
        architecture: String,
        #[source]
        source: ToolError,
    },
}

/// Metadata about one measured binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasuredBinary {
    pub architecture: String,
    pub variant: Variant,
    pub label: String,
    pub path: String,
    pub size_bytes: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sha256: Option<String>,
    /// Size of the crate's `.rlib` next to the binary, when cargo produced one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rlib_size_bytes: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detected_architecture: Option<String>,
    /// The detected machine belongs to a different family than the configured architecture.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub architecture_mismatch: bool,
    pub functions: usize,
}

/// Parsed functions of one (architecture, variant) unit, instruction lines included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Listing {
    pub architecture: String,
    pub variant: Variant,
    pub label: String,
    pub index: DisassemblyIndex,
}

/// Everything produced by one measurement run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeasurementReport {
    pub generated_at: String,
    pub variant_labels: [String; 2],
    pub report: SizeReport,
    pub binaries: Vec<MeasuredBinary>,
    #[serde(skip)]
    pub listings: Vec<Listing>,
}

/// Drives every (architecture, variant) unit sequentially: build, disassemble, parse.
///
/// The first failing unit aborts the run; a partial report is never returned.
pub struct Measurement<'a> {
    pub root: &'a Path,
    pub config: &'a HarnessConfig,
    pub runner: &'a dyn CommandRunner,
    pub demangler: &'a dyn Demangler,
}

impl<'a> Measurement<'a> {
    pub fn run(&self) -> Result<MeasurementReport, MeasureError> {
        self.config.validate()?;
        let builder = CargoBuilder::new(self.config.rustflags.clone());
        let filter = self.config.filter();

        if self.config.clean {
            for variant in [Variant::A, Variant::B] {
                let dir = self.config.variant_dir(self.root, variant)?;
                builder
                    .clean(self.runner, &dir)
                    .map_err(|source| MeasureError::Clean { dir: dir.clone(), source })?;
            }
        }

        let mut reporter = ComparativeReporter::new(filter.clone());
        let mut binaries = Vec::new();
        let mut listings = Vec::new();

        for arch in &self.config.architectures {
            let (binary_a, index_a) = self.measure_unit(&builder, &filter, arch, Variant::A)?;
            let (binary_b, index_b) = self.measure_unit(&builder, &filter, arch, Variant::B)?;

            reporter.add_architecture(&arch.name, &index_a, &index_b);
            reporter.add_binary_sizes(BinarySizeRow {
                architecture: arch.name.clone(),
                size_a: binary_a.size_bytes,
                size_b: binary_b.size_bytes,
            });

            for (binary, index) in [(binary_a, index_a), (binary_b, index_b)] {
                listings.push(Listing {
                    architecture: arch.name.clone(),
                    variant: binary.variant,
                    label: binary.label.clone(),
                    index,
                });
                binaries.push(binary);
            }
        }

        Ok(MeasurementReport {
            generated_at: Utc::now().to_rfc3339(),
            variant_labels: self.config.variant_labels()?,
            report: reporter.finish(),
            binaries,
            listings,
        })
    }

    fn measure_unit(
        &self,
        builder: &CargoBuilder,
        filter: &FunctionFilter,
        arch: &ArchitectureConfig,
        variant: Variant,
    ) -> Result<(MeasuredBinary, DisassemblyIndex), MeasureError> {
        let label = self.config.variant(variant)?.label.clone();
        let tool_err = |source| MeasureError::Tool {
            variant: label.clone(),
            architecture: arch.name.clone(),
            source,
        };

        info!("measuring '{}' for {}", label, arch.name);
        let dir = self.config.variant_dir(self.root, variant)?;
        let binary = builder
            .build(self.runner, &dir, arch.target.as_deref(), &self.config.binary_name)
            .map_err(tool_err)?;
        let text = arch.disassembler.disassemble(self.runner, &binary).map_err(tool_err)?;

        let parser = DisassemblyParser::new(arch.parse_options(), filter, self.demangler);
        let index = parser.parse(&text);
        info!("{} / {}: {} functions of interest", arch.name, label, index.len());

        let rlib = CargoBuilder::rlib_path(&dir, arch.target.as_deref(), &self.config.binary_name);
        let detected = detect_and_check(&binary, &arch.name);
        let measured = MeasuredBinary {
            architecture: arch.name.clone(),
            variant,
            label: label.clone(),
            path: binary.display().to_string(),
            size_bytes: binary_size(&binary),
            sha256: sha256_file(&binary).ok(),
            rlib_size_bytes: rlib.is_file().then(|| binary_size(&rlib)),
            architecture_mismatch: detected.as_ref().is_some_and(|d| !d.matches),
            detected_architecture: detected.map(|d| d.machine),
            functions: index.len(),
        };
        Ok((measured, index))
    }
}

struct Detected {
    machine: String,
    matches: bool,
}

#[cfg(feature = "object-inspect")]
fn detect_and_check(binary: &Path, configured: &str) -> Option<Detected> {
    use crate::tools::inspect::{architecture_matches, detect_architecture};

    let bytes = std::fs::read(binary).ok()?;
    let machine = detect_architecture(&bytes)?;
    let matches = architecture_matches(configured, &machine);
    if !matches {
        warn!("{} looks like {machine}, but is configured as {configured}", binary.display());
    }
    Some(Detected { machine, matches })
}

#[cfg(not(feature = "object-inspect"))]
fn detect_and_check(_binary: &Path, _configured: &str) -> Option<Detected> {
    None
}

/// Compare two already-captured listings of the same architecture.
pub fn compare_listings(
    architecture: &str,
    listing_a: &str,
    listing_b: &str,
    options: ParseOptions,
    filter: &FunctionFilter,
    demangler: &dyn Demangler,
) -> SizeReport {
    let parser = DisassemblyParser::new(options, filter, demangler);
    let index_a = parser.parse(listing_a);
    let index_b = parser.parse(listing_b);
    let mut reporter = ComparativeReporter::new(filter.clone());
    reporter.add_architecture(architecture, &index_a, &index_b);
    if index_a.is_empty() && index_b.is_empty() {
        warn!("no functions of interest found in either listing for {architecture}");
    }
    reporter.finish()
}
