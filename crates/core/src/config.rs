//! Harness configuration.
//!
//! Holds the allow-list and helper marker, the per-architecture disassembler and
//! size formula, and the two variant project directories.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::disasm::{FunctionFilter, ParseOptions, SizeFormula};
use crate::model::Variant;
use crate::tools::Disassembler;

/// Ring-buffer operations measured by default.
pub const DEFAULT_FUNCTIONS: &[&str] = &[
    "available_len",
    "as_slices",
    "has_elements",
    "is_full",
    "len",
    "enqueue",
    "push",
    "dequeue",
    "remove_first_matching",
    "empty",
    "retain",
];

pub const DEFAULT_MARKER: &str = "call";
pub const DEFAULT_BINARY_NAME: &str = "ring-buffer-smoketest";
pub const DEFAULT_RUSTFLAGS: &str = "-C link-arg=-nostdlib";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config at {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse config JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to parse config YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// One of the two compared builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariantConfig {
    pub label: String,
    /// Cargo project directory, relative to the harness root unless absolute.
    pub dir: PathBuf,
}

/// One measured architecture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArchitectureConfig {
    pub name: String,
    /// Rust target triple; `None` builds for the host.
    #[serde(default)]
    pub target: Option<String>,
    pub disassembler: Disassembler,
    pub size_formula: SizeFormula,
}

impl ArchitectureConfig {
    pub fn parse_options(&self) -> ParseOptions {
        ParseOptions::new(self.disassembler.format(), self.size_formula)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarnessConfig {
    #[serde(default = "default_functions")]
    pub functions: Vec<String>,
    #[serde(default = "default_marker")]
    pub marker: Option<String>,
    #[serde(default = "default_binary_name")]
    pub binary_name: String,
    #[serde(default = "default_variants")]
    pub variants: Vec<VariantConfig>,
    #[serde(default = "default_architectures")]
    pub architectures: Vec<ArchitectureConfig>,
    #[serde(default = "default_rustflags")]
    pub rustflags: Option<String>,
    #[serde(default = "default_clean")]
    pub clean: bool,
}

fn default_functions() -> Vec<String> {
    DEFAULT_FUNCTIONS.iter().map(|s| s.to_string()).collect()
}

fn default_marker() -> Option<String> {
    Some(DEFAULT_MARKER.to_string())
}

fn default_binary_name() -> String {
    DEFAULT_BINARY_NAME.to_string()
}

fn default_variants() -> Vec<VariantConfig> {
    vec![
        VariantConfig { label: "with".into(), dir: PathBuf::from("with_assertions") },
        VariantConfig { label: "without".into(), dir: PathBuf::from("without_assertions") },
    ]
}

fn default_architectures() -> Vec<ArchitectureConfig> {
    [
        ("x86", "i686-unknown-linux-gnu"),
        ("arm", "armv7-unknown-linux-gnueabihf"),
        ("riscv", "riscv32imac-unknown-none-elf"),
    ]
    .into_iter()
    .map(|(name, target)| ArchitectureConfig {
        name: name.to_string(),
        target: Some(target.to_string()),
        disassembler: Disassembler::LlvmObjdump,
        size_formula: SizeFormula::InclusiveBytes,
    })
    .collect()
}

fn default_rustflags() -> Option<String> {
    Some(DEFAULT_RUSTFLAGS.to_string())
}

fn default_clean() -> bool {
    true
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            functions: default_functions(),
            marker: default_marker(),
            binary_name: default_binary_name(),
            variants: default_variants(),
            architectures: default_architectures(),
            rustflags: default_rustflags(),
            clean: default_clean(),
        }
    }
}

impl HarnessConfig {
    /// Load from `.json`, `.yaml` or `.yml` (anything else is read as YAML) and validate.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let body = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Io { path: path.to_path_buf(), source })?;
        let config: HarnessConfig = if path.extension().and_then(|e| e.to_str()) == Some("json") {
            serde_json::from_str(&body)?
        } else {
            serde_yaml::from_str(&body)?
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let marker_empty = self.marker.as_deref().map_or(true, str::is_empty);
        if self.functions.is_empty() && marker_empty {
            return Err(ConfigError::Invalid(
                "at least one function or a non-empty marker is required".into(),
            ));
        }
        if self.variants.len() != 2 {
            return Err(ConfigError::Invalid(format!(
                "exactly two variants are required, found {}",
                self.variants.len()
            )));
        }
        if self.binary_name.trim().is_empty() {
            return Err(ConfigError::Invalid("binary_name must not be empty".into()));
        }
        let mut seen = HashSet::new();
        for arch in &self.architectures {
            if arch.name.trim().is_empty() {
                return Err(ConfigError::Invalid("architecture name must not be empty".into()));
            }
            if !seen.insert(arch.name.as_str()) {
                return Err(ConfigError::Invalid(format!("duplicate architecture '{}'", arch.name)));
            }
        }
        Ok(())
    }

    pub fn filter(&self) -> FunctionFilter {
        FunctionFilter::new(self.functions.iter().cloned(), self.marker.as_deref())
    }

    /// The configured variant; an error when `variants` has fewer than two entries.
    pub fn variant(&self, variant: Variant) -> Result<&VariantConfig, ConfigError> {
        let slot = match variant {
            Variant::A => 0,
            Variant::B => 1,
        };
        self.variants.get(slot).ok_or_else(|| {
            ConfigError::Invalid(format!(
                "exactly two variants are required, found {}",
                self.variants.len()
            ))
        })
    }

    /// Both variant labels, A then B.
    pub fn variant_labels(&self) -> Result<[String; 2], ConfigError> {
        Ok([self.variant(Variant::A)?.label.clone(), self.variant(Variant::B)?.label.clone()])
    }

    pub fn architecture(&self, name: &str) -> Option<&ArchitectureConfig> {
        self.architectures.iter().find(|a| a.name == name)
    }

    /// Keep only the named architectures, preserving config order.
    pub fn restrict_architectures(&mut self, names: &[String]) -> Result<(), ConfigError> {
        if names.is_empty() {
            return Ok(());
        }
        if let Some(unknown) = names.iter().find(|n| self.architecture(n).is_none()) {
            return Err(ConfigError::Invalid(format!("unknown architecture '{unknown}'")));
        }
        self.architectures.retain(|a| names.contains(&a.name));
        Ok(())
    }

    /// Resolve a variant's project directory against `root`.
    pub fn variant_dir(&self, root: &Path, variant: Variant) -> Result<PathBuf, ConfigError> {
        let dir = &self.variant(variant)?.dir;
        Ok(if dir.is_absolute() { dir.clone() } else { root.join(dir) })
    }
}
