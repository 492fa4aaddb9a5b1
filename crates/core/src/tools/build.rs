use std::path::{Path, PathBuf};
use std::process::Command;

use log::info;

use super::{resolve_tool, CommandRunner, ToolError};

/// Builds a variant crate with `cargo build --release`, optionally cross-compiling.
///
/// The cargo executable honours the `CARGO` environment variable.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CargoBuilder {
    pub rustflags: Option<String>,
}

impl CargoBuilder {
    pub fn new(rustflags: Option<String>) -> Self {
        Self { rustflags }
    }

    fn cargo() -> PathBuf {
        resolve_tool("CARGO", "cargo")
    }

    /// `cargo clean` in `project_dir`.
    pub fn clean(&self, runner: &dyn CommandRunner, project_dir: &Path) -> Result<(), ToolError> {
        let mut cmd = Command::new(Self::cargo());
        cmd.arg("clean").current_dir(project_dir);
        runner
            .run(&mut cmd)
            .map_err(|source| ToolError::Spawn { tool: "cargo clean".into(), source })?
            .check("cargo clean")?;
        Ok(())
    }

    /// Build the release binary and return the deterministic path it lands at.
    pub fn build(
        &self,
        runner: &dyn CommandRunner,
        project_dir: &Path,
        target: Option<&str>,
        binary_name: &str,
    ) -> Result<PathBuf, ToolError> {
        let mut cmd = Command::new(Self::cargo());
        cmd.args(["build", "--release"]).current_dir(project_dir);
        if let Some(target) = target {
            cmd.args(["--target", target]);
        }
        if let Some(flags) = &self.rustflags {
            cmd.env("RUSTFLAGS", flags);
        }
        info!("building {} ({})", project_dir.display(), target.unwrap_or("host"));
        runner
            .run(&mut cmd)
            .map_err(|source| ToolError::Spawn { tool: "cargo build".into(), source })?
            .check("cargo build")?;

        let binary = Self::binary_path(project_dir, target, binary_name);
        if !binary.is_file() {
            return Err(ToolError::MissingBinary(binary));
        }
        Ok(binary)
    }

    /// `<dir>/target[/<triple>]/release/<binary>`.
    pub fn binary_path(project_dir: &Path, target: Option<&str>, binary_name: &str) -> PathBuf {
        let mut path = project_dir.join("target");
        if let Some(target) = target {
            path = path.join(target);
        }
        path.join("release").join(binary_name)
    }

    /// The library artifact cargo leaves beside the binary: `lib<crate_name>.rlib`,
    /// with dashes in the package name turned into underscores.
    pub fn rlib_path(project_dir: &Path, target: Option<&str>, crate_name: &str) -> PathBuf {
        Self::binary_path(project_dir, target, crate_name)
            .with_file_name(format!("lib{}.rlib", crate_name.replace('-', "_")))
    }
}
