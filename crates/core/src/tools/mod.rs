//! External collaborators: build tool, disassemblers and the symbol demangler.
//!
//! Every process call goes through [`CommandRunner`] so the parsing and reporting
//! code can be exercised with canned output and no toolchain installed.

pub mod build;
pub mod demangle;
pub mod disassemble;
#[cfg(feature = "object-inspect")]
pub mod inspect;

use std::fs;
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use sha2::{Digest, Sha256};
use thiserror::Error;

pub use build::CargoBuilder;
pub use demangle::ToolDemangler;
pub use disassemble::Disassembler;

/// Failure of an external tool. Always fatal for the measurement that needed it.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("Binary not found at {0}")]
    MissingBinary(PathBuf),
    #[error("failed to spawn {tool}: {source}")]
    Spawn {
        tool: String,
        #[source]
        source: io::Error,
    },
    #[error("{tool} exited with {status}:\n{stderr}")]
    Failed { tool: String, status: String, stderr: String },
    #[error("{tool} produced no output for {}", binary.display())]
    EmptyOutput { tool: String, binary: PathBuf },
}

/// Captured result of one process invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToolOutput {
    pub success: bool,
    pub code: Option<i32>,
    pub stdout: Vec<u8>,
    pub stderr: Vec<u8>,
}

impl ToolOutput {
    pub fn ok(stdout: impl Into<Vec<u8>>) -> Self {
        Self { success: true, code: Some(0), stdout: stdout.into(), stderr: Vec::new() }
    }

    pub fn failed(code: i32, stderr: impl Into<Vec<u8>>) -> Self {
        Self { success: false, code: Some(code), stdout: Vec::new(), stderr: stderr.into() }
    }

    pub fn stdout_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stdout).to_string()
    }

    pub fn stderr_lossy(&self) -> String {
        String::from_utf8_lossy(&self.stderr).to_string()
    }

    fn status_string(&self) -> String {
        match self.code {
            Some(code) => format!("exit status: {code}"),
            None => "signal".to_string(),
        }
    }

    /// Map a non-zero status to [`ToolError::Failed`], keeping stderr as the diagnostic.
    pub fn check(self, tool: &str) -> Result<Self, ToolError> {
        if self.success {
            Ok(self)
        } else {
            Err(ToolError::Failed {
                tool: tool.to_string(),
                status: self.status_string(),
                stderr: self.stderr_lossy(),
            })
        }
    }
}

/// Runs prepared commands and captures their output.
pub trait CommandRunner {
    fn run(&self, cmd: &mut Command) -> io::Result<ToolOutput>;

    /// Run with `input` written to the child's stdin.
    fn run_with_input(&self, cmd: &mut Command, input: &[u8]) -> io::Result<ToolOutput>;
}

/// Spawns real processes.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, cmd: &mut Command) -> io::Result<ToolOutput> {
        let output = cmd.output()?;
        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }

    fn run_with_input(&self, cmd: &mut Command, input: &[u8]) -> io::Result<ToolOutput> {
        let mut child =
            cmd.stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::piped()).spawn()?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(input)?;
        }
        let output = child.wait_with_output()?;
        Ok(ToolOutput {
            success: output.status.success(),
            code: output.status.code(),
            stdout: output.stdout,
            stderr: output.stderr,
        })
    }
}

/// Resolve a tool from an override environment variable, falling back to `default`.
pub(crate) fn resolve_tool(env_var: &str, default: &str) -> PathBuf {
    std::env::var_os(env_var).map(PathBuf::from).unwrap_or_else(|| PathBuf::from(default))
}

/// On-disk size of a binary; 0 if it cannot be read.
pub fn binary_size(path: &Path) -> u64 {
    fs::metadata(path).map(|m| m.len()).unwrap_or(0)
}

/// Compute the SHA-256 hash of a file and return it as a hex string.
pub fn sha256_file(path: &Path) -> io::Result<String> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];

    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(format!("{:x}", hasher.finalize()))
}
