use std::fmt;
use std::path::{Path, PathBuf};
use std::process::Command;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{resolve_tool, CommandRunner, ToolError};
use crate::disasm::DisasmFormat;

/// Supported disassembler tools; each one emits its own listing format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Disassembler {
    /// `otool -tV`, linear-scan listing. Override the executable with `OTOOL_BIN`.
    #[serde(rename = "otool")]
    Otool,
    /// `llvm-objdump -D`, table listing. Override the executable with `LLVM_OBJDUMP_BIN`.
    #[serde(rename = "llvm-objdump")]
    LlvmObjdump,
}

impl Disassembler {
    pub fn name(&self) -> &'static str {
        match self {
            Disassembler::Otool => "otool",
            Disassembler::LlvmObjdump => "llvm-objdump",
        }
    }

    pub fn format(&self) -> DisasmFormat {
        match self {
            Disassembler::Otool => DisasmFormat::LinearScan,
            Disassembler::LlvmObjdump => DisasmFormat::Table,
        }
    }

    fn program(&self) -> PathBuf {
        match self {
            Disassembler::Otool => resolve_tool("OTOOL_BIN", "otool"),
            Disassembler::LlvmObjdump => resolve_tool("LLVM_OBJDUMP_BIN", "llvm-objdump"),
        }
    }

    fn args(&self) -> &'static [&'static str] {
        match self {
            Disassembler::Otool => &["-tV"],
            Disassembler::LlvmObjdump => &["-D"],
        }
    }

    /// Disassemble `binary`. A non-zero exit or an empty listing is an error.
    pub fn disassemble(
        &self,
        runner: &dyn CommandRunner,
        binary: &Path,
    ) -> Result<String, ToolError> {
        if !binary.is_file() {
            return Err(ToolError::MissingBinary(binary.to_path_buf()));
        }
        let mut cmd = Command::new(self.program());
        cmd.args(self.args()).arg(binary);
        let output = runner
            .run(&mut cmd)
            .map_err(|source| ToolError::Spawn { tool: self.name().to_string(), source })?
            .check(self.name())?;
        let text = output.stdout_lossy();
        if text.trim().is_empty() {
            return Err(ToolError::EmptyOutput {
                tool: self.name().to_string(),
                binary: binary.to_path_buf(),
            });
        }
        Ok(text)
    }
}

impl fmt::Display for Disassembler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Disassembler {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "otool" => Ok(Disassembler::Otool),
            "llvm-objdump" | "objdump" => Ok(Disassembler::LlvmObjdump),
            other => Err(format!("Unsupported disassembler '{other}'. Allowed: otool, llvm-objdump")),
        }
    }
}
