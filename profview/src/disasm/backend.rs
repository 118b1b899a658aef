//! Disassembler invocation strategies
//!
//! Each strategy knows which program it runs, which flags it passes and
//! which grammar its output follows. Candidates are tried in preference
//! order and the first one that yields any output wins.

use log::{debug, info, warn};
use std::ffi::OsString;
use std::path::Path;

use super::parser::{parse_disassembly, Disassembly, ParseMode};
use crate::domain::ToolError;
use crate::toolchain::{toolchain_cmd, ToolRunner};

/// Generic cross-vendor disassembler
pub const LLVM_OBJDUMP: &str = "llvm-objdump";

/// Platform default disassembler
pub const SYSTEM_OBJDUMP: &str = "objdump";

/// Architecture token passed to objdump for raw ROM images
pub const DEFAULT_ROM_ARCH: &str = "m68k";

/// One way of producing disassembly text for a binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisasmBackend {
    /// Toolchain-prefixed GNU objdump, e.g. `m68k-amigaos-objdump`
    Toolchain { program: String },
    /// `llvm-objdump`
    Llvm,
    /// Plain `objdump` from the host
    System,
    /// Any GNU objdump reading a headerless image loaded at `vma_base`
    RawBinary { program: String, arch: String, vma_base: u64 },
}

impl DisasmBackend {
    #[must_use]
    pub fn program(&self) -> &str {
        match self {
            DisasmBackend::Toolchain { program } | DisasmBackend::RawBinary { program, .. } => {
                program
            }
            DisasmBackend::Llvm => LLVM_OBJDUMP,
            DisasmBackend::System => SYSTEM_OBJDUMP,
        }
    }

    /// Command-line arguments for disassembling `binary`
    #[must_use]
    pub fn args(&self, binary: &Path) -> Vec<OsString> {
        let mut args: Vec<OsString> = match self {
            DisasmBackend::Toolchain { .. } | DisasmBackend::System => {
                ["-dS", "-C", "-l"].iter().map(OsString::from).collect()
            }
            DisasmBackend::Llvm => [
                "-dS",
                "--source",
                "--demangle",
                "--no-show-raw-insn",
                "--line-numbers",
                "--addresses",
            ]
            .iter()
            .map(OsString::from)
            .collect(),
            DisasmBackend::RawBinary { arch, vma_base, .. } => vec![
                "-b".into(),
                "binary".into(),
                "-m".into(),
                arch.into(),
                "--adjust-vma".into(),
                format!("{vma_base:#x}").into(),
                "-D".into(),
            ],
        };
        args.push(binary.as_os_str().to_os_string());
        args
    }

    #[must_use]
    pub fn mode(&self) -> ParseMode {
        match self {
            DisasmBackend::RawBinary { .. } => ParseMode::Rom,
            _ => ParseMode::Elf,
        }
    }
}

/// Candidates for an object file with sections and symbols, in preference order
#[must_use]
pub fn elf_backends(toolchain_prefix: Option<&str>) -> Vec<DisasmBackend> {
    let mut backends = Vec::new();
    if let Some(program) = toolchain_cmd("objdump", toolchain_prefix) {
        backends.push(DisasmBackend::Toolchain { program });
    }
    backends.push(DisasmBackend::Llvm);
    backends.push(DisasmBackend::System);
    backends
}

/// Candidates for a raw ROM image loaded at `vma_base`
#[must_use]
pub fn rom_backends(toolchain_prefix: Option<&str>, arch: &str, vma_base: u64) -> Vec<DisasmBackend> {
    toolchain_cmd("objdump", toolchain_prefix)
        .into_iter()
        .chain(std::iter::once(SYSTEM_OBJDUMP.to_string()))
        .map(|program| DisasmBackend::RawBinary { program, arch: arch.to_string(), vma_base })
        .collect()
}

/// Disassembly produced by the first backend that yielded output
#[derive(Debug, Clone)]
pub struct DisasmRun {
    /// File name of the program that produced the output
    pub tool: String,
    pub disassembly: Disassembly,
}

/// Run the first available backend that produces output and parse it
///
/// # Errors
/// [`ToolError::Unavailable`] when none of the programs is installed,
/// [`ToolError::EmptyOutput`] when every installed one failed or printed
/// nothing
pub fn disassemble(
    runner: &dyn ToolRunner,
    backends: &[DisasmBackend],
    binary: &Path,
) -> Result<DisasmRun, ToolError> {
    let mut tried = Vec::new();

    for backend in backends {
        let program = backend.program();
        if !runner.is_available(program) {
            debug!("Disassembler {program} not found, skipping");
            continue;
        }
        tried.push(program.to_string());

        match runner.run_text(program, &backend.args(binary)) {
            Ok(text) if !text.is_empty() => {
                info!("Disassembled {} with {program}", binary.display());
                let tool = Path::new(program)
                    .file_name()
                    .map_or_else(|| program.to_string(), |n| n.to_string_lossy().into_owned());
                return Ok(DisasmRun { tool, disassembly: parse_disassembly(&text, backend.mode()) });
            }
            Ok(_) => debug!("{program} produced no output"),
            Err(e) => warn!("{e}"),
        }
    }

    if tried.is_empty() {
        Err(ToolError::Unavailable("objdump".to_string()))
    } else {
        Err(ToolError::EmptyOutput(tried.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::toolchain::fake::FakeRunner;

    #[test]
    fn test_elf_backend_order() {
        let backends = elf_backends(Some("m68k-amigaos"));
        let programs: Vec<&str> = backends.iter().map(DisasmBackend::program).collect();
        assert_eq!(programs, vec!["m68k-amigaos-objdump", "llvm-objdump", "objdump"]);
        assert_eq!(elf_backends(None).len(), 2);
    }

    #[test]
    fn test_backend_args() {
        let bin = Path::new("/tmp/game.elf");
        let args: Vec<String> = DisasmBackend::System
            .args(bin)
            .iter()
            .map(|a| a.to_string_lossy().into_owned())
            .collect();
        assert_eq!(args, vec!["-dS", "-C", "-l", "/tmp/game.elf"]);

        let rom = &rom_backends(None, DEFAULT_ROM_ARCH, 0xc0_0000)[0];
        let args: Vec<String> =
            rom.args(bin).iter().map(|a| a.to_string_lossy().into_owned()).collect();
        assert_eq!(
            args,
            vec!["-b", "binary", "-m", "m68k", "--adjust-vma", "0xc00000", "-D", "/tmp/game.elf"]
        );
        assert_eq!(rom.mode(), ParseMode::Rom);
        assert_eq!(DisasmBackend::Llvm.mode(), ParseMode::Elf);
    }

    #[test]
    fn test_disassemble_falls_through_to_first_output() {
        let runner = FakeRunner::default()
            .with_failure("m68k-elf-objdump", "exit status: 1")
            .with_output("llvm-objdump", "")
            .with_output("objdump", "    1000:\t4e75 \trts\n");

        let run = disassemble(&runner, &elf_backends(Some("m68k-elf-")), Path::new("a.elf")).unwrap();
        assert_eq!(run.tool, "objdump");
        assert_eq!(run.disassembly.table.len(), 1);
        assert_eq!(runner.call_count("m68k-elf-objdump"), 1);
        assert_eq!(runner.call_count("llvm-objdump"), 1);
    }

    #[test]
    fn test_disassemble_without_tools() {
        let err = disassemble(&FakeRunner::default(), &elf_backends(None), Path::new("a.elf"))
            .unwrap_err();
        assert!(matches!(err, ToolError::Unavailable(_)));

        let runner = FakeRunner::default().with_failure("objdump", "boom");
        let err = disassemble(&runner, &elf_backends(None), Path::new("a.elf")).unwrap_err();
        assert!(matches!(err, ToolError::EmptyOutput(_)));
    }
}
