//! External toolchain lookup and invocation
//!
//! The disassembler and line mapper are external executables. Everything
//! that touches `PATH` or spawns a process goes through [`ToolRunner`] so the
//! correlation engine can be driven by canned output in tests.

use std::ffi::OsString;
use std::process::{Command, Stdio};

use log::debug;

use crate::domain::ToolError;

/// Capability to locate and run external tools
pub trait ToolRunner {
    /// Whether `program` can be found on the search path
    fn is_available(&self, program: &str) -> bool;

    /// Run `program` to completion and capture its standard output
    ///
    /// # Errors
    /// Returns [`ToolError::InvocationFailed`] if the process cannot be
    /// spawned or exits unsuccessfully
    fn run(&self, program: &str, args: &[OsString]) -> Result<Vec<u8>, ToolError>;

    /// Run `program` and decode its output as UTF-8 text
    ///
    /// # Errors
    /// Fails like [`ToolRunner::run`], or when the output is not valid UTF-8
    fn run_text(&self, program: &str, args: &[OsString]) -> Result<String, ToolError> {
        let bytes = self.run(program, args)?;
        String::from_utf8(bytes).map_err(|e| ToolError::InvocationFailed {
            program: program.to_string(),
            reason: format!("output is not valid UTF-8: {e}"),
        })
    }
}

/// Runs tools found on the real `PATH`
///
/// Blocks until the child exits; no timeout is applied.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl ToolRunner for SystemRunner {
    fn is_available(&self, program: &str) -> bool {
        which::which(program).is_ok()
    }

    fn run(&self, program: &str, args: &[OsString]) -> Result<Vec<u8>, ToolError> {
        debug!("Running {program} {}", display_args(args));

        let output = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .map_err(|e| ToolError::InvocationFailed {
                program: program.to_string(),
                reason: e.to_string(),
            })?;

        if !output.status.success() {
            return Err(ToolError::InvocationFailed {
                program: program.to_string(),
                reason: output.status.to_string(),
            });
        }
        Ok(output.stdout)
    }
}

/// Build a cross-tool name from a toolchain prefix
///
/// Accepts both `m68k-amigaos` and `m68k-amigaos-`; an empty prefix yields
/// `None`.
#[must_use]
pub fn toolchain_cmd(tool: &str, prefix: Option<&str>) -> Option<String> {
    let prefix = prefix.map(str::trim).filter(|p| !p.is_empty())?;
    if prefix.ends_with('-') {
        Some(format!("{prefix}{tool}"))
    } else {
        Some(format!("{prefix}-{tool}"))
    }
}

pub(crate) fn display_args(args: &[OsString]) -> String {
    args.iter().map(|a| a.to_string_lossy()).collect::<Vec<_>>().join(" ")
}
