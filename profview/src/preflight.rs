//! Pre-flight checks for profview
//!
//! Validates inputs before the pipeline runs. Missing inputs are hard
//! errors; a binary without debug information only warns, since the
//! report is still produced with instruction windows alone.

use anyhow::{bail, Context, Result};
use log::warn;
use object::{Object, ObjectSection};
use std::path::Path;

/// What the binary carries for source correlation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugInfo {
    Dwarf,
    SymbolsOnly,
    Stripped,
    /// Not an object file this build can parse (e.g. a raw ROM image)
    Unknown,
}

/// Run all pre-flight checks
///
/// # Errors
/// Returns an error if the input profile is missing
pub fn run_preflight_checks(input: &Path, elf: Option<&Path>, quiet: bool) -> Result<()> {
    check_input_exists(input)?;
    if let Some(elf) = elf {
        if !elf.is_file() {
            warn!("ELF not found: {}; disassembly will be skipped", elf.display());
            return Ok(());
        }
        let info = inspect_debug_info(elf)?;
        if !quiet {
            match info {
                DebugInfo::Stripped => {
                    eprintln!("warning: binary stripped, mixed view will show addresses only");
                }
                DebugInfo::SymbolsOnly => {
                    eprintln!("warning: no DWARF debug info, source locations unavailable");
                }
                DebugInfo::Dwarf | DebugInfo::Unknown => {}
            }
        }
    }
    Ok(())
}

/// Check that the input profile exists and is a file
fn check_input_exists(input: &Path) -> Result<()> {
    if !input.exists() {
        bail!(
            "Input not found: {}\n\n\
             Pass --input or set $GEO_PROF_RESOLVED_JSON / $GEO_PROF_JSON.",
            input.display()
        );
    }
    if !input.is_file() {
        bail!("Not a file: {}\n\n--input must point to a JSON file.", input.display());
    }
    Ok(())
}

/// Classify the debug information present in `binary`
///
/// # Errors
/// Returns an error if the file cannot be read
pub fn inspect_debug_info(binary: &Path) -> Result<DebugInfo> {
    let file_data = std::fs::read(binary)
        .with_context(|| format!("Failed to read binary: {}", binary.display()))?;

    let Ok(obj) = object::File::parse(&*file_data) else {
        return Ok(DebugInfo::Unknown);
    };

    let has_debug_info = obj.section_by_name(".debug_info").is_some_and(|s| s.size() > 0);
    let has_symtab = obj.section_by_name(".symtab").is_some_and(|s| s.size() > 0);

    Ok(match (has_debug_info, has_symtab) {
        (true, _) => DebugInfo::Dwarf,
        (false, true) => DebugInfo::SymbolsOnly,
        (false, false) => DebugInfo::Stripped,
    })
}
