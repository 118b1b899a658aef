//! In-process line mapping from DWARF
//!
//! Used when no external line-mapping tool is on the search path. Reads the
//! line tables of the binary directly and answers in the same
//! `file:line` text form the external tools print, so the resolver parses
//! both identically.

use addr2line::Context;
use anyhow::{Context as _, Result};
use gimli::{EndianRcSlice, RunTimeEndian};
use object::{Object, ObjectSection};
use std::fs;
use std::path::Path;
use std::rc::Rc;

use super::line_resolver::{LineMapper, UNKNOWN_LOCATION};
use crate::domain::ToolError;

pub const DWARF_MAPPER_NAME: &str = "dwarf";

/// Line mapper backed by the binary's own debug information
pub struct DwarfLineMapper {
    ctx: Context<EndianRcSlice<RunTimeEndian>>,
}

impl DwarfLineMapper {
    /// Load the DWARF sections of `binary_path`
    ///
    /// # Errors
    /// Returns an error if the binary cannot be read or parsed
    pub fn new<P: AsRef<Path>>(binary_path: P) -> Result<Self> {
        let binary_data = fs::read(binary_path.as_ref()).context("Failed to read binary file")?;
        let obj_file = object::File::parse(&*binary_data).context("Failed to parse object file")?;

        let endian =
            if obj_file.is_little_endian() { RunTimeEndian::Little } else { RunTimeEndian::Big };

        let load_section =
            |id: gimli::SectionId| -> Result<EndianRcSlice<RunTimeEndian>, gimli::Error> {
                let data = obj_file
                    .section_by_name(id.name())
                    .and_then(|section| section.uncompressed_data().ok())
                    .unwrap_or(std::borrow::Cow::Borrowed(&[][..]));
                Ok(EndianRcSlice::new(Rc::from(&*data), endian))
            };

        let dwarf = gimli::Dwarf::load(&load_section)?;
        let ctx = Context::from_dwarf(dwarf).context("Failed to load DWARF debug information")?;

        Ok(Self { ctx })
    }

    fn locate(&self, addr: u64) -> String {
        // The frame lookup searches `addr + 1`; the top address maps nowhere
        if addr == u64::MAX {
            return UNKNOWN_LOCATION.to_string();
        }
        match self.ctx.find_location(addr) {
            Ok(Some(loc)) => match (loc.file, loc.line) {
                (Some(file), Some(line)) => format!("{file}:{line}"),
                (Some(file), None) => format!("{file}:0"),
                _ => UNKNOWN_LOCATION.to_string(),
            },
            _ => UNKNOWN_LOCATION.to_string(),
        }
    }
}

impl LineMapper for DwarfLineMapper {
    fn name(&self) -> &str {
        DWARF_MAPPER_NAME
    }

    fn map(&self, addrs: &[u64]) -> Result<Vec<String>, ToolError> {
        Ok(addrs.iter().map(|&a| self.locate(a)).collect())
    }
}
