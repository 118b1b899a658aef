//! Batch address to source-line resolution
//!
//! A [`LineMapper`] answers one batch of addresses with one `file:line` text
//! line per address, the way `addr2line -e <binary> <addr>...` does. The
//! [`LineResolver`] sits in front of it: it batches uncached addresses,
//! absorbs tool failures, parses and normalizes the answers, and caches
//! every result (including misses) for the lifetime of the report.

use log::{debug, warn};
use path_slash::PathExt as _;
use std::collections::{HashMap, HashSet};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use super::dwarf::DwarfLineMapper;
use super::sources::SourceTable;
use crate::disasm::AsmRow;
use crate::domain::{parse_hex_address, ToolError};
use crate::toolchain::{toolchain_cmd, ToolRunner};

/// Text a line mapper prints for an address it knows nothing about
pub const UNKNOWN_LOCATION: &str = "??:0";
const UNKNOWN_FILE: &str = "??";

pub const LLVM_ADDR2LINE: &str = "llvm-addr2line";
pub const SYSTEM_ADDR2LINE: &str = "addr2line";

/// Resolved `(file, line)`, or `None` for "no information"
pub type LineInfo = Option<(String, u32)>;

/// Capability to map a batch of addresses to `file:line` text lines
pub trait LineMapper {
    /// Name reported in diagnostics
    fn name(&self) -> &str;

    /// One output line per address, in request order; may come back short
    ///
    /// # Errors
    /// Returns a [`ToolError`] when the mapping tool cannot be run
    fn map(&self, addrs: &[u64]) -> Result<Vec<String>, ToolError>;
}

impl<T: LineMapper + ?Sized> LineMapper for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn map(&self, addrs: &[u64]) -> Result<Vec<String>, ToolError> {
        (**self).map(addrs)
    }
}

/// Line mapper that shells out to an addr2line-compatible tool
pub struct ExternalLineMapper<'r> {
    runner: &'r dyn ToolRunner,
    program: String,
    binary: PathBuf,
}

impl<'r> ExternalLineMapper<'r> {
    pub fn new(runner: &'r dyn ToolRunner, program: impl Into<String>, binary: &Path) -> Self {
        Self { runner, program: program.into(), binary: binary.to_path_buf() }
    }
}

impl LineMapper for ExternalLineMapper<'_> {
    fn name(&self) -> &str {
        &self.program
    }

    fn map(&self, addrs: &[u64]) -> Result<Vec<String>, ToolError> {
        let mut args: Vec<OsString> = vec!["-e".into(), self.binary.clone().into_os_string()];
        args.extend(addrs.iter().map(|a| OsString::from(format!("{a:#x}"))));
        let output = self.runner.run_text(&self.program, &args)?;
        Ok(output.lines().map(str::to_string).collect())
    }
}

/// Pick the line mapper for `binary`
///
/// Prefers the toolchain-prefixed addr2line, then `llvm-addr2line`, then
/// the platform `addr2line`. Falls back to reading DWARF in-process when
/// none of them is on the search path.
pub fn select_line_mapper<'r>(
    runner: &'r dyn ToolRunner,
    toolchain_prefix: Option<&str>,
    binary: &Path,
) -> Option<Box<dyn LineMapper + 'r>> {
    let candidates = toolchain_cmd(SYSTEM_ADDR2LINE, toolchain_prefix)
        .into_iter()
        .chain([LLVM_ADDR2LINE.to_string(), SYSTEM_ADDR2LINE.to_string()]);
    for program in candidates {
        if runner.is_available(&program) {
            debug!("Using {program} for line mapping");
            return Some(Box::new(ExternalLineMapper::new(runner, program, binary)));
        }
    }

    match DwarfLineMapper::new(binary) {
        Ok(mapper) => {
            debug!("No addr2line in PATH; reading DWARF from {}", binary.display());
            Some(Box::new(mapper))
        }
        Err(e) => {
            warn!("No line mapper available for {}: {e:#}", binary.display());
            None
        }
    }
}

/// Parse one `file:line` answer
#[must_use]
pub fn parse_location(text: &str) -> LineInfo {
    let (file, line) = text.trim().rsplit_once(':')?;
    let file = file.trim();
    if file.is_empty() || file == UNKNOWN_FILE {
        return None;
    }
    // addr2line may append " (discriminator N)"
    let line = line.split_whitespace().next()?.parse::<u32>().ok().filter(|&l| l > 0)?;
    Some((file.to_string(), line))
}

/// Rewrites resolved file names to match embedded source keys
#[derive(Debug, Default)]
struct PathNormalizer {
    src_base: Option<PathBuf>,
    known: HashSet<String>,
    /// Basename to its unique key; `None` when several keys share it
    basenames: HashMap<String, Option<String>>,
}

impl PathNormalizer {
    fn new(src_base: Option<&Path>, sources: Option<&SourceTable>) -> Self {
        let src_base = src_base.map(|b| b.canonicalize().unwrap_or_else(|_| b.to_path_buf()));
        let mut known = HashSet::new();
        let mut basenames: HashMap<String, Option<String>> = HashMap::new();
        for key in sources.into_iter().flat_map(SourceTable::file_names) {
            known.insert(key.to_string());
            let Some(base) = basename(key) else { continue };
            basenames
                .entry(base.to_string())
                .and_modify(|slot| {
                    if slot.as_deref() != Some(key) {
                        *slot = None;
                    }
                })
                .or_insert_with(|| Some(key.to_string()));
        }
        Self { src_base, known, basenames }
    }

    fn normalize(&self, file: String) -> String {
        let mut norm = file;
        if let Some(base) = &self.src_base {
            let path = Path::new(&norm);
            if path.is_absolute() {
                let resolved = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
                if let Ok(rel) = resolved.strip_prefix(base) {
                    norm = rel.to_slash_lossy().into_owned();
                }
            }
        }
        if !self.known.is_empty() && !self.known.contains(&norm) {
            if let Some(Some(key)) = basename(&norm).and_then(|b| self.basenames.get(b)) {
                norm.clone_from(key);
            }
        }
        norm
    }
}

fn basename(path: &str) -> Option<&str> {
    Path::new(path).file_name().and_then(|n| n.to_str())
}

/// Cached, normalizing front end to a [`LineMapper`]
pub struct LineResolver<'a> {
    mapper: Box<dyn LineMapper + 'a>,
    normalizer: PathNormalizer,
    cache: Mutex<HashMap<u64, LineInfo>>,
}

impl<'a> LineResolver<'a> {
    pub fn new(
        mapper: Box<dyn LineMapper + 'a>,
        src_base: Option<&Path>,
        sources: Option<&SourceTable>,
    ) -> Self {
        Self {
            mapper,
            normalizer: PathNormalizer::new(src_base, sources),
            cache: Mutex::new(HashMap::new()),
        }
    }

    #[must_use]
    pub fn mapper_name(&self) -> &str {
        self.mapper.name()
    }

    /// Resolve every uncached address in one batch
    ///
    /// Never fails: a tool error caches "no information" for the whole batch.
    pub fn resolve(&self, addrs: &[u64]) {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut seen = HashSet::new();
        let todo: Vec<u64> =
            addrs.iter().copied().filter(|a| !cache.contains_key(a) && seen.insert(*a)).collect();
        if todo.is_empty() {
            return;
        }

        let mut lines = match self.mapper.map(&todo) {
            Ok(lines) => lines,
            Err(e) => {
                warn!("Line mapping failed for {} addresses: {e}", todo.len());
                cache.extend(todo.into_iter().map(|a| (a, None)));
                return;
            }
        };
        if lines.len() != todo.len() {
            debug!("{} returned {} lines for {} addresses", self.mapper.name(), lines.len(), todo.len());
            lines.resize(todo.len(), UNKNOWN_LOCATION.to_string());
        }

        for (addr, text) in todo.into_iter().zip(lines) {
            let info = parse_location(&text).map(|(file, line)| (self.normalizer.normalize(file), line));
            cache.insert(addr, info);
        }
    }

    /// Cached result for `addr`; `None` when unresolved or unknown
    #[must_use]
    pub fn lookup(&self, addr: u64) -> LineInfo {
        self.cache.lock().unwrap_or_else(PoisonError::into_inner).get(&addr).cloned().flatten()
    }

    /// Fill in file/line on rows that do not carry them yet
    pub fn annotate_slice(&self, rows: &mut [AsmRow]) {
        let needs = |row: &AsmRow| row.file.is_none() || row.line.is_none();
        let addrs: Vec<u64> =
            rows.iter().filter(|r| needs(r)).filter_map(|r| parse_hex_address(&r.address)).collect();
        self.resolve(&addrs);

        for row in rows.iter_mut().filter(|r| needs(r)) {
            if let Some((file, line)) = parse_hex_address(&row.address).and_then(|a| self.lookup(a)) {
                row.file = Some(file);
                row.line = Some(line);
            }
        }
    }
}
