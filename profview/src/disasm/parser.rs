//! Line-oriented scanner for disassembler text output
//!
//! `objdump -dS -l` and `llvm-objdump --source --line-numbers` interleave
//! instructions with several kinds of source annotation. Every line is
//! classified into exactly one [`LineClass`], with a fixed precedence:
//!
//! 1. source mapping, `path/file.c:123 [text]`
//! 2. file header, `path/file.c:` alone on the line
//! 3. line-number header, `123 text` (only once a file is known)
//! 4. instruction, `  2cc44:  <insn>`
//! 5. free text
//!
//! Classes 1-3 are only considered when the line does not start with an
//! address prefix, because mapping lines contain a colon too. An instruction
//! may carry its own trailing `file.c:123` token, which wins over the carried
//! state. The scanner
//! then folds the classes into an address table and an ordered event stream,
//! carrying the "current file" and "current line" between lines.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;

static ADDR_PREFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9a-fA-F]+):").expect("valid address regex"));
static FILE_LINE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([^\s:][^:]*\.[A-Za-z0-9_]+):([0-9]{1,7})").expect("valid mapping regex")
});
static FILE_LINE_TOKEN_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"([^\s:]+\.[A-Za-z0-9_]+):([0-9]{1,7})").expect("valid mapping regex")
});
static FILE_ONLY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\s*([^\s].*\.[A-Za-z0-9_]+):\s*$").expect("valid file header regex")
});
static LINE_ONLY_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*([0-9]{1,7})\b").expect("valid line header regex"));

/// objdump's `Disassembly of section .text:` banner, which would otherwise
/// read as a file header
const SECTION_BANNER: &str = "Disassembly of section";

/// Grammar to apply to the disassembler output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParseMode {
    /// Object file with sections, symbols and possibly line info
    Elf,
    /// Raw machine code: only `<hex>:<insn>` and free text, no source correlation
    Rom,
}

/// One disassembled instruction, keyed by its address in the table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstructionRecord {
    pub text: String,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// One event of the linear disassembly stream, in original order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DisasmEvent {
    Source { file: Option<String>, line: Option<u32>, text: String },
    Instruction { address: u64, text: String, file: Option<String>, line: Option<u32> },
}

impl DisasmEvent {
    #[must_use]
    pub fn address(&self) -> Option<u64> {
        match self {
            DisasmEvent::Instruction { address, .. } => Some(*address),
            DisasmEvent::Source { .. } => None,
        }
    }
}

/// Result of scanning one disassembler output
#[derive(Debug, Clone, Default)]
pub struct Disassembly {
    /// Address to instruction; a later line for the same address overwrites
    pub table: BTreeMap<u64, InstructionRecord>,
    pub events: Vec<DisasmEvent>,
    /// At least one instruction carried a positive source line
    pub mixed_candidate: bool,
}

/// Classification of a single output line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineClass<'a> {
    SourceMapping { file: &'a str, line: Option<u32>, rest: &'a str },
    FileHeader { file: &'a str },
    LineNumber { line: Option<u32>, rest: &'a str },
    Instruction { address: u64, text: &'a str, mapping: Option<(&'a str, Option<u32>)> },
    Text(&'a str),
    /// Empty lines, label terminators such as `<main>:`, unparseable addresses
    Skip,
}

/// Classify one line of ELF-mode output
///
/// `has_file` tells whether a current file is already known, which is the
/// only state that influences classification.
#[must_use]
pub fn classify_line(raw: &str, has_file: bool) -> LineClass<'_> {
    let ln = raw.trim_end();
    let s = ln.trim();

    if let Some(addr) = ADDR_PREFIX_RE.captures(ln) {
        let Ok(address) = u64::from_str_radix(&addr[1], 16) else {
            return LineClass::Skip;
        };
        let prefix_end = addr.get(0).map_or(0, |m| m.end());
        let mapping = FILE_LINE_TOKEN_RE.captures(&ln[prefix_end..]).and_then(|c| {
            let file = c.get(1)?.as_str();
            Some((file, c[2].parse().ok()))
        });
        return LineClass::Instruction { address, text: ln[prefix_end..].trim(), mapping };
    }

    if s.starts_with(SECTION_BANNER) {
        return LineClass::Skip;
    }

    if let Some(c) = FILE_LINE_RE.captures(s) {
        let file = c.get(1).map_or("", |m| m.as_str());
        let end = c.get(0).map_or(0, |m| m.end());
        return LineClass::SourceMapping { file, line: c[2].parse().ok(), rest: s[end..].trim() };
    }

    if let Some(c) = FILE_ONLY_RE.captures(s) {
        return LineClass::FileHeader { file: c.get(1).map_or("", |m| m.as_str()) };
    }

    if has_file {
        if let Some(c) = LINE_ONLY_RE.captures(ln) {
            let end = c.get(0).map_or(0, |m| m.end());
            return LineClass::LineNumber { line: c[1].parse().ok(), rest: ln[end..].trim() };
        }
    }

    if s.is_empty() || s.ends_with(':') {
        LineClass::Skip
    } else {
        LineClass::Text(s)
    }
}

/// Scan disassembler output into an address table and event stream
#[must_use]
pub fn parse_disassembly(output: &str, mode: ParseMode) -> Disassembly {
    match mode {
        ParseMode::Elf => parse_elf(output),
        ParseMode::Rom => parse_rom(output),
    }
}

#[derive(Default)]
struct ScanState {
    file: Option<String>,
    line: Option<u32>,
}

fn parse_elf(output: &str) -> Disassembly {
    let mut out = Disassembly::default();
    let mut state = ScanState::default();

    for raw in output.lines() {
        match classify_line(raw, state.file.is_some()) {
            LineClass::SourceMapping { file, line, rest } => {
                state.file = Some(file.to_string());
                state.line = line;
                if !rest.is_empty() {
                    out.events.push(DisasmEvent::Source {
                        file: state.file.clone(),
                        line: state.line,
                        text: rest.to_string(),
                    });
                }
            }
            LineClass::FileHeader { file } => {
                // The line number arrives on the following line-number header
                state.file = Some(file.to_string());
            }
            LineClass::LineNumber { line, rest } => {
                state.line = line;
                if !rest.is_empty() {
                    out.events.push(DisasmEvent::Source {
                        file: state.file.clone(),
                        line: state.line,
                        text: rest.to_string(),
                    });
                }
            }
            LineClass::Instruction { address, text, mapping } => {
                if text.is_empty() {
                    continue;
                }
                let (file, line) = match mapping {
                    Some((file, line)) => (Some(file.to_string()), line),
                    None => (state.file.clone(), state.line),
                };
                if file.is_some() && line.is_some_and(|l| l > 0) {
                    out.mixed_candidate = true;
                }
                out.table.insert(
                    address,
                    InstructionRecord { text: text.to_string(), file: file.clone(), line },
                );
                out.events.push(DisasmEvent::Instruction {
                    address,
                    text: text.to_string(),
                    file,
                    line,
                });
            }
            LineClass::Text(text) => out.events.push(DisasmEvent::Source {
                file: state.file.clone(),
                line: state.line,
                text: text.to_string(),
            }),
            LineClass::Skip => {}
        }
    }

    out
}

fn parse_rom(output: &str) -> Disassembly {
    let mut out = Disassembly::default();

    for raw in output.lines() {
        let ln = raw.trim_end();
        if let Some((addr, insn)) = ln.split_once(':') {
            let Ok(address) = u64::from_str_radix(addr.trim(), 16) else {
                continue;
            };
            let text = insn.trim();
            if !text.is_empty() {
                out.table.insert(
                    address,
                    InstructionRecord { text: text.to_string(), file: None, line: None },
                );
                out.events.push(DisasmEvent::Instruction {
                    address,
                    text: text.to_string(),
                    file: None,
                    line: None,
                });
            }
        } else {
            let s = ln.trim();
            if !s.is_empty() && !s.ends_with(':') {
                out.events.push(DisasmEvent::Source { file: None, line: None, text: s.to_string() });
            }
        }
    }

    out
}
