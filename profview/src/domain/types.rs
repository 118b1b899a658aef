//! Domain types providing compile-time safety and self-documentation

use serde::Serialize;
use std::fmt;

/// Metric used for sorting entries and sizing flame graph bars
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Metric {
    #[default]
    Cycles,
    Count,
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Metric::Cycles => f.write_str("cycles"),
            Metric::Count => f.write_str("count"),
        }
    }
}

/// How much source text to embed in the report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum EmbedMode {
    None,
    #[default]
    Full,
    Context,
}

/// Static (VMA) address of an instruction inside the binary
///
/// Displayed as `0x` followed by at least six lowercase hex digits, the
/// format used for every address column in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Vma(pub u64);

impl fmt::Display for Vma {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:06x}", self.0)
    }
}

impl From<u64> for Vma {
    fn from(addr: u64) -> Self {
        Vma(addr)
    }
}

/// Parse a sample address field (`"0x1a2b"`, `"1A2B"`, `" 0x1a2b "`)
///
/// The field is always hexadecimal; an optional `0x` prefix and `_` digit
/// separators are accepted.
#[must_use]
pub fn parse_hex_address(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    let digits = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(&digits, 16).ok()
}

/// Parse a configured base address, auto-detecting the radix from its prefix
///
/// `0x`/`0o`/`0b` select hex/octal/binary, anything else is decimal.
#[must_use]
pub fn parse_base_address(text: &str) -> Option<u64> {
    let trimmed = text.trim();
    let lower = trimmed.to_ascii_lowercase();
    let (digits, radix) = if let Some(rest) = lower.strip_prefix("0x") {
        (rest, 16)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (rest, 8)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (rest, 2)
    } else {
        (lower.as_str(), 10)
    };
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if digits.is_empty() {
        return None;
    }
    u64::from_str_radix(&digits, radix).ok()
}
