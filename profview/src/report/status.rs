//! Diagnostics object attached to every report
//!
//! Absorbed failures never abort a run; they end up here as flags, counters
//! and human-readable messages.

use log::warn;
use serde::Serialize;

use crate::domain::EmbedMode;
use crate::symbolization::TranslationStats;

pub const MSG_NO_ADDRESSES: &str = "No entry addresses found (all address fields empty); ASM/Mixed view unavailable. Ensure analysis JSON includes an address per entry.";
pub const MSG_NO_LINE_MAPPING: &str = "ASM OK but no source line mapping found; Mixed view unavailable. Ensure ELF has DWARF line info (build with -g and do not strip), and that PCs match the ELF VMAs.";
pub const MSG_NO_ASM: &str = "No ASM available. Ensure a suitable objdump is in PATH and --elf is set (or ROM+BASE).";

/// Where the instruction index came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AsmSource {
    Elf,
    Rom,
}

#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AsmStatus {
    pub ok: bool,
    pub tool: Option<String>,
    pub mixed: bool,
    pub source: Option<AsmSource>,
    pub elf: Option<String>,
    pub toolchain_prefix: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entries_total: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub slices: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcs_parsed: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pcs_adjusted: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_base: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_base: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bss_base: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vma_min: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub vma_max: Option<String>,
}

impl AsmStatus {
    pub fn record_translation(&mut self, stats: TranslationStats) {
        self.pcs_parsed = Some(stats.parsed);
        self.pcs_adjusted = Some(stats.adjusted);
    }

    pub fn record_range(&mut self, min: u64, max: u64) {
        self.vma_min = Some(format!("{min:#010x}"));
        self.vma_max = Some(format!("{max:#010x}"));
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SourcesStatus {
    pub mode: EmbedMode,
    pub base: Option<String>,
    pub files: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct Diagnostics {
    pub asm: AsmStatus,
    pub sources: SourcesStatus,
    pub errors: Vec<String>,
}

impl Diagnostics {
    #[must_use]
    pub fn new(mode: EmbedMode, src_base: Option<String>) -> Self {
        Self {
            asm: AsmStatus::default(),
            sources: SourcesStatus { mode, base: src_base, files: 0 },
            errors: Vec::new(),
        }
    }

    /// Record a non-fatal failure
    pub fn error(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!("{message}");
        self.errors.push(message);
    }

    /// Append the summary warnings for a degraded disassembly view
    pub fn finish(&mut self) {
        if self.asm.ok && !self.asm.mixed {
            if self.asm.pcs_parsed == Some(0) {
                self.error(MSG_NO_ADDRESSES);
            } else {
                self.error(MSG_NO_LINE_MAPPING);
            }
        }
        if !self.asm.ok {
            self.error(MSG_NO_ASM);
        }
    }
}
