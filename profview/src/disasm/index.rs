//! Sorted address index over disassembled instructions
//!
//! Provides bounded context windows around a sampled program counter. The
//! window is centred on the instruction that holds the target: the target's
//! own address when it is known, otherwise the closest instruction start
//! below it. Targets outside the index centre on the first or last
//! instruction. Windows are clipped, never wrapped, at either end.

use serde::Serialize;
use std::collections::BTreeMap;

use super::parser::InstructionRecord;
use crate::domain::Vma;

/// Instruction rows kept on each side of the sampled PC
pub const SLICE_CONTEXT: usize = 24;

/// One row of an instruction window
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AsmRow {
    /// Fixed-width `0x%06x` address
    pub address: String,
    pub text: String,
    #[serde(rename = "isPC")]
    pub is_pc: bool,
    pub file: Option<String>,
    pub line: Option<u32>,
}

/// Inclusive `[min, max]` range of addresses seen in the disassembly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VmaRange {
    pub min: u64,
    pub max: u64,
}

impl VmaRange {
    #[must_use]
    pub fn contains(&self, addr: u64) -> bool {
        addr >= self.min && addr <= self.max
    }
}

/// Ascending addresses with a parallel lookup table
#[derive(Debug, Clone, Default)]
pub struct AddressIndex {
    addrs: Vec<u64>,
    records: BTreeMap<u64, InstructionRecord>,
}

impl AddressIndex {
    /// Build the index; the table's keys are unique so the addresses are
    /// strictly increasing
    #[must_use]
    pub fn new(records: BTreeMap<u64, InstructionRecord>) -> Self {
        let addrs = records.keys().copied().collect();
        Self { addrs, records }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.addrs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.addrs.is_empty()
    }

    #[must_use]
    pub fn get(&self, addr: u64) -> Option<&InstructionRecord> {
        self.records.get(&addr)
    }

    /// Observed address range, `None` for an empty index
    #[must_use]
    pub fn range(&self) -> Option<VmaRange> {
        Some(VmaRange { min: *self.addrs.first()?, max: *self.addrs.last()? })
    }

    /// Position of the instruction holding `target`, and whether the target
    /// actually lies inside the index
    fn locate(&self, target: u64) -> Option<(usize, bool)> {
        let range = self.range()?;
        if target < range.min {
            return Some((0, false));
        }
        if target > range.max {
            return Some((self.addrs.len() - 1, false));
        }
        // addrs[0] <= target, so at least one address is not above it
        let at_or_below = self.addrs.partition_point(|&a| a <= target);
        Some((at_or_below - 1, true))
    }

    /// Up to `2 * context + 1` rows around `target`
    ///
    /// The row holding the target is flagged as the PC; no row is flagged
    /// when the target lies outside the index.
    #[must_use]
    pub fn slice(&self, target: u64, context: usize) -> Vec<AsmRow> {
        let Some((center, inside)) = self.locate(target) else {
            return Vec::new();
        };
        let pc_addr = inside.then(|| self.addrs[center]);

        let start = center.saturating_sub(context);
        let end = (center + context + 1).min(self.addrs.len());

        self.addrs[start..end]
            .iter()
            .map(|&addr| {
                let rec = &self.records[&addr];
                AsmRow {
                    address: Vma(addr).to_string(),
                    text: rec.text.clone(),
                    is_pc: pc_addr == Some(addr),
                    file: rec.file.clone(),
                    line: rec.line,
                }
            })
            .collect()
    }
}
