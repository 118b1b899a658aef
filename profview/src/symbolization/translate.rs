//! Runtime address to VMA translation
//!
//! Profilers record program counters as seen at run time. When the binary
//! was relocated at load, those values sit outside the VMA range the
//! disassembly reports, and the relocation bias must be removed first.
//!
//! ```text
//! bias      = runtime_base - vma_min
//! candidate = raw - bias
//! ```
//!
//! The candidate is used only when it lands inside `[vma_min, vma_max]`.
//! An in-range but wrong address is still possible, so every applied
//! translation is counted and surfaced in the report diagnostics.

use log::debug;
use serde::Serialize;

use crate::disasm::VmaRange;

/// Outcome of translating one program counter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Translation {
    pub address: u64,
    /// The bias was subtracted
    pub adjusted: bool,
}

/// Counters for addresses seen vs. addresses translated
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TranslationStats {
    pub parsed: usize,
    pub adjusted: usize,
}

impl TranslationStats {
    pub fn record(&mut self, translation: Translation) {
        self.parsed += 1;
        if translation.adjusted {
            self.adjusted += 1;
        }
    }
}

/// Maps raw sample addresses into the disassembly's address space
#[derive(Debug, Clone, Copy, Default)]
pub struct AddressTranslator {
    range: Option<VmaRange>,
    runtime_base: Option<u64>,
}

impl AddressTranslator {
    #[must_use]
    pub fn new(range: Option<VmaRange>, runtime_base: Option<u64>) -> Self {
        Self { range, runtime_base }
    }

    /// Translate `raw`, falling back to the raw value when no rule applies
    #[must_use]
    pub fn translate(&self, raw: u64) -> Translation {
        let unchanged = Translation { address: raw, adjusted: false };
        let (Some(range), Some(base)) = (self.range, self.runtime_base) else {
            return unchanged;
        };
        if range.contains(raw) {
            return unchanged;
        }

        let bias = i128::from(base) - i128::from(range.min);
        let candidate = i128::from(raw) - bias;
        match u64::try_from(candidate) {
            Ok(address) if range.contains(address) => {
                debug!("Translated 0x{raw:x} -> 0x{address:x} (bias {bias:#x})");
                Translation { address, adjusted: true }
            }
            _ => unchanged,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn translator(base: Option<u64>) -> AddressTranslator {
        AddressTranslator::new(Some(VmaRange { min: 0x1000, max: 0x2000 }), base)
    }

    #[test]
    fn test_runtime_address_is_rebased() {
        let t = translator(Some(0x41000)).translate(0x41234);
        assert_eq!(t, Translation { address: 0x1234, adjusted: true });
    }

    #[test]
    fn test_in_range_address_is_unchanged() {
        let t = translator(Some(0x41000)).translate(0x1500);
        assert_eq!(t, Translation { address: 0x1500, adjusted: false });
        // Inclusive bounds
        assert!(!translator(Some(0x41000)).translate(0x2000).adjusted);
    }

    #[test]
    fn test_out_of_range_candidate_falls_back_to_raw() {
        let t = translator(Some(0x41000)).translate(0x50000);
        assert_eq!(t, Translation { address: 0x50000, adjusted: false });
    }

    #[test]
    fn test_no_base_or_range_never_translates() {
        assert!(!translator(None).translate(0x41234).adjusted);
        let empty = AddressTranslator::new(None, Some(0x41000));
        assert_eq!(empty.translate(0x41234).address, 0x41234);
    }

    #[test]
    fn test_base_below_vma_min() {
        // Negative bias: runtime addresses lower than the link address
        let t = translator(Some(0x0)).translate(0x0234);
        assert_eq!(t, Translation { address: 0x1234, adjusted: true });
    }

    #[test]
    fn test_stats_count_parsed_and_adjusted() {
        let tr = translator(Some(0x41000));
        let mut stats = TranslationStats::default();
        for raw in [0x41234, 0x1500, 0x90000] {
            stats.record(tr.translate(raw));
        }
        assert_eq!(stats, TranslationStats { parsed: 3, adjusted: 1 });
    }
}
