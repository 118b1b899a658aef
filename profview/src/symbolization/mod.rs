//! # Source-Level Symbolization
//!
//! Turns instruction addresses into `(file, line)` pairs and source text.
//!
//! ## Address Translation Flow
//!
//! ```text
//! 1. Sample carries a raw PC, e.g. 0x41234
//! 2. Disassembly covers VMAs 0x1000 - 0x2000
//! 3. Raw PC outside the range and a runtime text base is configured:
//!      bias = 0x41000 - 0x1000, candidate = 0x41234 - bias = 0x1234
//! 4. Candidate inside the range -> use it, count one translation
//! 5. Batch-resolve window addresses: 0x1234 -> src/main.c:42
//! ```
//!
//! ## Module Structure
//!
//! - **`translate`**: runtime address to VMA rebasing with counters
//! - **`line_resolver`**: cached batch resolution through a [`LineMapper`]
//!   (an addr2line-compatible tool)
//! - **`dwarf`**: in-process [`LineMapper`] used when no tool is installed
//! - **`sources`**: locating and embedding source text
//!
//! ## Limitations
//!
//! - **Requires line tables**: binaries must be built with `-g` and not stripped
//! - **Heuristic rebasing**: a wrong bias can still land inside the range

pub mod dwarf;
pub mod line_resolver;
pub mod sources;
pub mod translate;

pub use dwarf::DwarfLineMapper;
pub use line_resolver::{
    parse_location, select_line_mapper, ExternalLineMapper, LineInfo, LineMapper, LineResolver,
};
pub use sources::{
    embed_sources, locate_source, merge_context_ranges, SourceBody, SourceFile, SourceRange,
    SourceTable, DEFAULT_CONTEXT_LINES,
};
pub use translate::{AddressTranslator, Translation, TranslationStats};
