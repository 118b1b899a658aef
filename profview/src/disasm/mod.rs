//! Disassembly correlation
//!
//! - `backend`: disassembler selection and invocation ([`DisasmBackend`])
//! - `parser`: line-classifying scanner over disassembler text
//! - `index`: address-ordered instruction index and window slicing
//! - `mixed`: interleaved source/instruction view for one sample

pub mod backend;
pub mod index;
pub mod mixed;
pub mod parser;

pub use backend::{disassemble, elf_backends, rom_backends, DisasmBackend, DisasmRun};
pub use index::{AddressIndex, AsmRow, VmaRange, SLICE_CONTEXT};
pub use mixed::{event_window, inline_rows, resolved_rows, MixedRow, MIXED_CONTEXT};
pub use parser::{
    classify_line, parse_disassembly, DisasmEvent, Disassembly, InstructionRecord, LineClass,
    ParseMode,
};
