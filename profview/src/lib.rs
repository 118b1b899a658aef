//! # profview - Profile Correlation & Disassembly Annotation
//!
//! profview takes the per-source-line sample table a profiler writes and
//! correlates every sample with the machine code and source text around it.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ profile JSON  │──▶│    profile    │──▶│   analysis    │
//! │  (entries)    │   │ (validate,    │   │ (flame tree,  │
//! └───────────────┘   │  summarize)   │   │  layout)      │
//!                     └───────┬───────┘   └───────┬───────┘
//!                             │                   │
//! ┌───────────────┐   ┌───────▼───────┐   ┌───────▼───────┐
//! │ objdump /     │──▶│    disasm     │──▶│    report     │──▶ export
//! │ addr2line     │   │ (parse, index │   │ (windows,     │   (report.json,
//! │ (toolchain)   │   │  slice, mix)  │   │  diagnostics) │    flame.svg)
//! └───────────────┘   └───────▲───────┘   └───────────────┘
//!                             │
//!                     ┌───────┴───────┐
//!                     │ symbolization │
//!                     │ (translate,   │
//!                     │  lines, src)  │
//!                     └───────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`profile`]: entry validation, ranking and per-file rollups
//! - [`analysis`]: call-chain aggregation into a flame tree and its layout
//! - [`disasm`]: disassembler backends, output parser, address index, mixed view
//! - [`symbolization`]: address translation, line resolution, source embedding
//! - [`toolchain`]: locating and running external tools
//! - [`report`]: the end-to-end pipeline and its diagnostics
//! - [`export`]: flame SVG rendering and the on-disk bundle
//! - [`cli`]: command-line and environment configuration
//! - [`domain`]: shared types and error enums
//!
//! ## Failure Model
//!
//! Only malformed input aborts a run. A missing disassembler, a failing
//! line mapper or an address with no matching instruction degrades the
//! affected view and is recorded in the report's diagnostics.
//!
//! ## Typical Usage
//!
//! ```bash
//! profview -i prof.json --elf game.elf --src-base ./src --embed-source context
//! RUST_LOG=debug profview -i prof.json --elf game.elf --text-base 0x41000
//! ```

pub mod analysis;
pub mod cli;
pub mod disasm;
pub mod domain;
pub mod export;
pub mod preflight;
pub mod profile;
pub mod report;
pub mod symbolization;
pub mod toolchain;
