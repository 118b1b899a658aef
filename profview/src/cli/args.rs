//! CLI argument definitions

use clap::Parser;
use std::path::PathBuf;

use crate::disasm::backend::DEFAULT_ROM_ARCH;
use crate::domain::{EmbedMode, Metric};
use crate::report::DEFAULT_TITLE;
use crate::symbolization::DEFAULT_CONTEXT_LINES;

#[derive(Parser, Debug)]
#[command(
    name = "profview",
    about = "Correlate profiler samples with disassembly and source",
    after_help = "\
ENVIRONMENT:
    GEO_PROF_RESOLVED_JSON, GEO_PROF_JSON   Input profile when --input is omitted
    GEO_PROF_ELF                            Default for --elf
    GEO_PROF_SRC_BASE                       Default for --src-base
    E9K_TOOLCHAIN_PREFIX                    Default for --toolchain-prefix
    GEO_PROF_ROM, GEO_PROF_ROM_BASE         Default for --rom / --rom-base

EXAMPLES:
    profview -i prof.json --elf game.elf --src-base ./src
    profview -i prof.json --elf game.elf --text-base 0x41000 --toolchain-prefix m68k-amigaos-"
)]
pub struct Args {
    /// Input profile JSON file
    #[arg(short, long, value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Output directory (default: <input dir>/profile-view)
    #[arg(short, long, value_name = "DIR")]
    pub out: Option<PathBuf>,

    /// Sort key for entry rows
    #[arg(long, value_enum, default_value_t = Metric::Cycles)]
    pub sort: Metric,

    /// Report title
    #[arg(long, default_value = DEFAULT_TITLE)]
    pub title: String,

    /// Metric for flame graph widths (default: --sort)
    #[arg(long, value_enum)]
    pub flame_metric: Option<Metric>,

    /// ELF used for disassembly and line mapping
    #[arg(long, value_name = "FILE")]
    pub elf: Option<PathBuf>,

    /// Toolchain prefix used to locate objdump/addr2line (e.g. m68k-amigaos-)
    #[arg(long)]
    pub toolchain_prefix: Option<String>,

    /// Runtime TEXT base address for PC translation
    #[arg(long, value_name = "ADDR")]
    pub text_base: Option<String>,

    /// Runtime DATA base address (reported only)
    #[arg(long, value_name = "ADDR")]
    pub data_base: Option<String>,

    /// Runtime BSS base address (reported only)
    #[arg(long, value_name = "ADDR")]
    pub bss_base: Option<String>,

    /// Source tree root for embedding source files
    #[arg(long, value_name = "DIR")]
    pub src_base: Option<PathBuf>,

    /// Embed source: none, full files, or line context slices
    #[arg(long, value_enum, default_value_t = EmbedMode::Full)]
    pub embed_source: EmbedMode,

    /// Context lines on each side with --embed-source context
    #[arg(long, default_value_t = DEFAULT_CONTEXT_LINES)]
    pub context_lines: usize,

    /// Raw ROM image disassembled when the ELF yields nothing
    #[arg(long, value_name = "FILE")]
    pub rom: Option<PathBuf>,

    /// Load address of the ROM image
    #[arg(long, value_name = "ADDR")]
    pub rom_base: Option<String>,

    /// objdump architecture for the ROM image
    #[arg(long, default_value = DEFAULT_ROM_ARCH)]
    pub rom_arch: String,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}
