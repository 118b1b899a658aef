//! Report orchestration
//!
//! Runs the whole pipeline for one input: validate, summarize, aggregate
//! the flame tree, embed sources, disassemble, translate sample addresses,
//! slice instruction windows and compose mixed views. Only input errors are
//! fatal; everything past validation degrades into [`Diagnostics`].

use anyhow::Result;
use indexmap::IndexMap;
use log::{debug, info, warn};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::status::{AsmSource, Diagnostics};
use crate::analysis::{build_flame_tree, layout, FlameJson};
use crate::disasm::{
    disassemble, elf_backends, event_window, inline_rows, resolved_rows, rom_backends,
    AddressIndex, AsmRow, DisasmEvent, DisasmRun, MixedRow, MIXED_CONTEXT, SLICE_CONTEXT,
};
use crate::domain::{parse_base_address, parse_hex_address, EmbedMode, Metric};
use crate::export::render_flame_svg;
use crate::profile::{load_entries, summarize, EntryRow, ProfileSummary, SampleEntry};
use crate::symbolization::{
    embed_sources, select_line_mapper, AddressTranslator, LineResolver, SourceTable,
    TranslationStats, DEFAULT_CONTEXT_LINES,
};
use crate::toolchain::ToolRunner;

pub const DEFAULT_TITLE: &str = "Geo Profiler Report";

/// Raw-binary fallback input
#[derive(Debug, Clone)]
pub struct RomConfig {
    pub path: PathBuf,
    /// Load address as given by the user; parsed with radix auto-detection
    pub base: String,
    pub arch: String,
}

/// Fully resolved settings for one report
#[derive(Debug, Clone)]
pub struct ReportConfig {
    pub input: PathBuf,
    pub sort: Metric,
    pub title: String,
    /// Defaults to `sort`
    pub flame_metric: Option<Metric>,
    pub elf: Option<PathBuf>,
    pub toolchain_prefix: Option<String>,
    pub text_base: Option<String>,
    pub data_base: Option<String>,
    pub bss_base: Option<String>,
    pub src_base: Option<PathBuf>,
    pub embed_source: EmbedMode,
    pub context_lines: usize,
    pub rom: Option<RomConfig>,
}

impl ReportConfig {
    #[must_use]
    pub fn new(input: impl Into<PathBuf>) -> Self {
        Self {
            input: input.into(),
            sort: Metric::Cycles,
            title: DEFAULT_TITLE.to_string(),
            flame_metric: None,
            elf: None,
            toolchain_prefix: None,
            text_base: None,
            data_base: None,
            bss_base: None,
            src_base: None,
            embed_source: EmbedMode::Full,
            context_lines: DEFAULT_CONTEXT_LINES,
            rom: None,
        }
    }
}

/// Everything the report bundle contains
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub data: ProfileSummary,
    pub flame: FlameJson,
    pub flame_svg: String,
    pub sources: Option<SourceTable>,
    pub status: Diagnostics,
    /// Lowercased sample address to instruction window
    pub asm: IndexMap<String, Vec<AsmRow>>,
    /// Lowercased sample address to interleaved source/instruction rows
    pub asm_mix: IndexMap<String, Vec<MixedRow>>,
}

/// Load, validate and correlate the input named by `config`
///
/// # Errors
/// Returns an error if the input cannot be read or fails validation
pub fn generate(config: &ReportConfig, runner: &dyn ToolRunner) -> Result<Report> {
    let entries = load_entries(&config.input)?;
    info!("Loaded {} entries from {}", entries.len(), config.input.display());
    Ok(build_report(&entries, config, runner))
}

/// Build the report for already validated entries
#[must_use]
pub fn build_report(entries: &[SampleEntry], config: &ReportConfig, runner: &dyn ToolRunner) -> Report {
    let mut data = summarize(entries, config.sort);
    data.meta.title.clone_from(&config.title);
    data.meta.source_file = absolute(&config.input).display().to_string();

    let tree = build_flame_tree(entries, config.flame_metric.unwrap_or(config.sort));
    let flame_svg = render_flame_svg(layout(&tree).as_ref());
    let flame = tree.to_json();

    let mut status = Diagnostics::new(
        config.embed_source,
        config.src_base.as_ref().map(|p| p.display().to_string()),
    );
    status.asm.elf = config.elf.as_ref().map(|p| p.display().to_string());
    status.asm.toolchain_prefix.clone_from(&config.toolchain_prefix);

    let sources = load_sources(entries, config);
    status.sources.files = sources.as_ref().map_or(0, |s| s.files.len());

    let mut views = Views::default();
    if let Some(elf) = config.elf.as_deref().filter(|p| p.exists()) {
        match disassemble(runner, &elf_backends(config.toolchain_prefix.as_deref()), elf) {
            Ok(run) => correlate_elf(&data.entries, run, elf, config, runner, sources.as_ref(), &mut status, &mut views),
            Err(e) => status.error(format!("ELF disassembly failed: {e}")),
        }
    } else if let Some(elf) = &config.elf {
        warn!("ELF {} does not exist", elf.display());
    }

    if views.asm.is_empty() {
        if let Some(rom) = config.rom.as_ref().filter(|r| r.path.exists()) {
            correlate_rom(&data.entries, rom, config, runner, &mut status, &mut views);
        }
    }

    status.finish();

    Report { data, flame, flame_svg, sources, status, asm: views.asm, asm_mix: views.asm_mix }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

fn load_sources(entries: &[SampleEntry], config: &ReportConfig) -> Option<SourceTable> {
    if config.embed_source == EmbedMode::None {
        return None;
    }
    let Some(base) = &config.src_base else {
        warn!("--embed-source requested but --src-base not provided; skipping embedding");
        return None;
    };
    let table = embed_sources(entries, base, config.embed_source, config.context_lines);
    info!("Embedded {} source files from {}", table.files.len(), base.display());
    Some(table)
}

#[derive(Default)]
struct Views {
    asm: IndexMap<String, Vec<AsmRow>>,
    asm_mix: IndexMap<String, Vec<MixedRow>>,
}

/// How mixed rows are produced for a disassembly
enum MixedSource<'a, 'r> {
    /// Events already carry interleaved source
    Inline,
    Resolver(&'a LineResolver<'r>),
    Unavailable,
}

struct Correlator<'a, 'r> {
    index: AddressIndex,
    events: &'a [DisasmEvent],
    translator: AddressTranslator,
    resolver: Option<&'a LineResolver<'r>>,
    mixed: MixedSource<'a, 'r>,
    sources: Option<&'a SourceTable>,
}

impl Correlator<'_, '_> {
    /// Window every entry's address; returns translation counters and slice count
    fn run(&self, rows: &[EntryRow], views: &mut Views) -> (TranslationStats, usize) {
        let mut stats = TranslationStats::default();
        let mut slices = 0;

        for row in rows {
            let Some(raw) = parse_hex_address(&row.address) else {
                debug!("Skipping entry {}:{} without a usable address", row.file, row.line);
                continue;
            };
            let translation = self.translator.translate(raw);
            stats.record(translation);
            let pc = translation.address;
            let key = row.address.to_lowercase();

            let mut window = self.index.slice(pc, SLICE_CONTEXT);
            if !window.is_empty() {
                if let Some(resolver) = self.resolver {
                    resolver.annotate_slice(&mut window);
                }
                views.asm.insert(key.clone(), window);
                slices += 1;
            }

            let Some(events) = event_window(self.events, pc, MIXED_CONTEXT) else {
                continue;
            };
            let mixed = match self.mixed {
                MixedSource::Inline => inline_rows(events, pc),
                MixedSource::Resolver(resolver) => resolved_rows(events, pc, resolver, self.sources),
                MixedSource::Unavailable => Vec::new(),
            };
            if !mixed.is_empty() {
                views.asm_mix.insert(key, mixed);
            }
        }

        (stats, slices)
    }
}

#[allow(clippy::too_many_arguments)]
fn correlate_elf(
    rows: &[EntryRow],
    run: DisasmRun,
    elf: &Path,
    config: &ReportConfig,
    runner: &dyn ToolRunner,
    sources: Option<&SourceTable>,
    status: &mut Diagnostics,
    views: &mut Views,
) {
    let DisasmRun { tool, disassembly } = run;
    if disassembly.table.is_empty() {
        warn!("{tool} produced no instructions for {}", elf.display());
        return;
    }

    let asm = &mut status.asm;
    asm.ok = true;
    asm.tool = Some(tool);
    asm.source = Some(AsmSource::Elf);
    asm.entries_total = Some(rows.len());
    asm.text_base = Some(config.text_base.clone());
    asm.data_base = Some(config.data_base.clone());
    asm.bss_base = Some(config.bss_base.clone());

    let index = AddressIndex::new(disassembly.table);
    let range = index.range();
    if let Some(range) = range {
        asm.record_range(range.min, range.max);
    }

    let text_base = config.text_base.as_deref().and_then(|b| {
        let parsed = parse_base_address(b);
        if parsed.is_none() {
            warn!("Ignoring unparsable text base {b:?}");
        }
        parsed
    });

    let resolver = select_line_mapper(runner, config.toolchain_prefix.as_deref(), elf)
        .map(|mapper| LineResolver::new(mapper, config.src_base.as_deref(), sources));
    let mixed = if disassembly.mixed_candidate {
        MixedSource::Inline
    } else {
        resolver.as_ref().map_or(MixedSource::Unavailable, MixedSource::Resolver)
    };

    let correlator = Correlator {
        index,
        events: &disassembly.events,
        translator: AddressTranslator::new(range, text_base),
        resolver: resolver.as_ref(),
        mixed,
        sources,
    };
    let (stats, slices) = correlator.run(rows, views);
    info!(
        "Sliced {slices} windows ({} addresses, {} translated)",
        stats.parsed, stats.adjusted
    );

    let asm = &mut status.asm;
    asm.record_translation(stats);
    asm.slices = Some(slices);
    asm.mixed = !views.asm_mix.is_empty()
        || views.asm.values().flatten().any(|r| r.file.is_some() && r.line.is_some());
}

fn correlate_rom(
    rows: &[EntryRow],
    rom: &RomConfig,
    config: &ReportConfig,
    runner: &dyn ToolRunner,
    status: &mut Diagnostics,
    views: &mut Views,
) {
    let Some(base) = parse_base_address(&rom.base) else {
        status.error(format!("ROM disassembly failed: invalid base address {:?}", rom.base));
        return;
    };
    let backends = rom_backends(config.toolchain_prefix.as_deref(), &rom.arch, base);
    let run = match disassemble(runner, &backends, &rom.path) {
        Ok(run) => run,
        Err(e) => {
            status.error(format!("ROM disassembly failed: {e}"));
            return;
        }
    };
    if run.disassembly.table.is_empty() {
        warn!("{} produced no instructions for {}", run.tool, rom.path.display());
        return;
    }

    status.asm.ok = true;
    status.asm.tool = Some(run.tool);
    status.asm.source = Some(AsmSource::Rom);
    status.asm.mixed = false;

    let correlator = Correlator {
        index: AddressIndex::new(run.disassembly.table),
        events: &run.disassembly.events,
        translator: AddressTranslator::default(),
        resolver: None,
        mixed: MixedSource::Inline,
        sources: None,
    };
    let (_, slices) = correlator.run(rows, views);
    info!("Sliced {slices} ROM windows");
}
