//! Command-line configuration
//!
//! [`Args`] holds what was typed; [`resolve`] fills the gaps from the
//! environment and produces the immutable [`ReportConfig`] plus the output
//! directory.

pub mod args;

pub use args::Args;

use anyhow::Result;
use std::path::PathBuf;

use crate::domain::UsageError;
use crate::report::{ReportConfig, RomConfig};

pub const ENV_RESOLVED_JSON: &str = "GEO_PROF_RESOLVED_JSON";
pub const ENV_JSON: &str = "GEO_PROF_JSON";
pub const ENV_ELF: &str = "GEO_PROF_ELF";
pub const ENV_SRC_BASE: &str = "GEO_PROF_SRC_BASE";
pub const ENV_TOOLCHAIN_PREFIX: &str = "E9K_TOOLCHAIN_PREFIX";
pub const ENV_ROM: &str = "GEO_PROF_ROM";
pub const ENV_ROM_BASE: &str = "GEO_PROF_ROM_BASE";

/// Output directory name used next to the input when `--out` is omitted
pub const DEFAULT_OUT_DIR: &str = "profile-view";

/// Resolved run settings
#[derive(Debug)]
pub struct RunConfig {
    pub report: ReportConfig,
    pub out_dir: PathBuf,
    pub quiet: bool,
}

/// Apply environment fallbacks to `args`
///
/// `env` looks up a variable; empty values count as unset.
///
/// # Errors
/// Returns [`UsageError::MissingInput`] when no input is given
pub fn resolve(args: Args, env: impl Fn(&str) -> Option<String>) -> Result<RunConfig> {
    let env = |key: &str| env(key).filter(|v| !v.is_empty());

    let Some(input) = args.input.or_else(|| env(ENV_RESOLVED_JSON).or_else(|| env(ENV_JSON)).map(PathBuf::from))
    else {
        return Err(UsageError::MissingInput { resolved: ENV_RESOLVED_JSON, json: ENV_JSON }.into());
    };

    let out_dir = args.out.unwrap_or_else(|| {
        input.parent().map_or_else(|| PathBuf::from(DEFAULT_OUT_DIR), |dir| dir.join(DEFAULT_OUT_DIR))
    });

    let rom = args.rom.or_else(|| env(ENV_ROM).map(PathBuf::from)).and_then(|path| {
        let base = args.rom_base.clone().or_else(|| env(ENV_ROM_BASE))?;
        Some(RomConfig { path, base, arch: args.rom_arch.clone() })
    });

    let report = ReportConfig {
        input,
        sort: args.sort,
        title: args.title,
        flame_metric: args.flame_metric,
        elf: args.elf.or_else(|| env(ENV_ELF).map(PathBuf::from)),
        toolchain_prefix: args.toolchain_prefix.or_else(|| env(ENV_TOOLCHAIN_PREFIX)),
        text_base: args.text_base,
        data_base: args.data_base,
        bss_base: args.bss_base,
        src_base: args.src_base.or_else(|| env(ENV_SRC_BASE).map(PathBuf::from)),
        embed_source: args.embed_source,
        context_lines: args.context_lines,
        rom,
    };

    Ok(RunConfig { report, out_dir, quiet: args.quiet })
}
