//! # profview - Main Entry Point
//!
//! Reads a profile, correlates it with the binary's disassembly and source,
//! and writes `report.json` + `flame.svg` into the output directory.

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use profview::cli::{self, Args};
use profview::domain::UsageError;
use profview::export::ReportExporter;
use profview::preflight::run_preflight_checks;
use profview::report::generate;
use profview::toolchain::SystemRunner;

// Exit codes
const EXIT_SUCCESS: i32 = 0;
const EXIT_ERROR: i32 = 1;
const EXIT_USAGE: i32 = 2;

fn main() {
    env_logger::init();
    std::process::exit(match run() {
        Ok(()) => EXIT_SUCCESS,
        Err(e) => {
            let code = exit_code_for(&e);
            eprintln!("error: {e:#}");
            code
        }
    });
}

fn exit_code_for(err: &anyhow::Error) -> i32 {
    if err.downcast_ref::<UsageError>().is_some() {
        EXIT_USAGE
    } else {
        EXIT_ERROR
    }
}

fn run() -> Result<()> {
    let args = Args::parse();
    let config = cli::resolve(args, |key| std::env::var(key).ok())?;
    let report_config = &config.report;

    run_preflight_checks(&report_config.input, report_config.elf.as_deref(), config.quiet)?;

    let report = generate(report_config, &SystemRunner)
        .with_context(|| format!("Failed to build report from {}", report_config.input.display()))?;

    for message in &report.status.errors {
        info!("diagnostic: {message}");
    }

    let written = ReportExporter::new(&report).write_bundle(&config.out_dir)?;
    if !config.quiet {
        for path in written {
            println!("wrote {}", path.display());
        }
    }
    Ok(())
}
