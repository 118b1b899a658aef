//! Entry ranking, percentage shares and per-file rollups
//!
//! Produces the tabular half of the report: every entry with its share of
//! the totals, sorted by the selected metric, plus one rollup row per file.

// Percentage calculations intentionally convert u64 to f64
#![allow(clippy::cast_precision_loss)]

use indexmap::IndexMap;
use serde::Serialize;
use std::cmp::Ordering;
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

use super::entry::{ChainFrame, SampleEntry};
use crate::domain::Metric;

/// Aggregate of all entries that share a source file
#[derive(Debug, Clone, Serialize)]
pub struct FileRollup {
    pub file: String,
    pub cycles: u64,
    pub count: u64,
    /// Number of entries attributed to this file
    pub lines: usize,
    #[serde(rename = "cyclesPct")]
    pub cycles_pct: f64,
}

/// One entry as it appears in the report table
#[derive(Debug, Clone, Serialize)]
pub struct EntryRow {
    pub file: String,
    pub line: u64,
    pub cycles: u64,
    pub count: u64,
    pub address: String,
    pub source: String,
    pub function_chain: Option<String>,
    #[serde(rename = "cyclesPct")]
    pub cycles_pct: f64,
    #[serde(rename = "countPct")]
    pub count_pct: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub function_chain_frames: Option<Vec<ChainFrame>>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SummaryMeta {
    pub generated_at: String,
    pub total_cycles: u64,
    pub total_count: u64,
    pub files: Vec<FileRollup>,
    pub sort: Metric,
    pub title: String,
    pub source_file: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProfileSummary {
    pub meta: SummaryMeta,
    pub entries: Vec<EntryRow>,
}

/// Ordering used for the report table: metric descending, then file, then line
#[must_use]
pub fn compare_entries(a: &SampleEntry, b: &SampleEntry, metric: Metric) -> Ordering {
    b.weight(metric)
        .cmp(&a.weight(metric))
        .then_with(|| a.file.cmp(&b.file))
        .then_with(|| a.line.cmp(&b.line))
}

/// Stable in-place sort by [`compare_entries`]
pub fn sort_entries(entries: &mut [SampleEntry], metric: Metric) {
    entries.sort_by(|a, b| compare_entries(a, b, metric));
}

/// Totals are summed in 128 bits; any number of `u64` weights fits
fn total(values: impl Iterator<Item = u64>) -> u128 {
    values.map(u128::from).sum()
}

/// Clamp a 128-bit total into the `u64` reported in `meta`
fn clamp_total(total: u128) -> u64 {
    u64::try_from(total).unwrap_or(u64::MAX)
}

fn share(part: u64, total: u128) -> f64 {
    if total == 0 {
        0.0
    } else {
        part as f64 / total as f64
    }
}

/// Per-file rollups in first-encounter order
#[must_use]
pub fn file_rollups(entries: &[SampleEntry]) -> Vec<FileRollup> {
    let total_cycles = total(entries.iter().map(|e| e.cycles));

    let mut by_file: IndexMap<&str, (u64, u64, usize)> = IndexMap::new();
    for e in entries {
        let rec = by_file.entry(e.file.as_str()).or_default();
        rec.0 = rec.0.saturating_add(e.cycles);
        rec.1 = rec.1.saturating_add(e.count);
        rec.2 += 1;
    }

    by_file
        .into_iter()
        .map(|(file, (cycles, count, lines))| FileRollup {
            file: file.to_string(),
            cycles,
            count,
            lines,
            cycles_pct: share(cycles, total_cycles),
        })
        .collect()
}

/// Build the report table for `entries` sorted by `sort`
#[must_use]
pub fn summarize(entries: &[SampleEntry], sort: Metric) -> ProfileSummary {
    let total_cycles = total(entries.iter().map(|e| e.cycles));
    let total_count = total(entries.iter().map(|e| e.count));

    let mut ranked: Vec<&SampleEntry> = entries.iter().collect();
    ranked.sort_by(|a, b| compare_entries(a, b, sort));

    let rows = ranked
        .into_iter()
        .map(|e| EntryRow {
            file: e.file.clone(),
            line: e.line,
            cycles: e.cycles,
            count: e.count,
            address: e.address.clone(),
            source: e.source.clone(),
            function_chain: e.function_chain.clone(),
            cycles_pct: share(e.cycles, total_cycles),
            count_pct: share(e.count, total_count),
            function_chain_frames: e
                .function_chain_frames
                .clone()
                .filter(|frames| !frames.is_empty()),
        })
        .collect();

    let now = OffsetDateTime::now_utc();
    let generated_at =
        now.replace_nanosecond(0).unwrap_or(now).format(&Rfc3339).unwrap_or_default();

    ProfileSummary {
        meta: SummaryMeta {
            generated_at,
            total_cycles: clamp_total(total_cycles),
            total_count: clamp_total(total_count),
            files: file_rollups(entries),
            sort,
            title: String::new(),
            source_file: String::new(),
        },
        entries: rows,
    }
}
