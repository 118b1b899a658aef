//! Embedded source text
//!
//! Source files referenced by the profile are located under a source root
//! and embedded either whole or as merged line ranges around the referenced
//! lines. The same table later supplies the text for mixed-view source rows.

use log::{debug, warn};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::domain::EmbedMode;
use crate::profile::SampleEntry;

/// Default number of lines kept on each side of a referenced line
pub const DEFAULT_CONTEXT_LINES: usize = 12;

/// One contiguous block of embedded lines, 1-based `start`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub start: i64,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SourceBody {
    Full { content: String },
    Ranges { ranges: Vec<SourceRange> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SourceFile {
    /// Absolute path the text was read from
    pub path: String,
    #[serde(flatten)]
    pub body: SourceBody,
}

/// Source text keyed by the file name used in the profile
#[derive(Debug, Clone, Default, Serialize)]
pub struct SourceTable {
    pub base: String,
    pub files: BTreeMap<String, SourceFile>,
}

impl SourceTable {
    #[must_use]
    pub fn contains(&self, file: &str) -> bool {
        self.files.contains_key(file)
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.files.keys().map(String::as_str)
    }

    /// Text of `line` (1-based) in `file`, by exact key then range containment
    #[must_use]
    pub fn line_text(&self, file: &str, line: u32) -> Option<&str> {
        let rec = self.files.get(file)?;
        let line = i64::from(line);
        match &rec.body {
            SourceBody::Full { content } => {
                let idx = usize::try_from(line - 1).ok()?;
                content.lines().nth(idx)
            }
            SourceBody::Ranges { ranges } => ranges.iter().find_map(|range| {
                let offset = usize::try_from(line - range.start).ok()?;
                range.content.lines().nth(offset)
            }),
        }
    }
}

/// Merge `[line - context, line + context]` windows into sorted, disjoint
/// inclusive ranges clipped to `[1, total_lines]`
///
/// Overlapping and directly adjacent windows are merged. Lines past the end
/// of the file contribute no range.
#[must_use]
pub fn merge_context_ranges(lines: &[i64], context: i64, total_lines: i64) -> Vec<(i64, i64)> {
    let mut sorted: Vec<i64> = lines.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    let mut ranges: Vec<(i64, i64)> = Vec::new();
    for line in sorted {
        let start = line.saturating_sub(context).max(1);
        let end = line.saturating_add(context).min(total_lines);
        if start > end {
            continue;
        }
        match ranges.last_mut() {
            Some((_, prev_end)) if start <= prev_end.saturating_add(1) => {
                *prev_end = (*prev_end).max(end);
            }
            _ => ranges.push((start, end)),
        }
    }
    ranges
}

/// Resolve `name` under `src_base`: the joined path when it exists, else the
/// first file with the same basename found by a sorted recursive walk
#[must_use]
pub fn locate_source(src_base: &Path, name: &str) -> Option<PathBuf> {
    let direct = src_base.join(name);
    if direct.exists() {
        return Some(direct);
    }

    let target = Path::new(name).file_name()?;
    WalkDir::new(src_base)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .find(|e| e.file_type().is_file() && e.file_name() == target)
        .map(walkdir::DirEntry::into_path)
}

/// Decode as UTF-8, falling back to Latin-1 so any byte sequence is readable
fn decode_source(bytes: Vec<u8>) -> String {
    match String::from_utf8(bytes) {
        Ok(text) => text,
        Err(e) => e.into_bytes().iter().map(|&b| char::from(b)).collect(),
    }
}

fn absolute(path: &Path) -> PathBuf {
    path.canonicalize().unwrap_or_else(|_| path.to_path_buf())
}

/// Referenced lines per file, from entries and their chain frames
fn referenced_lines(entries: &[SampleEntry]) -> BTreeMap<&str, Vec<i64>> {
    let mut by_file: BTreeMap<&str, Vec<i64>> = BTreeMap::new();
    for e in entries {
        by_file.entry(e.file.as_str()).or_default().push(i64::try_from(e.line).unwrap_or(i64::MAX));
        for frame in e.function_chain_frames.iter().flatten() {
            by_file.entry(frame.file.as_str()).or_default().push(frame.line);
        }
    }
    by_file
}

/// Embed the sources referenced by `entries`
///
/// Files that cannot be located or read are skipped. `mode` must not be
/// [`EmbedMode::None`]; in that case an empty table is returned.
// Line counts of real source files fit in i64
#[allow(clippy::cast_possible_wrap)]
#[must_use]
pub fn embed_sources(
    entries: &[SampleEntry],
    src_base: &Path,
    mode: EmbedMode,
    context_lines: usize,
) -> SourceTable {
    let mut table = SourceTable { base: absolute(src_base).display().to_string(), ..Default::default() };
    if mode == EmbedMode::None {
        return table;
    }
    let context = i64::try_from(context_lines).unwrap_or(i64::MAX);

    for (name, lines) in referenced_lines(entries) {
        let Some(path) = locate_source(src_base, name) else {
            debug!("Source {name} not found under {}", src_base.display());
            continue;
        };
        let text = match std::fs::read(&path) {
            Ok(bytes) => decode_source(bytes),
            Err(e) => {
                warn!("Failed to read source {}: {e}", path.display());
                continue;
            }
        };

        let body = if mode == EmbedMode::Full {
            SourceBody::Full { content: text }
        } else {
            let total_lines = text.matches('\n').count() as i64 + 1;
            let text_lines: Vec<&str> = text.lines().collect();
            let ranges = merge_context_ranges(&lines, context, total_lines)
                .into_iter()
                .map(|(start, end)| {
                    let from = usize::try_from(start - 1).unwrap_or(0).min(text_lines.len());
                    let to = usize::try_from(end).unwrap_or(0).clamp(from, text_lines.len());
                    SourceRange { start, content: text_lines[from..to].join("\n") }
                })
                .collect();
            SourceBody::Ranges { ranges }
        };

        table
            .files
            .insert(name.to_string(), SourceFile { path: absolute(&path).display().to_string(), body });
    }

    table
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn entry(file: &str, line: u64) -> SampleEntry {
        SampleEntry {
            file: file.to_string(),
            line,
            cycles: 1,
            count: 1,
            address: "0x0".to_string(),
            source: String::new(),
            function_chain: None,
            function_chain_frames: None,
        }
    }

    fn numbered(n: usize) -> String {
        (1..=n).map(|i| format!("line {i}")).collect::<Vec<_>>().join("\n")
    }

    #[test]
    fn test_merge_overlapping_context_ranges() {
        assert_eq!(merge_context_ranges(&[50, 58], 5, 100), vec![(45, 63)]);
        assert_eq!(merge_context_ranges(&[58, 50, 50], 5, 100), vec![(45, 63)]);
        assert_eq!(merge_context_ranges(&[10, 30], 2, 100), vec![(8, 12), (28, 32)]);
        // Adjacent blocks merge as well
        assert_eq!(merge_context_ranges(&[10, 15], 2, 100), vec![(8, 17)]);
        assert_eq!(merge_context_ranges(&[1, 99], 5, 100), vec![(1, 6), (94, 100)]);
    }

    #[test]
    fn test_merge_extreme_lines_and_context() {
        assert_eq!(merge_context_ranges(&[i64::MAX, 3], 12, 100), vec![(1, 15)]);
        assert_eq!(merge_context_ranges(&[i64::MIN, 50], 5, 100), vec![(45, 55)]);
        assert_eq!(merge_context_ranges(&[50], i64::MAX, 100), vec![(1, 100)]);
        assert!(merge_context_ranges(&[500], 5, 100).is_empty());
    }

    #[test]
    fn test_embed_context_with_huge_line_numbers() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.c"), numbered(10)).unwrap();

        let table = embed_sources(
            &[entry("a.c", u64::MAX), entry("a.c", 2)],
            dir.path(),
            EmbedMode::Context,
            usize::MAX,
        );
        let SourceBody::Ranges { ranges } = &table.files["a.c"].body else {
            panic!("expected ranges");
        };
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, 1);
        assert_eq!(table.line_text("a.c", 10), Some("line 10"));
    }

    #[test]
    fn test_locate_source_prefers_direct_then_basename() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("src/gfx")).unwrap();
        fs::write(dir.path().join("src/gfx/blit.c"), "x").unwrap();
        fs::write(dir.path().join("main.c"), "y").unwrap();

        assert_eq!(locate_source(dir.path(), "main.c"), Some(dir.path().join("main.c")));
        assert_eq!(
            locate_source(dir.path(), "/build/elsewhere/blit.c"),
            Some(dir.path().join("src/gfx/blit.c"))
        );
        assert_eq!(locate_source(dir.path(), "missing.c"), None);
    }

    #[test]
    fn test_embed_full_and_lookup() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.c"), numbered(20)).unwrap();

        let table = embed_sources(&[entry("a.c", 3), entry("gone.c", 1)], dir.path(), EmbedMode::Full, 12);
        assert_eq!(table.file_names().collect::<Vec<_>>(), vec!["a.c"]);
        assert_eq!(table.line_text("a.c", 3), Some("line 3"));
        assert_eq!(table.line_text("a.c", 0), None);
        assert_eq!(table.line_text("a.c", 21), None);
        assert_eq!(table.line_text("b.c", 1), None);
    }

    #[test]
    fn test_embed_context_ranges() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.c"), numbered(100)).unwrap();

        let table =
            embed_sources(&[entry("a.c", 50), entry("a.c", 58)], dir.path(), EmbedMode::Context, 5);
        let SourceBody::Ranges { ranges } = &table.files["a.c"].body else {
            panic!("expected ranges");
        };
        assert_eq!(ranges.len(), 1);
        assert_eq!(ranges[0].start, 45);
        assert_eq!(ranges[0].content.lines().count(), 19);
        assert_eq!(table.line_text("a.c", 63), Some("line 63"));
        assert_eq!(table.line_text("a.c", 44), None);

        let json = serde_json::to_value(&table).unwrap();
        assert_eq!(json["files"]["a.c"]["ranges"][0]["start"], 45);
        assert!(json["files"]["a.c"].get("content").is_none());
    }

    #[test]
    fn test_embed_includes_chain_frame_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a.c"), numbered(5)).unwrap();
        fs::write(dir.path().join("inl.h"), numbered(5)).unwrap();

        let mut e = entry("a.c", 1);
        e.function_chain_frames = Some(vec![crate::profile::ChainFrame {
            file: "inl.h".to_string(),
            line: 2,
            function: None,
            location: None,
        }]);
        let table = embed_sources(&[e], dir.path(), EmbedMode::Full, 0);
        assert!(table.contains("inl.h"));
    }

    #[test]
    fn test_latin1_fallback() {
        assert_eq!(decode_source(vec![b'c', 0xe9]), "c\u{e9}");
    }
}
