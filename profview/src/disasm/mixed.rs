//! Interleaved source/instruction view around one sample
//!
//! Two inputs are supported. When the disassembler already interleaved
//! source (`objdump -S -l`), the event stream is passed through as is.
//! Otherwise instruction addresses are resolved through a [`LineResolver`]
//! and a source row is synthesized before each instruction that starts a
//! new `(file, line)` run.

use serde::Serialize;

use super::parser::DisasmEvent;
use crate::domain::Vma;
use crate::symbolization::{LineResolver, SourceTable};

/// Events kept on each side of the sample's instruction
pub const MIXED_CONTEXT: usize = 60;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum MixedRow {
    Src {
        file: Option<String>,
        line: Option<u32>,
        text: String,
    },
    Insn {
        address: String,
        text: String,
        file: Option<String>,
        line: Option<u32>,
        #[serde(rename = "isPC")]
        is_pc: bool,
    },
}

/// Events within `context` of the first instruction at exactly `pc`
#[must_use]
pub fn event_window(events: &[DisasmEvent], pc: u64, context: usize) -> Option<&[DisasmEvent]> {
    let center = events.iter().position(|e| e.address() == Some(pc))?;
    let start = center.saturating_sub(context);
    let end = (center + context + 1).min(events.len());
    Some(&events[start..end])
}

/// Pass-through rendering of already interleaved events
#[must_use]
pub fn inline_rows(window: &[DisasmEvent], pc: u64) -> Vec<MixedRow> {
    window
        .iter()
        .map(|event| match event {
            DisasmEvent::Source { file, line, text } => {
                MixedRow::Src { file: file.clone(), line: *line, text: text.clone() }
            }
            DisasmEvent::Instruction { address, text, file, line } => MixedRow::Insn {
                address: Vma(*address).to_string(),
                text: text.clone(),
                file: file.clone(),
                line: *line,
                is_pc: *address == pc,
            },
        })
        .collect()
}

/// Rebuild the mixed view from resolved line information
///
/// Source events in `window` are ignored; only instructions are kept, each
/// preceded by a source row when its `(file, line)` differs from the last
/// emitted one. Instructions without line information do not break a run.
#[must_use]
pub fn resolved_rows(
    window: &[DisasmEvent],
    pc: u64,
    resolver: &LineResolver<'_>,
    sources: Option<&SourceTable>,
) -> Vec<MixedRow> {
    let addrs: Vec<u64> = window.iter().filter_map(DisasmEvent::address).collect();
    resolver.resolve(&addrs);

    let mut rows = Vec::with_capacity(window.len() * 2);
    let mut last: Option<(String, u32)> = None;
    for event in window {
        let DisasmEvent::Instruction { address, text, .. } = event else {
            continue;
        };
        let info = resolver.lookup(*address);
        if let Some((file, line)) = &info {
            if last.as_ref() != info.as_ref() {
                let text = sources
                    .and_then(|s| s.line_text(file, *line))
                    .unwrap_or_default()
                    .to_string();
                rows.push(MixedRow::Src { file: Some(file.clone()), line: Some(*line), text });
                last.clone_from(&info);
            }
        }
        let (file, line) = info.map_or((None, None), |(f, l)| (Some(f), Some(l)));
        rows.push(MixedRow::Insn {
            address: Vma(*address).to_string(),
            text: text.clone(),
            file,
            line,
            is_pc: *address == pc,
        });
    }
    rows
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::symbolization::line_resolver::tests::TableMapper;
    use crate::symbolization::sources::{SourceBody, SourceFile};

    fn insn(address: u64) -> DisasmEvent {
        DisasmEvent::Instruction { address, text: format!("op_{address:x}"), file: None, line: None }
    }

    fn src(text: &str) -> DisasmEvent {
        DisasmEvent::Source { file: Some("a.c".to_string()), line: Some(1), text: text.to_string() }
    }

    fn count(rows: &[MixedRow]) -> (usize, usize) {
        let srcs = rows.iter().filter(|r| matches!(r, MixedRow::Src { .. })).count();
        (srcs, rows.len() - srcs)
    }

    #[test]
    fn test_window_centers_on_first_exact_match() {
        let events: Vec<DisasmEvent> = (0..200).map(insn).collect();
        let window = event_window(&events, 100, MIXED_CONTEXT).unwrap();
        assert_eq!(window.len(), 121);
        assert_eq!(window[0].address(), Some(40));
        assert_eq!(window[120].address(), Some(160));

        let window = event_window(&events, 3, MIXED_CONTEXT).unwrap();
        assert_eq!(window.len(), 64);
        assert!(event_window(&events, 1000, MIXED_CONTEXT).is_none());
    }

    #[test]
    fn test_window_counts_source_events() {
        let events = vec![src("a"), src("b"), insn(0x10), src("c")];
        let window = event_window(&events, 0x10, 1).unwrap();
        assert_eq!(window.len(), 3);
    }

    #[test]
    fn test_inline_rows_pass_through() {
        let events = vec![src("int x;"), insn(0x10), insn(0x12)];
        let rows = inline_rows(&events, 0x12);
        assert_eq!(count(&rows), (1, 2));
        assert_eq!(
            rows[2],
            MixedRow::Insn {
                address: "0x000012".to_string(),
                text: "op_12".to_string(),
                file: None,
                line: None,
                is_pc: true
            }
        );
    }

    #[test]
    fn test_same_line_instructions_share_one_source_row() {
        let mapper = TableMapper::with(&[
            (0x10, "a.c:7"),
            (0x12, "a.c:7"),
            (0x14, "a.c:7"),
            (0x16, "a.c:7"),
            (0x18, "a.c:7"),
        ]);
        let resolver = LineResolver::new(Box::new(mapper), None, None);
        let events: Vec<DisasmEvent> = [0x10, 0x12, 0x14, 0x16, 0x18].into_iter().map(insn).collect();

        let rows = resolved_rows(&events, 0x14, &resolver, None);
        assert_eq!(count(&rows), (1, 5));
        assert!(matches!(&rows[0], MixedRow::Src { text, .. } if text.is_empty()));
        assert!(matches!(rows[3], MixedRow::Insn { is_pc: true, .. }));
    }

    #[test]
    fn test_new_line_and_unknown_instructions() {
        let mapper = TableMapper::with(&[(0x10, "a.c:7"), (0x14, "a.c:7"), (0x16, "a.c:8")]);
        let resolver = LineResolver::new(Box::new(mapper), None, None);
        // 0x12 resolves to nothing and does not start a new run
        let events = vec![insn(0x10), src("ignored"), insn(0x12), insn(0x14), insn(0x16)];

        let rows = resolved_rows(&events, 0x99, &resolver, None);
        assert_eq!(count(&rows), (2, 4));
        assert!(matches!(&rows[2], MixedRow::Insn { file: None, line: None, .. }));
        assert!(matches!(&rows[4], MixedRow::Src { line: Some(8), .. }));
    }

    #[test]
    fn test_source_text_comes_from_table() {
        let mut table = SourceTable::default();
        table.files.insert(
            "a.c".to_string(),
            SourceFile { path: "/a.c".to_string(), body: SourceBody::Full { content: "one\ntwo".to_string() } },
        );
        let mapper = TableMapper::with(&[(0x10, "a.c:2")]);
        let resolver = LineResolver::new(Box::new(mapper), None, Some(&table));

        let rows = resolved_rows(&[insn(0x10)], 0x10, &resolver, Some(&table));
        assert_eq!(rows[0], MixedRow::Src { file: Some("a.c".to_string()), line: Some(2), text: "two".to_string() });
    }

    #[test]
    fn test_serialized_shape() {
        let row = MixedRow::Insn {
            address: "0x000010".to_string(),
            text: "rts".to_string(),
            file: None,
            line: None,
            is_pc: true,
        };
        let json = serde_json::to_value(&row).unwrap();
        assert_eq!(json["kind"], "insn");
        assert_eq!(json["isPC"], true);
        let json = serde_json::to_value(MixedRow::Src { file: None, line: None, text: String::new() }).unwrap();
        assert_eq!(json["kind"], "src");
    }
}
