use std::cell::RefCell;
use std::collections::HashMap;
use std::ffi::OsString;
use std::fs;
use std::path::Path;

use profview::domain::{EmbedMode, Metric, ToolError};
use profview::export::{ReportExporter, FLAME_FILE, REPORT_FILE};
use profview::report::{generate, ReportConfig};
use profview::toolchain::ToolRunner;

/// Answers tool invocations from canned output
#[derive(Default)]
struct ScriptedRunner {
    outputs: HashMap<&'static str, &'static str>,
    calls: RefCell<Vec<String>>,
}

impl ToolRunner for ScriptedRunner {
    fn is_available(&self, program: &str) -> bool {
        self.outputs.contains_key(program)
    }

    fn run(&self, program: &str, _args: &[OsString]) -> Result<Vec<u8>, ToolError> {
        self.calls.borrow_mut().push(program.to_string());
        self.outputs
            .get(program)
            .map(|s| s.as_bytes().to_vec())
            .ok_or_else(|| ToolError::Unavailable(program.to_string()))
    }
}

const OBJDUMP: &str = "\
game.elf:     file format elf32-m68k

Disassembly of section .text:

00001000 <draw>:
    1000:\t4e56 0000 \tlinkw %fp,#0
    1004:\t7001      \tmoveq #1,%d0
    1006:\t4e5e      \tunlk %fp
    1008:\t4e75      \trts
";

const PROFILE: &str = r#"[
    {"file": "src/draw.c", "line": 4, "cycles": 300, "count": 30, "address": "0x41004",
     "source": "x = 1;", "function_chain": "main -> draw"},
    {"file": "src/draw.c", "line": 3, "cycles": 100, "count": 70, "address": "0x41000",
     "function_chain": "main -> draw"},
    {"file": "src/main.c", "line": 9, "cycles": 0, "count": 0, "address": ""}
]"#;

fn write_fixture(dir: &Path) -> ReportConfig {
    fs::create_dir_all(dir.join("src")).unwrap();
    fs::write(dir.join("src/draw.c"), "void draw(void) {\n  int x;\n  x = 0;\n  x = 1;\n}\n").unwrap();
    fs::write(dir.join("src/main.c"), "int main(void) { draw(); }\n").unwrap();
    fs::write(dir.join("game.elf"), b"\x7fELF").unwrap();
    let input = dir.join("profile.json");
    fs::write(&input, PROFILE).unwrap();

    let mut config = ReportConfig::new(input);
    config.elf = Some(dir.join("game.elf"));
    config.src_base = Some(dir.to_path_buf());
    config.text_base = Some("0x41000".to_string());
    config
}

#[test]
fn test_full_pipeline_with_resolver() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());
    let runner = ScriptedRunner {
        outputs: HashMap::from([
            ("objdump", OBJDUMP),
            ("addr2line", "src/draw.c:3\nsrc/draw.c:4\nsrc/draw.c:4\nsrc/draw.c:5\n"),
        ]),
        ..Default::default()
    };

    let report = generate(&config, &runner).unwrap();

    // Ranked by cycles, then file/line
    let lines: Vec<u64> = report.data.entries.iter().map(|e| e.line).collect();
    assert_eq!(lines, vec![4, 3, 9]);
    assert_eq!(report.data.meta.total_cycles, 400);
    assert_eq!(report.data.meta.files.len(), 2);
    assert_eq!(report.flame.value, 400.0);

    let sources = report.sources.as_ref().unwrap();
    assert_eq!(sources.files.len(), 2);
    assert_eq!(report.status.sources.files, 2);

    let asm = &report.status.asm;
    assert!(asm.ok);
    assert_eq!((asm.pcs_parsed, asm.pcs_adjusted, asm.slices), (Some(2), Some(2), Some(2)));
    assert!(asm.mixed);
    assert!(report.status.errors.is_empty(), "{:?}", report.status.errors);

    let mixed = &report.asm_mix["0x41004"];
    let json = serde_json::to_value(mixed).unwrap();
    assert_eq!(json[0]["kind"], "src");
    assert_eq!(json[0]["text"], "  x = 0;");
    assert_eq!(json[2]["kind"], "src");
    assert_eq!(json[2]["text"], "  x = 1;");
    assert_eq!(json[3]["isPC"], true);

    // One batch for all window addresses, answered from cache afterwards
    assert_eq!(runner.calls.borrow().iter().filter(|p| *p == "addr2line").count(), 1);
}

#[test]
fn test_pipeline_degrades_without_tools() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = write_fixture(dir.path());
    config.embed_source = EmbedMode::Context;
    config.context_lines = 1;
    config.sort = Metric::Count;

    let report = generate(&config, &ScriptedRunner::default()).unwrap();

    assert_eq!(report.data.entries[0].line, 3);
    assert!(report.asm.is_empty());
    assert_eq!(report.status.errors.len(), 2);
    assert!(report.status.errors[0].starts_with("ELF disassembly failed"));
    assert!(report.status.errors[1].starts_with("No ASM available"));

    let json = serde_json::to_value(report.sources.as_ref().unwrap()).unwrap();
    assert_eq!(json["files"]["src/draw.c"]["ranges"][0]["start"], 2);
}

#[test]
fn test_invalid_input_is_fatal() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("bad.json");
    fs::write(&input, r#"[{"file": "a.c", "line": 1, "cycles": -5, "count": 0, "address": "0x0"}]"#)
        .unwrap();

    let err = generate(&ReportConfig::new(&input), &ScriptedRunner::default()).unwrap_err();
    assert!(format!("{err:#}").contains("entry[0].cycles must be >= 0"));
}

#[test]
fn test_bundle_written_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let config = write_fixture(dir.path());
    let report = generate(&config, &ScriptedRunner::default()).unwrap();

    let out = dir.path().join("profile-view");
    ReportExporter::new(&report).write_bundle(&out).unwrap();

    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(out.join(REPORT_FILE)).unwrap()).unwrap();
    assert_eq!(parsed["data"]["meta"]["sort"], "cycles");
    assert_eq!(parsed["data"]["meta"]["title"], "Geo Profiler Report");
    assert_eq!(parsed["status"]["sources"]["mode"], "full");
    assert!(fs::read_to_string(out.join(FLAME_FILE)).unwrap().contains("main"));
}
