//! On-disk report bundle
//!
//! Writes `report.json` (the full [`Report`]) and `flame.svg` into one
//! output directory.

use log::info;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::domain::ExportError;
use crate::report::Report;

pub const REPORT_FILE: &str = "report.json";
pub const FLAME_FILE: &str = "flame.svg";

/// Serializes a finished report
pub struct ReportExporter<'a> {
    report: &'a Report,
}

impl<'a> ReportExporter<'a> {
    #[must_use]
    pub fn new(report: &'a Report) -> Self {
        Self { report }
    }

    /// Write the report as JSON
    ///
    /// # Errors
    /// Returns an error if serialization or the writer fails
    pub fn export<W: Write>(&self, writer: W) -> Result<(), ExportError> {
        let mut writer = BufWriter::new(writer);
        serde_json::to_writer(&mut writer, self.report)?;
        writer.flush()?;
        Ok(())
    }

    /// Create `dir` and write the bundle files into it
    ///
    /// # Errors
    /// Returns [`ExportError::WriteFailed`] naming the file that could not be written
    pub fn write_bundle(&self, dir: &Path) -> Result<Vec<PathBuf>, ExportError> {
        fs::create_dir_all(dir).map_err(|source| write_failed(dir, source))?;

        let report_path = dir.join(REPORT_FILE);
        let file = File::create(&report_path).map_err(|source| write_failed(&report_path, source))?;
        self.export(file).map_err(|e| match e {
            ExportError::Io(source) => write_failed(&report_path, source),
            other => other,
        })?;

        let flame_path = dir.join(FLAME_FILE);
        fs::write(&flame_path, &self.report.flame_svg)
            .map_err(|source| write_failed(&flame_path, source))?;

        info!("Wrote report bundle to {}", dir.display());
        Ok(vec![report_path, flame_path])
    }
}

fn write_failed(path: &Path, source: std::io::Error) -> ExportError {
    ExportError::WriteFailed { path: path.display().to_string(), source }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::parse_entries;
    use crate::report::{build_report, ReportConfig};
    use crate::toolchain::fake::FakeRunner;

    fn report() -> Report {
        let entries = parse_entries(
            r#"[{"file": "a.c", "line": 1, "cycles": 5, "count": 1, "address": "0x10",
                 "function_chain": "main -> draw"}]"#,
        )
        .unwrap();
        build_report(&entries, &ReportConfig::new("in.json"), &FakeRunner::default())
    }

    #[test]
    fn test_export_top_level_keys() {
        let report = report();
        let mut buffer = Vec::new();
        ReportExporter::new(&report).export(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        for key in ["data", "flame", "flameSvg", "sources", "status", "asm", "asmMix"] {
            assert!(parsed.get(key).is_some(), "missing {key}");
        }
        assert_eq!(parsed["flame"]["children"][0]["name"], "main");
        assert_eq!(parsed["data"]["entries"][0]["cyclesPct"], 1.0);
    }

    #[test]
    fn test_write_bundle_creates_files() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("nested").join("view");
        let report = report();

        let written = ReportExporter::new(&report).write_bundle(&out).unwrap();
        assert_eq!(written.len(), 2);
        assert!(fs::read_to_string(out.join(FLAME_FILE)).unwrap().starts_with("<svg"));
    }

    #[test]
    fn test_write_bundle_reports_path_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("file");
        fs::write(&blocker, "x").unwrap();
        let report = report();

        let err = ReportExporter::new(&report).write_bundle(&blocker.join("out")).unwrap_err();
        assert!(matches!(err, ExportError::WriteFailed { .. }));
    }
}
