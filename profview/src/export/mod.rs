//! Report export
//!
//! - `flame_svg`: static SVG rendering of the flame layout
//! - `bundle`: `report.json` + `flame.svg` output directory

pub mod bundle;
pub mod flame_svg;

pub use bundle::{ReportExporter, FLAME_FILE, REPORT_FILE};
pub use flame_svg::{escape_xml, render_flame_svg, shorten};
