//! Report assembly
//!
//! - `builder`: end-to-end pipeline from validated entries to [`Report`]
//! - `status`: [`Diagnostics`] collected along the way

pub mod builder;
pub mod status;

pub use builder::{build_report, generate, Report, ReportConfig, RomConfig, DEFAULT_TITLE};
pub use status::{AsmSource, AsmStatus, Diagnostics, SourcesStatus};
