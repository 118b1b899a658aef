//! Profile input model
//!
//! - `entry`: validated [`SampleEntry`] records loaded from the profiler's JSON
//! - `summary`: ranking, percentage shares and per-file rollups for the report

pub mod entry;
pub mod summary;

pub use entry::{load_entries, parse_entries, validate_entries, ChainFrame, SampleEntry};
pub use summary::{sort_entries, summarize, EntryRow, FileRollup, ProfileSummary};
