//! Analysis logic for profiling data
//!
//! This module contains pure aggregation logic, separated from report
//! assembly and export.

pub mod flame;

pub use flame::{build_flame_tree, label_color, layout, FlameJson, FlameLayout, FlameNode, FlameRect};
