//! Domain model for profview
//!
//! This module contains core domain types and errors that provide:
//! - Compile-time safety via newtype pattern
//! - Self-documenting function signatures
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{parse_base_address, parse_hex_address, EmbedMode, Metric, Vma};

pub use errors::{ExportError, SchemaError, ToolError, UsageError};
