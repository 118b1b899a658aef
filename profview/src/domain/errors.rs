//! Structured error types for profview
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! Only [`SchemaError`] aborts a run; tool failures are absorbed into the
//! report diagnostics by the caller.

use thiserror::Error;

/// Invalid profile input. Fatal: aggregation cannot run on unvalidated data.
#[derive(Error, Debug)]
pub enum SchemaError {
    #[error("Failed to parse JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Input must be a JSON array of objects")]
    NotAnArray,

    #[error("entry[{0}] must be an object")]
    NotAnObject(usize),

    #[error("entry[{index}].{field} must be string")]
    NotAString { index: usize, field: &'static str },

    #[error("entry[{index}].{field} must be integer")]
    NotAnInteger { index: usize, field: &'static str },

    #[error("entry[{index}].{field} must be >= 0")]
    Negative { index: usize, field: &'static str },
}

impl SchemaError {
    /// Index of the offending entry, when the error is tied to one
    #[must_use]
    pub fn index(&self) -> Option<usize> {
        match self {
            Self::NotAnObject(index)
            | Self::NotAString { index, .. }
            | Self::NotAnInteger { index, .. }
            | Self::Negative { index, .. } => Some(*index),
            Self::Json(_) | Self::NotAnArray => None,
        }
    }
}

/// Bad command-line usage; the binary exits with the usage status
#[derive(Error, Debug)]
pub enum UsageError {
    #[error("missing required argument: --input not provided and neither ${resolved} nor ${json} is set")]
    MissingInput { resolved: &'static str, json: &'static str },
}

/// Failure of an external disassembler or line-mapping tool
#[derive(Error, Debug)]
pub enum ToolError {
    #[error("No suitable {0} found in PATH")]
    Unavailable(String),

    #[error("Failed to run {program}: {reason}")]
    InvocationFailed { program: String, reason: String },

    #[error("{0} produced no output")]
    EmptyOutput(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Failed to write report file {path}: {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_error_display_names_entry_and_field() {
        let err = SchemaError::NotAnInteger { index: 3, field: "cycles" };
        assert_eq!(err.to_string(), "entry[3].cycles must be integer");
        assert_eq!(err.index(), Some(3));
    }

    #[test]
    fn test_tool_error_display() {
        let err = ToolError::InvocationFailed {
            program: "m68k-amigaos-objdump".to_string(),
            reason: "exit status: 1".to_string(),
        };
        assert!(err.to_string().contains("m68k-amigaos-objdump"));
        assert!(err.to_string().contains("exit status: 1"));
    }
}
