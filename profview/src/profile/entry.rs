//! Profile entry model and validation
//!
//! The profiler emits a JSON array with one object per sampled source
//! location. Required fields are validated strictly; optional fields are
//! kept only when well-formed and silently dropped otherwise.

use serde::Serialize;
use serde_json::{Map, Value};
use std::path::Path;

use crate::domain::SchemaError;

/// Separator between call-chain labels in `function_chain`
pub const CHAIN_SEPARATOR: &str = "->";

/// One frame of an inlined or virtual call chain
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChainFrame {
    pub file: String,
    pub line: i64,
    /// Passed through unexamined
    pub function: Option<Value>,
    /// Passed through unexamined
    #[serde(rename = "loc")]
    pub location: Option<Value>,
}

/// One profiled source location
#[derive(Debug, Clone, PartialEq)]
pub struct SampleEntry {
    pub file: String,
    pub line: u64,
    pub cycles: u64,
    pub count: u64,
    /// Program counter as written by the profiler (hex text)
    pub address: String,
    pub source: String,
    pub function_chain: Option<String>,
    pub function_chain_frames: Option<Vec<ChainFrame>>,
}

impl SampleEntry {
    /// Weight of this entry for the given metric
    #[must_use]
    pub fn weight(&self, metric: crate::domain::Metric) -> u64 {
        match metric {
            crate::domain::Metric::Cycles => self.cycles,
            crate::domain::Metric::Count => self.count,
        }
    }

    /// Call-chain labels, or `file:line` when no usable chain is present
    #[must_use]
    pub fn chain_labels(&self) -> Vec<String> {
        let labels: Vec<String> = self
            .function_chain
            .as_deref()
            .map(|chain| {
                chain
                    .split(CHAIN_SEPARATOR)
                    .map(str::trim)
                    .filter(|label| !label.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if labels.is_empty() {
            vec![format!("{}:{}", self.file, self.line)]
        } else {
            labels
        }
    }
}

/// Read and validate a profile JSON file
///
/// # Errors
/// Returns an error if the file cannot be read or fails validation
pub fn load_entries(path: &Path) -> anyhow::Result<Vec<SampleEntry>> {
    use anyhow::Context;

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile {}", path.display()))?;
    Ok(parse_entries(&raw)?)
}

/// Parse and validate profile JSON text
///
/// # Errors
/// Returns a [`SchemaError`] for malformed JSON or an invalid entry
pub fn parse_entries(raw: &str) -> Result<Vec<SampleEntry>, SchemaError> {
    let data: Value = serde_json::from_str(raw)?;
    validate_entries(&data)
}

/// Validate an already-parsed JSON value as a list of entries
///
/// # Errors
/// Returns a [`SchemaError`] naming the first offending entry and field
pub fn validate_entries(data: &Value) -> Result<Vec<SampleEntry>, SchemaError> {
    let items = data.as_array().ok_or(SchemaError::NotAnArray)?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let obj = item.as_object().ok_or(SchemaError::NotAnObject(index))?;
            validate_entry(index, obj)
        })
        .collect()
}

fn validate_entry(index: usize, obj: &Map<String, Value>) -> Result<SampleEntry, SchemaError> {
    let file = required_str(obj, index, "file")?;
    let line = required_uint(obj, index, "line")?;
    let cycles = required_uint(obj, index, "cycles")?;
    let count = required_uint(obj, index, "count")?;
    let address = required_str(obj, index, "address")?;

    let source = obj.get("source").and_then(Value::as_str).unwrap_or_default().to_string();
    let function_chain = obj.get("function_chain").and_then(Value::as_str).map(str::to_string);
    let function_chain_frames =
        obj.get("function_chain_frames").and_then(Value::as_array).map(|frames| {
            frames.iter().filter_map(Value::as_object).filter_map(chain_frame).collect()
        });

    Ok(SampleEntry {
        file,
        line,
        cycles,
        count,
        address,
        source,
        function_chain,
        function_chain_frames,
    })
}

fn chain_frame(obj: &Map<String, Value>) -> Option<ChainFrame> {
    let file = obj.get("file")?.as_str()?.to_string();
    // Frames require a real integer; floats are not coerced here
    let line = match obj.get("line")? {
        Value::Number(n) if n.is_i64() || n.is_u64() => n.as_i64()?,
        _ => return None,
    };
    Some(ChainFrame {
        file,
        line,
        function: obj.get("function").cloned(),
        location: obj.get("loc").cloned(),
    })
}

fn required_str(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<String, SchemaError> {
    obj.get(field)
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or(SchemaError::NotAString { index, field })
}

/// 2^64; whole floats at or above this do not fit in a `u64`
const U64_LIMIT_F64: f64 = 18_446_744_073_709_551_616.0;

// Whole-valued floats such as `12.0` are accepted and coerced
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn required_uint(
    obj: &Map<String, Value>,
    index: usize,
    field: &'static str,
) -> Result<u64, SchemaError> {
    let Some(Value::Number(n)) = obj.get(field) else {
        return Err(SchemaError::NotAnInteger { index, field });
    };

    if let Some(v) = n.as_u64() {
        return Ok(v);
    }
    if n.as_i64().is_some() {
        return Err(SchemaError::Negative { index, field });
    }
    match n.as_f64() {
        Some(v) if v.is_finite() && v.fract() == 0.0 => {
            if v < 0.0 {
                Err(SchemaError::Negative { index, field })
            } else if v >= U64_LIMIT_F64 {
                Err(SchemaError::NotAnInteger { index, field })
            } else {
                Ok(v as u64)
            }
        }
        _ => Err(SchemaError::NotAnInteger { index, field }),
    }
}
