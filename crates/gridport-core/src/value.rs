//! The closed cell-value variant used at the remote boundary.
//!
//! Remote payloads are dynamically typed JSON; the engine only ever sees this
//! closed set. Anything the service hands back that is not a scalar is
//! coerced to its text form at the boundary rather than modeled structurally.

use std::fmt::{self, Display};

use serde_json::Value as JsonValue;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(untagged))]
#[derive(Debug, Clone, PartialEq, Default)]
pub enum CellValue {
    Number(f64),
    Bool(bool),
    Text(String),
    #[default]
    Empty,
}

impl CellValue {
    /// Whether the cell reads as blank (empty variant or empty text).
    pub fn is_blank(&self) -> bool {
        match self {
            CellValue::Empty => true,
            CellValue::Text(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Coerce a JSON payload cell into the closed variant.
    pub fn from_json(value: &JsonValue) -> Self {
        match value {
            JsonValue::Null => CellValue::Empty,
            JsonValue::Bool(b) => CellValue::Bool(*b),
            JsonValue::Number(n) => match n.as_f64() {
                Some(f) => CellValue::Number(f),
                None => CellValue::Text(n.to_string()),
            },
            JsonValue::String(s) => CellValue::Text(s.clone()),
            other => CellValue::Text(other.to_string()),
        }
    }

    /// Render into a JSON payload cell. Blank cells become the empty string,
    /// which is how the values API represents a cleared cell.
    pub fn to_json(&self) -> JsonValue {
        match self {
            CellValue::Number(n) => {
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    JsonValue::from(*n as i64)
                } else {
                    JsonValue::from(*n)
                }
            }
            CellValue::Bool(b) => JsonValue::from(*b),
            CellValue::Text(s) => JsonValue::from(s.as_str()),
            CellValue::Empty => JsonValue::from(""),
        }
    }
}

/// Drop trailing blank cells from a row, mirroring the values-API convention
/// that rows are reported only up to their last meaningful cell.
pub fn trim_trailing_blanks(row: &mut Vec<CellValue>) {
    while row.last().is_some_and(CellValue::is_blank) {
        row.pop();
    }
}

impl Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CellValue::Number(n) => {
                // Whole numbers render without the trailing ".0" so that key
                // comparison sees the same string the grid displays.
                if n.fract() == 0.0 && n.abs() < i64::MAX as f64 {
                    write!(f, "{}", *n as i64)
                } else {
                    write!(f, "{n}")
                }
            }
            CellValue::Bool(b) => f.write_str(if *b { "TRUE" } else { "FALSE" }),
            CellValue::Text(s) => f.write_str(s),
            CellValue::Empty => Ok(()),
        }
    }
}

impl From<&str> for CellValue {
    fn from(value: &str) -> Self {
        CellValue::Text(value.to_string())
    }
}

impl From<String> for CellValue {
    fn from(value: String) -> Self {
        CellValue::Text(value)
    }
}

impl From<f64> for CellValue {
    fn from(value: f64) -> Self {
        CellValue::Number(value)
    }
}

impl From<bool> for CellValue {
    fn from(value: bool) -> Self {
        CellValue::Bool(value)
    }
}
