use thiserror::Error;

use crate::backend::BackendError;
use gridport_core::AddrError;

/// Errors surfaced by engine operations.
///
/// Each variant carries a machine-readable [`ErrorKind`] so the calling layer
/// can map failures to its own surface (exit codes, HTTP statuses) without
/// string matching.
#[derive(Debug, Error)]
pub enum GridPortError {
    #[error("row number must be between 1 and {max}, got {row}", max = u32::MAX)]
    InvalidRowNumber { row: i64 },

    #[error("invalid range `{range}`: {source}")]
    InvalidRange {
        range: String,
        source: AddrError,
    },

    #[error("no input values supplied")]
    NoInputValues,

    #[error("inputs `{first}` and `{second}` both resolve to column {column}")]
    ColumnCollision {
        first: String,
        second: String,
        column: String,
    },

    #[error("key column `{column}` not found")]
    KeyColumnNotFound { column: String },

    #[error("key `{value}` matched {count} rows; set allow_multi to update them all")]
    MultipleMatches { value: String, count: usize },

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Coarse error taxonomy exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    NotFound,
    Multiplicity,
    Remote,
}

impl ErrorKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not-found",
            ErrorKind::Multiplicity => "multiplicity",
            ErrorKind::Remote => "remote",
        }
    }
}

impl GridPortError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GridPortError::InvalidRowNumber { .. }
            | GridPortError::InvalidRange { .. }
            | GridPortError::NoInputValues
            | GridPortError::ColumnCollision { .. } => ErrorKind::Validation,
            GridPortError::KeyColumnNotFound { .. } => ErrorKind::NotFound,
            GridPortError::MultipleMatches { .. } => ErrorKind::Multiplicity,
            GridPortError::Backend(err) => match err {
                BackendError::SheetNotFound { .. } => ErrorKind::NotFound,
                BackendError::Range { .. } => ErrorKind::Validation,
                _ => ErrorKind::Remote,
            },
        }
    }
}
