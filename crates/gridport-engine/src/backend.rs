//! The remote grid seam.
//!
//! [`ValuesBackend`] is the full capability set the engine consumes: range
//! reads, row appends, multi-range updates, literal block writes, and tab
//! listing. The engine never talks to a service directly; anything that can
//! satisfy this trait (an HTTP client, the in-memory grid) can host a table.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use gridport_core::{CellValue, RangeRef};

/// Whether reads return formatted display strings or unformatted typed values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueRender {
    #[default]
    Formatted,
    Unformatted,
}

/// How written values are interpreted by the service: taken literally, or
/// parsed as if a user typed them into the grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValueInput {
    Raw,
    #[default]
    UserEntered,
}

/// One addressed block inside a multi-range update.
#[derive(Debug, Clone, PartialEq)]
pub struct RangeWrite {
    pub range: RangeRef,
    pub rows: Vec<Vec<CellValue>>,
}

/// What an append call reports back: where the rows landed and how many.
#[derive(Debug, Clone, PartialEq)]
pub struct AppendOutcome {
    pub range: String,
    pub row_count: u32,
}

/// What a multi-range update reports back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub updated_cells: u32,
}

/// What a literal block write reports back.
#[derive(Debug, Clone, PartialEq)]
pub struct SetOutcome {
    pub range: String,
    pub cell_count: u32,
}

/// One tab of the spreadsheet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SheetTab {
    pub name: String,
    pub id: i64,
    pub index: u32,
}

/// Failures raised by a backend. The engine propagates these unmodified:
/// no retries, no rollback of writes already issued.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("sheet `{name}` not found")]
    SheetNotFound { name: String },

    #[error("backend rejected range `{range}`: {reason}")]
    Range { range: String, reason: String },

    #[error("{message}")]
    Remote {
        status: Option<u16>,
        message: String,
    },

    #[error("transport error: {0}")]
    Transport(String),
}

/// Row-oriented access to one remote spreadsheet.
///
/// All ranges are sheet-qualified [`RangeRef`]s. Implementations must mirror
/// the values-API trimming convention on reads: trailing blank cells are
/// dropped from each row and trailing blank rows from the result, so callers
/// can treat row length as data width.
pub trait ValuesBackend {
    fn get_values(
        &self,
        range: &RangeRef,
        render: ValueRender,
    ) -> Result<Vec<Vec<CellValue>>, BackendError>;

    fn append_values(
        &mut self,
        range: &RangeRef,
        rows: &[Vec<CellValue>],
        input: ValueInput,
    ) -> Result<AppendOutcome, BackendError>;

    fn batch_update_values(
        &mut self,
        writes: &[RangeWrite],
        input: ValueInput,
    ) -> Result<UpdateOutcome, BackendError>;

    fn set_values(
        &mut self,
        range: &RangeRef,
        rows: &[Vec<CellValue>],
        input: ValueInput,
    ) -> Result<SetOutcome, BackendError>;

    fn list_sheet_tabs(&self) -> Result<Vec<SheetTab>, BackendError>;
}
