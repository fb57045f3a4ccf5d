//! GridPort engine.
//!
//! This crate links a logical table, discovered inside an otherwise
//! unstructured 2-D grid, to a concrete [`ValuesBackend`]. It infers where
//! the table begins, whether its first row is a header, and a stable
//! collision-free column naming, then resolves logical column references
//! (header names or bare column letters) to grid coordinates for key-based
//! and index-based updates.

mod backend;
mod batch;
mod error;
mod layout;
mod memory;
mod reader;
mod runtime;
mod writer;

pub use backend::{
    AppendOutcome, BackendError, RangeWrite, SetOutcome, SheetTab, UpdateOutcome, ValueInput,
    ValueRender, ValuesBackend,
};
pub use batch::{BatchOp, BatchOutcome};
pub use error::{ErrorKind, GridPortError};
pub use layout::{
    HEADER_MAX_NUMERIC_FRACTION, HEADER_MIN_ALPHA_FRACTION, HEADER_MIN_UNIQUENESS, TableLayout,
};
pub use memory::MemoryBackend;
pub use reader::{ReadOptions, RowRecord, TableSlice};
pub use runtime::GridPort;
pub use writer::{
    AppendResult, SetRangeResult, UpdateByKeyResult, UpdateByRowResult, WriteOptions,
};

// Re-export for convenience
pub use gridport_core::{CellValue, RangeRef};
