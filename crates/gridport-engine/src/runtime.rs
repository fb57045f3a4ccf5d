use crate::backend::{SheetTab, ValuesBackend};
use crate::error::GridPortError;

/// Runtime container that pairs one spreadsheet's backend with the engine.
///
/// Every operation is stateless with respect to the container: layouts are
/// recomputed per call, and nothing is cached between invocations.
pub struct GridPort<B: ValuesBackend> {
    pub(crate) backend: B,
}

impl<B: ValuesBackend> GridPort<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    /// Immutable access to the underlying backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Mutable access to the underlying backend.
    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    /// Recover the backend.
    pub fn into_inner(self) -> B {
        self.backend
    }

    /// List the spreadsheet's tabs in grid order.
    pub fn list_tabs(&self) -> Result<Vec<SheetTab>, GridPortError> {
        Ok(self.backend.list_sheet_tabs()?)
    }
}
