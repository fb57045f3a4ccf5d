//! In-memory values backend.
//!
//! Implements the full [`ValuesBackend`] capability set over a plain grid of
//! rows, mirroring the remote service's read conventions (trailing blank
//! cells and rows are dropped, appends land after the last non-blank row).
//! Tests run against this; embedders can too.

use gridport_core::{CellValue, RangeRef, trim_trailing_blanks};

use crate::backend::{
    AppendOutcome, BackendError, RangeWrite, SetOutcome, SheetTab, UpdateOutcome, ValueInput,
    ValueRender, ValuesBackend,
};

#[derive(Debug, Default)]
pub struct MemoryBackend {
    sheets: Vec<MemorySheet>,
    next_id: i64,
}

#[derive(Debug)]
struct MemorySheet {
    name: String,
    id: i64,
    rows: Vec<Vec<CellValue>>,
}

struct Bounds {
    sheet: usize,
    start_row: u32,
    start_col: u32,
    /// `None` halves are open: read to the end of the data.
    end_row: Option<u32>,
    end_col: Option<u32>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an empty tab.
    pub fn add_sheet(&mut self, name: impl Into<String>) {
        let id = self.next_id;
        self.next_id += 1;
        self.sheets.push(MemorySheet {
            name: name.into(),
            id,
            rows: Vec::new(),
        });
    }

    /// Builder form used heavily by tests.
    pub fn with_sheet(mut self, name: impl Into<String>, rows: Vec<Vec<CellValue>>) -> Self {
        let id = self.next_id;
        self.next_id += 1;
        self.sheets.push(MemorySheet {
            name: name.into(),
            id,
            rows,
        });
        self
    }

    /// Raw row storage for a tab, for assertions.
    pub fn sheet_rows(&self, name: &str) -> Option<&Vec<Vec<CellValue>>> {
        self.sheets.iter().find(|s| s.name == name).map(|s| &s.rows)
    }

    /// One cell, 1-based; `None` when the cell lies outside the data.
    pub fn value_at(&self, name: &str, row: u32, col: u32) -> Option<&CellValue> {
        self.sheet_rows(name)?
            .get(row as usize - 1)?
            .get(col as usize - 1)
    }

    fn resolve(&self, range: &RangeRef) -> Result<Bounds, BackendError> {
        let name = range.sheet.as_deref().ok_or_else(|| BackendError::Range {
            range: range.to_string(),
            reason: "range is not sheet-qualified".to_string(),
        })?;
        let sheet = self
            .sheets
            .iter()
            .position(|s| s.name == name)
            .ok_or_else(|| BackendError::SheetNotFound {
                name: name.to_string(),
            })?;
        let (start_row, start_col) = range.start_cell();
        let (end_row, end_col) = match &range.end {
            Some(end) => (end.row, end.col),
            None => (Some(start_row), Some(start_col)),
        };
        Ok(Bounds {
            sheet,
            start_row,
            start_col,
            end_row,
            end_col,
        })
    }
}

fn set_cell(rows: &mut Vec<Vec<CellValue>>, row: u32, col: u32, value: CellValue) {
    let r = row as usize - 1;
    let c = col as usize - 1;
    if rows.len() <= r {
        rows.resize_with(r + 1, Vec::new);
    }
    let line = &mut rows[r];
    if line.len() <= c {
        line.resize(c + 1, CellValue::Empty);
    }
    line[c] = value;
}

fn last_nonblank_row(rows: &[Vec<CellValue>]) -> Option<u32> {
    rows.iter()
        .rposition(|r| r.iter().any(|c| !c.is_blank()))
        .map(|i| i as u32 + 1)
}

impl ValuesBackend for MemoryBackend {
    fn get_values(
        &self,
        range: &RangeRef,
        _render: ValueRender,
    ) -> Result<Vec<Vec<CellValue>>, BackendError> {
        let b = self.resolve(range)?;
        let rows = &self.sheets[b.sheet].rows;
        let last_row = rows.len() as u32;
        let end_row = b.end_row.unwrap_or(last_row).min(last_row);

        let mut out: Vec<Vec<CellValue>> = Vec::new();
        for row_no in b.start_row..=end_row {
            let line = &rows[row_no as usize - 1];
            let from = (b.start_col as usize - 1).min(line.len());
            let to = match b.end_col {
                Some(c) => (c as usize).min(line.len()),
                None => line.len(),
            };
            let mut cells: Vec<CellValue> = line[from..to.max(from)].to_vec();
            trim_trailing_blanks(&mut cells);
            out.push(cells);
        }
        while out.last().is_some_and(Vec::is_empty) {
            out.pop();
        }
        Ok(out)
    }

    fn append_values(
        &mut self,
        range: &RangeRef,
        rows: &[Vec<CellValue>],
        _input: ValueInput,
    ) -> Result<AppendOutcome, BackendError> {
        let b = self.resolve(range)?;
        let sheet_name = self.sheets[b.sheet].name.clone();
        let grid = &mut self.sheets[b.sheet].rows;
        let first_free = last_nonblank_row(grid).map_or(b.start_row, |last| last + 1);

        let mut width = 1u32;
        for (i, row) in rows.iter().enumerate() {
            width = width.max(row.len() as u32);
            for (j, value) in row.iter().enumerate() {
                set_cell(grid, first_free + i as u32, b.start_col + j as u32, value.clone());
            }
        }
        let row_count = rows.len() as u32;
        let end_row = first_free + row_count.saturating_sub(1);
        let written = RangeRef::rect(
            sheet_name,
            first_free,
            b.start_col,
            end_row,
            b.start_col + width - 1,
        );
        Ok(AppendOutcome {
            range: written.to_string(),
            row_count,
        })
    }

    fn batch_update_values(
        &mut self,
        writes: &[RangeWrite],
        _input: ValueInput,
    ) -> Result<UpdateOutcome, BackendError> {
        let mut updated_cells = 0u32;
        for write in writes {
            let b = self.resolve(&write.range)?;
            let grid = &mut self.sheets[b.sheet].rows;
            for (i, row) in write.rows.iter().enumerate() {
                for (j, value) in row.iter().enumerate() {
                    set_cell(grid, b.start_row + i as u32, b.start_col + j as u32, value.clone());
                    updated_cells += 1;
                }
            }
        }
        Ok(UpdateOutcome { updated_cells })
    }

    fn set_values(
        &mut self,
        range: &RangeRef,
        rows: &[Vec<CellValue>],
        _input: ValueInput,
    ) -> Result<SetOutcome, BackendError> {
        let b = self.resolve(range)?;
        let grid = &mut self.sheets[b.sheet].rows;
        let mut cell_count = 0u32;
        for (i, row) in rows.iter().enumerate() {
            for (j, value) in row.iter().enumerate() {
                set_cell(grid, b.start_row + i as u32, b.start_col + j as u32, value.clone());
                cell_count += 1;
            }
        }
        Ok(SetOutcome {
            range: range.to_string(),
            cell_count,
        })
    }

    fn list_sheet_tabs(&self) -> Result<Vec<SheetTab>, BackendError> {
        Ok(self
            .sheets
            .iter()
            .enumerate()
            .map(|(index, sheet)| SheetTab {
                name: sheet.name.clone(),
                id: sheet.id,
                index: index as u32,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    #[test]
    fn reads_trim_trailing_blanks() {
        let backend = MemoryBackend::new().with_sheet(
            "Data",
            vec![
                text_row(&["a", "b", ""]),
                Vec::new(),
                text_row(&["c"]),
                Vec::new(),
            ],
        );
        let rows = backend
            .get_values(&RangeRef::rows("Data", 1, 20), ValueRender::Formatted)
            .unwrap();
        assert_eq!(rows, vec![text_row(&["a", "b"]), Vec::new(), text_row(&["c"])]);
    }

    #[test]
    fn read_window_respects_columns() {
        let backend =
            MemoryBackend::new().with_sheet("Data", vec![text_row(&["a", "b", "c", "d"])]);
        let rows = backend
            .get_values(&RangeRef::rect("Data", 1, 2, 1, 3), ValueRender::Formatted)
            .unwrap();
        assert_eq!(rows, vec![text_row(&["b", "c"])]);
    }

    #[test]
    fn append_lands_after_last_data() {
        let mut backend = MemoryBackend::new().with_sheet(
            "Data",
            vec![text_row(&["h1", "h2"]), text_row(&["x", "y"])],
        );
        let outcome = backend
            .append_values(
                &RangeRef::cell("Data", 1, 1),
                &[text_row(&["p", "q"])],
                ValueInput::UserEntered,
            )
            .unwrap();
        assert_eq!(outcome.range, "'Data'!A3:B3");
        assert_eq!(outcome.row_count, 1);
        assert_eq!(backend.value_at("Data", 3, 1), Some(&CellValue::from("p")));
    }

    #[test]
    fn append_to_empty_sheet_starts_at_range() {
        let mut backend = MemoryBackend::new().with_sheet("Data", Vec::new());
        let outcome = backend
            .append_values(
                &RangeRef::cell("Data", 1, 1),
                &[text_row(&["Name"]), text_row(&["Acme"])],
                ValueInput::UserEntered,
            )
            .unwrap();
        assert_eq!(outcome.range, "'Data'!A1:A2");
        assert_eq!(outcome.row_count, 2);
    }

    #[test]
    fn unknown_sheet_is_not_found() {
        let backend = MemoryBackend::new();
        let err = backend
            .get_values(&RangeRef::rows("Nope", 1, 20), ValueRender::Formatted)
            .unwrap_err();
        assert!(matches!(err, BackendError::SheetNotFound { name } if name == "Nope"));
    }
}
