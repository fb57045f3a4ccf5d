//! Addressed writes: appends, row-addressed and key-addressed updates, and
//! literal block writes.
//!
//! All entry points share the same column-resolution rules (see
//! [`TableLayout::column_for`]) and the same dry-run contract: a dry run may
//! still read the grid to compute an accurate preview, but never issues the
//! mutating call.

use serde::Serialize;
use tracing::debug;

use gridport_core::{CellValue, RangeRef, column_letter, parse_range_start};

use crate::backend::{RangeWrite, ValueInput, ValueRender, ValuesBackend};
use crate::error::GridPortError;
use crate::layout::TableLayout;
use crate::runtime::GridPort;

/// Options shared by every write entry point.
#[derive(Debug, Clone, Copy, Default)]
pub struct WriteOptions {
    pub value_input: ValueInput,
    /// Compute and report the write without issuing it.
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppendResult {
    pub dry_run: bool,
    pub header_row: Option<u32>,
    pub headers: Vec<String>,
    /// Where the rows landed (or would land, under dry run).
    pub range: String,
    pub row_count: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateByRowResult {
    pub dry_run: bool,
    pub header_row: Option<u32>,
    pub headers: Vec<String>,
    pub row: u32,
    /// One single-cell range per resolved key.
    pub updated_ranges: Vec<String>,
    pub updated_cells: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateByKeyResult {
    pub dry_run: bool,
    pub header_row: Option<u32>,
    pub headers: Vec<String>,
    pub matched_rows: u32,
    pub updated_ranges: Vec<String>,
    pub updated_cells: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetRangeResult {
    pub dry_run: bool,
    pub range: String,
    pub updated_cells: u32,
}

impl<B: ValuesBackend> GridPort<B> {
    /// Append one row addressed by column.
    ///
    /// On an empty table this bootstraps it: a header row built from the
    /// input keys in insertion order, then the data row. This is the only
    /// path that creates headers. On an existing table a full-width row is
    /// built; keys that resolve to no column are skipped, and bare column
    /// letters beyond the table's right edge extend the written row.
    pub fn append(
        &mut self,
        sheet: &str,
        values: &[(String, CellValue)],
        opts: &WriteOptions,
    ) -> Result<AppendResult, GridPortError> {
        if values.is_empty() {
            return Err(GridPortError::NoInputValues);
        }
        let layout = self.resolve_layout(sheet, None)?;
        if layout.width == 0 {
            return self.append_bootstrap(sheet, values, opts);
        }

        let targets = resolve_targets(&layout, values)?;
        let mut width = layout.width;
        for (col, _) in &targets {
            width = width.max(col - layout.start_col + 1);
        }
        let mut row = vec![CellValue::Empty; width as usize];
        for (col, value) in targets {
            row[(col - layout.start_col) as usize] = value;
        }

        let origin = layout.origin_row();
        let anchor = RangeRef::rect(
            sheet,
            origin,
            layout.start_col,
            origin,
            layout.start_col + width - 1,
        );
        let header_row = layout.has_header.then_some(layout.header_row);
        if opts.dry_run {
            return Ok(AppendResult {
                dry_run: true,
                header_row,
                headers: layout.resolved_headers,
                range: anchor.to_string(),
                row_count: 1,
            });
        }
        let outcome = self
            .backend
            .append_values(&anchor, &[row], opts.value_input)?;
        debug!(sheet, range = %outcome.range, "appended row");
        Ok(AppendResult {
            dry_run: false,
            header_row,
            headers: layout.resolved_headers,
            range: outcome.range,
            row_count: outcome.row_count,
        })
    }

    fn append_bootstrap(
        &mut self,
        sheet: &str,
        values: &[(String, CellValue)],
        opts: &WriteOptions,
    ) -> Result<AppendResult, GridPortError> {
        let headers: Vec<String> = values.iter().map(|(k, _)| k.clone()).collect();
        let header_cells: Vec<CellValue> = headers.iter().map(|h| h.as_str().into()).collect();
        let data_cells: Vec<CellValue> = values.iter().map(|(_, v)| v.clone()).collect();

        let anchor = RangeRef::cell(sheet, 1, 1);
        if opts.dry_run {
            let width = headers.len() as u32;
            return Ok(AppendResult {
                dry_run: true,
                header_row: Some(1),
                headers,
                range: RangeRef::rect(sheet, 1, 1, 2, width).to_string(),
                row_count: 2,
            });
        }
        let outcome = self.backend.append_values(
            &anchor,
            &[header_cells, data_cells],
            opts.value_input,
        )?;
        let header_row = parse_range_start(&outcome.range)
            .map(|(row, _)| row)
            .unwrap_or(1);
        debug!(sheet, range = %outcome.range, "bootstrapped table");
        Ok(AppendResult {
            dry_run: false,
            header_row: Some(header_row),
            headers,
            range: outcome.range,
            row_count: outcome.row_count,
        })
    }

    /// Update cells in one row addressed by absolute grid row number.
    ///
    /// Keys that resolve to no column are skipped without error; callers who
    /// need to catch typos should dry-run first and inspect `updatedCells`.
    pub fn update_by_row(
        &mut self,
        sheet: &str,
        row: i64,
        set: &[(String, CellValue)],
        opts: &WriteOptions,
    ) -> Result<UpdateByRowResult, GridPortError> {
        if row < 1 || row > i64::from(u32::MAX) {
            return Err(GridPortError::InvalidRowNumber { row });
        }
        let row = row as u32;
        let layout = self.resolve_layout(sheet, None)?;
        let targets = resolve_targets(&layout, set)?;

        let writes: Vec<RangeWrite> = targets
            .into_iter()
            .map(|(col, value)| RangeWrite {
                range: RangeRef::cell(sheet, row, col),
                rows: vec![vec![value]],
            })
            .collect();
        let updated_ranges: Vec<String> = writes.iter().map(|w| w.range.to_string()).collect();
        let header_row = layout.has_header.then_some(layout.header_row);

        let updated_cells = if opts.dry_run || writes.is_empty() {
            writes.len() as u32
        } else {
            self.backend
                .batch_update_values(&writes, opts.value_input)?
                .updated_cells
        };
        if !opts.dry_run {
            debug!(sheet, row, updated_cells, "updated row");
        }
        Ok(UpdateByRowResult {
            dry_run: opts.dry_run,
            header_row,
            headers: layout.resolved_headers,
            row,
            updated_ranges,
            updated_cells,
        })
    }

    /// Update every row whose key-column value matches `key_value`.
    ///
    /// Matching compares trimmed display strings, case-sensitively. Zero
    /// matches succeed with `matchedRows = 0`. More than one match is
    /// rejected unless `allow_multi` is set, before any write is issued.
    pub fn update_by_key(
        &mut self,
        sheet: &str,
        key_col: &str,
        key_value: &str,
        set: &[(String, CellValue)],
        allow_multi: bool,
        opts: &WriteOptions,
    ) -> Result<UpdateByKeyResult, GridPortError> {
        let layout = self.resolve_layout(sheet, None)?;
        let key_column = layout
            .column_for(key_col)
            .ok_or_else(|| GridPortError::KeyColumnNotFound {
                column: key_col.to_string(),
            })?;

        let column = self.backend.get_values(
            &RangeRef::open_column(sheet, key_column, layout.data_start_row),
            ValueRender::Formatted,
        )?;
        let wanted = key_value.trim();
        let matched: Vec<u32> = column
            .iter()
            .enumerate()
            .filter(|(_, row)| {
                row.first()
                    .is_some_and(|cell| cell.to_string().trim() == wanted)
            })
            .map(|(offset, _)| layout.data_start_row + offset as u32)
            .collect();

        if matched.len() > 1 && !allow_multi {
            return Err(GridPortError::MultipleMatches {
                value: key_value.to_string(),
                count: matched.len(),
            });
        }

        let targets = resolve_targets(&layout, set)?;
        let mut writes = Vec::with_capacity(matched.len() * targets.len());
        for &row in &matched {
            for (col, value) in &targets {
                writes.push(RangeWrite {
                    range: RangeRef::cell(sheet, row, *col),
                    rows: vec![vec![value.clone()]],
                });
            }
        }
        let updated_ranges: Vec<String> = writes.iter().map(|w| w.range.to_string()).collect();

        let updated_cells = if opts.dry_run || writes.is_empty() {
            writes.len() as u32
        } else {
            self.backend
                .batch_update_values(&writes, opts.value_input)?
                .updated_cells
        };
        if !opts.dry_run {
            debug!(
                sheet,
                key = key_col,
                matched_rows = matched.len(),
                updated_cells,
                "updated rows by key"
            );
        }
        Ok(UpdateByKeyResult {
            dry_run: opts.dry_run,
            header_row: layout.has_header.then_some(layout.header_row),
            headers: layout.resolved_headers,
            matched_rows: matched.len() as u32,
            updated_ranges,
            updated_cells,
        })
    }

    /// Write a literal block to an explicit range, with no column resolution.
    pub fn set_range(
        &mut self,
        sheet: &str,
        range: &str,
        values: &[Vec<CellValue>],
        opts: &WriteOptions,
    ) -> Result<SetRangeResult, GridPortError> {
        let target = RangeRef::parse(range)
            .map_err(|source| GridPortError::InvalidRange {
                range: range.to_string(),
                source,
            })?
            .with_sheet(sheet);
        let cell_count: u32 = values.iter().map(|row| row.len() as u32).sum();
        if opts.dry_run {
            return Ok(SetRangeResult {
                dry_run: true,
                range: target.to_string(),
                updated_cells: cell_count,
            });
        }
        let outcome = self.backend.set_values(&target, values, opts.value_input)?;
        debug!(sheet, range = %outcome.range, cells = outcome.cell_count, "set range");
        Ok(SetRangeResult {
            dry_run: false,
            range: outcome.range,
            updated_cells: outcome.cell_count,
        })
    }
}

/// Resolve addressed input values to absolute columns, in input order.
///
/// Keys that resolve to nothing are dropped (the skip policy). Two keys
/// landing on the same column is a validation error rather than a silent
/// last-writer win. Bare letters left of the table's start column cannot be
/// part of the table and are dropped as unresolved.
fn resolve_targets(
    layout: &TableLayout,
    values: &[(String, CellValue)],
) -> Result<Vec<(u32, CellValue)>, GridPortError> {
    let mut targets: Vec<(u32, CellValue)> = Vec::with_capacity(values.len());
    let mut claimed: Vec<(u32, &str)> = Vec::with_capacity(values.len());
    for (key, value) in values {
        let Some(col) = layout.column_for(key) else {
            continue;
        };
        if col < layout.start_col {
            continue;
        }
        if let Some(&(_, first)) = claimed.iter().find(|(c, _)| *c == col) {
            return Err(GridPortError::ColumnCollision {
                first: first.to_string(),
                second: key.clone(),
                column: column_letter(col),
            });
        }
        claimed.push((col, key));
        targets.push((col, value.clone()));
    }
    Ok(targets)
}
