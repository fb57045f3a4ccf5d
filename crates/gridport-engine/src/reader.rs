//! Table reads: rows addressed by absolute grid row and keyed by resolved
//! header names.

use serde_json::{Map, Value as JsonValue};
use tracing::debug;

use gridport_core::{Bound, CellValue, RangeRef};

use crate::backend::{ValueRender, ValuesBackend};
use crate::error::GridPortError;
use crate::layout::TableLayout;
use crate::runtime::GridPort;

/// Options accepted by [`GridPort::read_table`].
#[derive(Debug, Clone, Default)]
pub struct ReadOptions {
    /// Stop after this many data rows.
    pub limit: Option<usize>,
    /// Read this range instead of the inferred data window. May be bare
    /// (`A2:C9`) or sheet-qualified; a bare range is qualified with the
    /// operation's sheet.
    pub range: Option<String>,
    /// Pin the header row instead of inferring it.
    pub header_row: Option<u32>,
    /// Return unformatted typed values instead of display strings.
    pub raw: bool,
}

/// One data row. `row` is the absolute 1-based grid row, which is also the
/// handle row-addressed updates take. Cells are positional under the slice's
/// headers; `None` marks a cell the grid did not report (short row).
#[derive(Debug, Clone, PartialEq)]
pub struct RowRecord {
    pub row: u32,
    pub cells: Vec<Option<CellValue>>,
}

/// The result of a table read.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSlice {
    /// Absolute header row, `None` for headerless tables.
    pub header_row: Option<u32>,
    pub headers: Vec<String>,
    pub rows: Vec<RowRecord>,
}

impl TableSlice {
    /// Render each row as a JSON object keyed by header name, with the grid
    /// row under `_row`. Key order follows the table's column order.
    pub fn records(&self) -> Vec<JsonValue> {
        self.rows
            .iter()
            .map(|record| {
                let mut map = Map::new();
                map.insert("_row".to_string(), JsonValue::from(record.row));
                for (header, cell) in self.headers.iter().zip(&record.cells) {
                    let value = match cell {
                        Some(v) => v.to_json(),
                        None => JsonValue::Null,
                    };
                    map.insert(header.clone(), value);
                }
                JsonValue::Object(map)
            })
            .collect()
    }

    /// The whole slice as one JSON document.
    pub fn to_json(&self) -> JsonValue {
        let mut map = Map::new();
        map.insert("headerRow".to_string(), JsonValue::from(self.header_row));
        map.insert(
            "headers".to_string(),
            JsonValue::from(self.headers.clone()),
        );
        map.insert("rows".to_string(), JsonValue::Array(self.records()));
        JsonValue::Object(map)
    }
}

impl<B: ValuesBackend> GridPort<B> {
    /// Read a sheet's table as addressed records.
    ///
    /// Every fetched row yields exactly one record, including rows that read
    /// as entirely blank; a blank row's cells are all `None`. Trailing blank
    /// rows never arrive from the backend, so only interior blanks appear.
    pub fn read_table(
        &self,
        sheet: &str,
        opts: &ReadOptions,
    ) -> Result<TableSlice, GridPortError> {
        let layout = self.resolve_layout(sheet, opts.header_row)?;
        if layout.width == 0 {
            return Ok(TableSlice {
                header_row: None,
                headers: Vec::new(),
                rows: Vec::new(),
            });
        }

        let render = if opts.raw {
            ValueRender::Unformatted
        } else {
            ValueRender::Formatted
        };
        let (range, base_row) = match opts.range.as_deref() {
            Some(descriptor) => {
                let parsed = RangeRef::parse(descriptor)
                    .map_err(|source| GridPortError::InvalidRange {
                        range: descriptor.to_string(),
                        source,
                    })?
                    .with_sheet(sheet);
                let base = parsed.start.row.unwrap_or(layout.data_start_row);
                (parsed, base)
            }
            None => (data_window(sheet, &layout), layout.data_start_row),
        };

        let fetched = self.backend.get_values(&range, render)?;
        let width = layout.width as usize;
        let mut rows = Vec::new();
        for (offset, line) in fetched.into_iter().enumerate() {
            if opts.limit.is_some_and(|limit| rows.len() >= limit) {
                break;
            }
            let mut cells: Vec<Option<CellValue>> = line.into_iter().map(Some).collect();
            cells.truncate(width);
            cells.resize(width, None);
            rows.push(RowRecord {
                row: base_row + offset as u32,
                cells,
            });
        }
        debug!(sheet, rows = rows.len(), "read table slice");

        Ok(TableSlice {
            header_row: layout.has_header.then_some(layout.header_row),
            headers: layout.resolved_headers,
            rows,
        })
    }
}

/// The inferred data window: from the first data row across the table's
/// columns, open to the bottom of the data.
fn data_window(sheet: &str, layout: &TableLayout) -> RangeRef {
    RangeRef {
        sheet: Some(sheet.to_string()),
        start: Bound::cell(layout.data_start_row, layout.start_col),
        end: Some(Bound {
            row: None,
            col: Some(layout.end_col()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryBackend;
    use serde_json::json;

    fn text_row(cells: &[&str]) -> Vec<CellValue> {
        cells.iter().map(|c| CellValue::from(*c)).collect()
    }

    fn sample_port() -> GridPort<MemoryBackend> {
        GridPort::new(MemoryBackend::new().with_sheet(
            "Tasks",
            vec![
                text_row(&["Name", "Status"]),
                text_row(&["Acme", "Active"]),
                text_row(&["Beta"]),
                Vec::new(),
                text_row(&["Gamma", "Closed"]),
            ],
        ))
    }

    #[test]
    fn reads_addressed_records() {
        let port = sample_port();
        let slice = port.read_table("Tasks", &ReadOptions::default()).unwrap();
        assert_eq!(slice.header_row, Some(1));
        assert_eq!(slice.headers, vec!["Name", "Status"]);
        assert_eq!(
            slice.records(),
            vec![
                json!({"_row": 2, "Name": "Acme", "Status": "Active"}),
                json!({"_row": 3, "Name": "Beta", "Status": null}),
                json!({"_row": 4, "Name": null, "Status": null}),
                json!({"_row": 5, "Name": "Gamma", "Status": "Closed"}),
            ]
        );
    }

    #[test]
    fn blank_interior_rows_emit_null_records() {
        let port = GridPort::new(MemoryBackend::new().with_sheet(
            "Tasks",
            vec![
                text_row(&["Name", "Status"]),
                text_row(&["Acme", "Active"]),
                Vec::new(),
                text_row(&["Gamma", "Closed"]),
            ],
        ));
        let slice = port.read_table("Tasks", &ReadOptions::default()).unwrap();
        // One record per fetched row: the blank row 3 is present, all null.
        assert_eq!(
            slice.rows.iter().map(|r| r.row).collect::<Vec<_>>(),
            vec![2, 3, 4]
        );
        assert_eq!(slice.rows[1].cells, vec![None, None]);
        assert_eq!(
            slice.records()[1],
            json!({"_row": 3, "Name": null, "Status": null})
        );
    }

    #[test]
    fn limit_caps_data_rows() {
        let port = sample_port();
        let opts = ReadOptions {
            limit: Some(1),
            ..ReadOptions::default()
        };
        let slice = port.read_table("Tasks", &opts).unwrap();
        assert_eq!(slice.rows.len(), 1);
        assert_eq!(slice.rows[0].row, 2);
    }

    #[test]
    fn explicit_range_keeps_absolute_rows() {
        let port = sample_port();
        let opts = ReadOptions {
            range: Some("A5:B5".to_string()),
            ..ReadOptions::default()
        };
        let slice = port.read_table("Tasks", &opts).unwrap();
        assert_eq!(slice.rows.len(), 1);
        assert_eq!(slice.rows[0].row, 5);
        assert_eq!(slice.records()[0]["Name"], json!("Gamma"));
    }

    #[test]
    fn headerless_table_uses_letter_headers() {
        let port = GridPort::new(MemoryBackend::new().with_sheet(
            "Log",
            vec![
                Vec::new(),
                vec![CellValue::Empty, "2025-01-01".into(), 42.0.into()],
            ],
        ));
        let slice = port.read_table("Log", &ReadOptions::default()).unwrap();
        assert_eq!(slice.header_row, None);
        assert_eq!(slice.headers, vec!["B", "C"]);
        assert_eq!(
            slice.records(),
            vec![json!({"_row": 2, "B": "2025-01-01", "C": 42})]
        );
    }

    #[test]
    fn empty_sheet_reads_empty_slice() {
        let port = GridPort::new(MemoryBackend::new().with_sheet("Blank", Vec::new()));
        let slice = port.read_table("Blank", &ReadOptions::default()).unwrap();
        assert!(slice.headers.is_empty());
        assert!(slice.rows.is_empty());
        assert_eq!(
            slice.to_json(),
            json!({"headerRow": null, "headers": [], "rows": []})
        );
    }
}
