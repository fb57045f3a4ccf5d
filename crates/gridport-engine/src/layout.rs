//! Table layout inference.
//!
//! A sheet has no declared schema, so every operation starts by answering
//! four questions from the grid itself: where does the table begin, how wide
//! is it, is the first row a header, and what is each column called. The
//! answers are recomputed per call and never cached.

use std::collections::HashSet;

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use gridport_core::{
    CellValue, RangeRef, column_letter, column_number, normalize_label, trim_trailing_blanks,
};

use crate::backend::{ValueRender, ValuesBackend};
use crate::error::GridPortError;
use crate::runtime::GridPort;

/// Escalating scan windows used to find the first non-empty row.
const SCAN_WINDOWS: [u32; 4] = [20, 50, 100, 200];

/// How many rows, starting at the candidate, inform width and the header
/// heuristic.
const SAMPLE_ROWS: usize = 4;

/// Header classification thresholds. Empirically chosen and tunable, not
/// invariants; tests pin the current behavior so a change here is loud.
pub const HEADER_MIN_UNIQUENESS: f64 = 0.8;
pub const HEADER_MIN_ALPHA_FRACTION: f64 = 0.5;
pub const HEADER_MAX_NUMERIC_FRACTION: f64 = 0.5;

/// The inferred shape of one logical table inside a grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableLayout {
    pub has_header: bool,
    /// Absolute 1-based header row; 0 when the table has no header.
    pub header_row: u32,
    /// First data row: `header_row + 1` with a header, else the row where
    /// non-empty data was first observed.
    pub data_start_row: u32,
    /// Leftmost table column, 1-based.
    pub start_col: u32,
    pub width: u32,
    /// Deduplicated display names, one per column, guaranteed distinct.
    pub resolved_headers: Vec<String>,
    /// Header cells as found in the grid; empty when `has_header` is false.
    pub raw_headers: Vec<String>,
}

impl TableLayout {
    /// Layout of a sheet with no usable table.
    pub fn empty() -> Self {
        TableLayout {
            has_header: false,
            header_row: 0,
            data_start_row: 1,
            start_col: 1,
            width: 0,
            resolved_headers: Vec::new(),
            raw_headers: Vec::new(),
        }
    }

    /// Rightmost table column, 1-based. Meaningless when `width` is 0.
    pub fn end_col(&self) -> u32 {
        self.start_col + self.width.saturating_sub(1)
    }

    /// The row an append call should be anchored at.
    pub fn origin_row(&self) -> u32 {
        if self.has_header {
            self.header_row
        } else {
            self.data_start_row
        }
    }

    /// Resolve a logical column reference to an absolute 1-based column.
    ///
    /// Precedence: resolved header name, then raw header label (both matched
    /// case/whitespace-insensitively), then a bare 1-3 letter column
    /// reference when the key names no header. Returns `None` when nothing
    /// matches; callers decide whether that is an error or a skip.
    pub fn column_for(&self, key: &str) -> Option<u32> {
        let norm = normalize_label(key);
        if norm.is_empty() {
            return None;
        }
        if let Some(i) = self
            .resolved_headers
            .iter()
            .position(|h| normalize_label(h) == norm)
        {
            return Some(self.start_col + i as u32);
        }
        if let Some(i) = self
            .raw_headers
            .iter()
            .position(|h| !h.trim().is_empty() && normalize_label(h) == norm)
        {
            return Some(self.start_col + i as u32);
        }
        column_number(key)
    }
}

impl<B: ValuesBackend> GridPort<B> {
    /// Infer the table layout for a sheet, optionally pinning the header row.
    pub fn resolve_layout(
        &self,
        sheet: &str,
        explicit_header_row: Option<u32>,
    ) -> Result<TableLayout, GridPortError> {
        let layout = match explicit_header_row {
            Some(row) => self.layout_from_explicit_row(sheet, row)?,
            None => self.layout_from_scan(sheet)?,
        };
        debug!(
            sheet,
            header_row = layout.header_row,
            data_start = layout.data_start_row,
            width = layout.width,
            "resolved table layout"
        );
        Ok(layout)
    }

    /// An explicit header row is taken as header unconditionally; the table
    /// is anchored at column A and its width is the trailing-trimmed cell
    /// count of that row.
    fn layout_from_explicit_row(
        &self,
        sheet: &str,
        row: u32,
    ) -> Result<TableLayout, GridPortError> {
        if row == 0 {
            return Err(GridPortError::InvalidRowNumber { row: 0 });
        }
        let fetched = self
            .backend
            .get_values(&RangeRef::rows(sheet, row, row), ValueRender::Formatted)?;
        let mut cells = fetched.into_iter().next().unwrap_or_default();
        trim_trailing_blanks(&mut cells);
        if cells.is_empty() {
            return Ok(TableLayout::empty());
        }
        let raw: Vec<String> = cells.iter().map(CellValue::to_string).collect();
        let width = raw.len() as u32;
        Ok(TableLayout {
            has_header: true,
            header_row: row,
            data_start_row: row + 1,
            start_col: 1,
            width,
            resolved_headers: resolve_headers(&raw, 1, width),
            raw_headers: raw,
        })
    }

    fn layout_from_scan(&self, sheet: &str) -> Result<TableLayout, GridPortError> {
        let mut found: Option<(Vec<Vec<CellValue>>, usize)> = None;
        for window in SCAN_WINDOWS {
            let rows = self
                .backend
                .get_values(&RangeRef::rows(sheet, 1, window), ValueRender::Formatted)?;
            if let Some(idx) = rows.iter().position(|r| r.iter().any(|c| !c.is_blank())) {
                found = Some((rows, idx));
                break;
            }
        }
        let Some((rows, idx)) = found else {
            return Ok(TableLayout::empty());
        };

        let sample: Vec<Vec<CellValue>> = rows[idx..]
            .iter()
            .take(SAMPLE_ROWS)
            .map(|r| {
                let mut row = r.clone();
                trim_trailing_blanks(&mut row);
                row
            })
            .collect();

        let mut first_col0: Option<usize> = None;
        let mut last_col0 = 0usize;
        for row in &sample {
            if let Some(first) = row.iter().position(|c| !c.is_blank()) {
                first_col0 = Some(first_col0.map_or(first, |f| f.min(first)));
            }
            last_col0 = last_col0.max(row.len());
        }
        // The candidate row is non-empty by construction.
        let start0 = first_col0.unwrap_or(0);
        let width = last_col0.saturating_sub(start0) as u32;
        let start_col = start0 as u32 + 1;
        let candidate_row = idx as u32 + 1;

        let candidate_values: Vec<String> = sample[0]
            .iter()
            .filter(|c| !c.is_blank())
            .map(CellValue::to_string)
            .collect();

        if classify_header(&candidate_values) {
            let raw: Vec<String> = (0..width as usize)
                .map(|i| {
                    sample[0]
                        .get(start0 + i)
                        .map(CellValue::to_string)
                        .unwrap_or_default()
                })
                .collect();
            Ok(TableLayout {
                has_header: true,
                header_row: candidate_row,
                data_start_row: candidate_row + 1,
                start_col,
                width,
                resolved_headers: resolve_headers(&raw, start_col, width),
                raw_headers: raw,
            })
        } else {
            Ok(TableLayout {
                has_header: false,
                header_row: 0,
                data_start_row: candidate_row,
                start_col,
                width,
                resolved_headers: resolve_headers(&[], start_col, width),
                raw_headers: Vec::new(),
            })
        }
    }
}

/// Build the deduplicated display names for a table.
///
/// A column's base name is its raw header cell, falling back to the column's
/// own letter when the cell is blank or there is no header row. Collisions
/// (after normalization) are resolved by appending `_2`, `_3`, and so on;
/// the first occurrence keeps the bare name.
fn resolve_headers(raw: &[String], start_col: u32, width: u32) -> Vec<String> {
    let mut used: HashSet<String> = HashSet::new();
    let mut resolved = Vec::with_capacity(width as usize);
    for i in 0..width {
        let base = raw
            .get(i as usize)
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| column_letter(start_col + i));
        let mut name = base.clone();
        let mut n = 2;
        while !used.insert(normalize_label(&name)) {
            name = format!("{base}_{n}");
            n += 1;
        }
        resolved.push(name);
    }
    resolved
}

static DATE_ISO: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").expect("date regex must compile"));
static DATE_SLASH: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{1,2}/\d{1,2}/\d{2,4}").expect("date regex must compile"));

fn looks_date(value: &str) -> bool {
    let value = value.trim();
    DATE_ISO.is_match(value) || DATE_SLASH.is_match(value)
}

fn looks_numeric(value: &str) -> bool {
    let value = value.trim();
    let value = value.strip_prefix('$').unwrap_or(value);
    let value = value.strip_suffix('%').unwrap_or(value);
    let value = value.replace(',', "");
    !value.is_empty() && value.parse::<f64>().is_ok()
}

fn has_alpha(value: &str) -> bool {
    value.chars().any(char::is_alphabetic)
}

/// Best-effort header classifier over the candidate row's non-empty values.
/// Heuristic, not semantic truth: a data row of unique, alphabetic strings
/// will classify as a header.
fn classify_header(values: &[String]) -> bool {
    match values.len() {
        0 => false,
        1 => {
            let v = &values[0];
            has_alpha(v) && !looks_numeric(v) && !looks_date(v)
        }
        n => {
            let count = n as f64;
            let distinct: HashSet<String> = values.iter().map(|v| normalize_label(v)).collect();
            let uniqueness = distinct.len() as f64 / count;
            let alpha = values.iter().filter(|v| has_alpha(v)).count() as f64 / count;
            let numeric_or_date = values
                .iter()
                .filter(|v| looks_numeric(v) || looks_date(v))
                .count() as f64
                / count;
            uniqueness >= HEADER_MIN_UNIQUENESS
                && alpha >= HEADER_MIN_ALPHA_FRACTION
                && numeric_or_date <= HEADER_MAX_NUMERIC_FRACTION
        }
    }
}
