//! Grid addressing: 1-based column letters and sheet-qualified A1 ranges.
//!
//! Ranges follow the values-API notation `'Sheet'!A1:C9`. Both bounds of a
//! range may be partial: `'Sheet'!B2:B` reads a column to the bottom of the
//! data, `'Sheet'!1:20` reads a block of whole rows. Quote characters inside
//! sheet names are escaped by doubling.

use std::error::Error;
use std::fmt;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Render a 1-based column number as its letter form (1 = "A", 27 = "AA").
pub fn column_letter(col: u32) -> String {
    debug_assert!(col >= 1, "column numbers are 1-based");
    let mut col = col;
    let mut letters = String::new();
    while col > 0 {
        let rem = ((col - 1) % 26) as u8;
        letters.insert(0, (b'A' + rem) as char);
        col = (col - 1) / 26;
    }
    letters
}

/// Parse a 1-3 letter column reference back to its 1-based number.
///
/// Returns `None` for anything that is not purely ASCII letters, so callers
/// can use it as an "is this a bare column letter?" test.
pub fn column_number(letters: &str) -> Option<u32> {
    if letters.is_empty() || letters.len() > 3 {
        return None;
    }
    let mut col: u32 = 0;
    for c in letters.chars() {
        if !c.is_ascii_alphabetic() {
            return None;
        }
        col = col * 26 + (c.to_ascii_uppercase() as u32 - 'A' as u32 + 1);
    }
    Some(col)
}

/// Whether a user-supplied key has the shape of a bare column letter.
pub fn is_column_letters(s: &str) -> bool {
    column_number(s).is_some()
}

/// Quote a sheet name for use in a range, doubling embedded quotes.
pub fn quote_sheet(name: &str) -> String {
    format!("'{}'", name.replace('\'', "''"))
}

/// Errors produced while parsing range descriptors.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum AddrError {
    /// The range string was empty.
    EmptyRange,
    /// A quoted sheet name was never closed.
    UnterminatedQuote(String),
    /// A range endpoint was not letters-then-digits.
    BadEndpoint(String),
}

impl fmt::Display for AddrError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddrError::EmptyRange => write!(f, "range is empty"),
            AddrError::UnterminatedQuote(range) => {
                write!(f, "unterminated quoted sheet name in `{range}`")
            }
            AddrError::BadEndpoint(part) => write!(f, "`{part}` is not a valid range endpoint"),
        }
    }
}

impl Error for AddrError {}

/// One endpoint of a range; either half may be open.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub struct Bound {
    pub row: Option<u32>,
    pub col: Option<u32>,
}

impl Bound {
    pub const fn cell(row: u32, col: u32) -> Self {
        Bound {
            row: Some(row),
            col: Some(col),
        }
    }
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(col) = self.col {
            f.write_str(&column_letter(col))?;
        }
        if let Some(row) = self.row {
            write!(f, "{row}")?;
        }
        Ok(())
    }
}

/// A possibly sheet-qualified, possibly open-ended A1 range.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct RangeRef {
    pub sheet: Option<String>,
    pub start: Bound,
    pub end: Option<Bound>,
}

impl RangeRef {
    /// Single cell, e.g. `'Data'!B3`.
    pub fn cell(sheet: impl Into<String>, row: u32, col: u32) -> Self {
        RangeRef {
            sheet: Some(sheet.into()),
            start: Bound::cell(row, col),
            end: None,
        }
    }

    /// Closed rectangle, e.g. `'Data'!B3:D7`.
    pub fn rect(sheet: impl Into<String>, start_row: u32, start_col: u32, end_row: u32, end_col: u32) -> Self {
        RangeRef {
            sheet: Some(sheet.into()),
            start: Bound::cell(start_row, start_col),
            end: Some(Bound::cell(end_row, end_col)),
        }
    }

    /// Whole-row window, e.g. `'Data'!1:20`.
    pub fn rows(sheet: impl Into<String>, start_row: u32, end_row: u32) -> Self {
        RangeRef {
            sheet: Some(sheet.into()),
            start: Bound {
                row: Some(start_row),
                col: None,
            },
            end: Some(Bound {
                row: Some(end_row),
                col: None,
            }),
        }
    }

    /// Column read open to the bottom of the data, e.g. `'Data'!B2:B`.
    pub fn open_column(sheet: impl Into<String>, col: u32, start_row: u32) -> Self {
        RangeRef {
            sheet: Some(sheet.into()),
            start: Bound::cell(start_row, col),
            end: Some(Bound {
                row: None,
                col: Some(col),
            }),
        }
    }

    /// Parse a range descriptor such as `'My Sheet'!A2:C9` or `B2:B`.
    pub fn parse(range: &str) -> Result<Self, AddrError> {
        let range = range.trim();
        if range.is_empty() {
            return Err(AddrError::EmptyRange);
        }
        let (sheet, rest) = split_sheet(range)?;
        let rest = rest.trim();
        if rest.is_empty() {
            return Err(AddrError::BadEndpoint(range.to_string()));
        }
        let (start_str, end_str) = match rest.split_once(':') {
            Some((a, b)) => (a, Some(b)),
            None => (rest, None),
        };
        let start = parse_bound(start_str)?;
        let end = end_str.map(parse_bound).transpose()?;
        Ok(RangeRef { sheet, start, end })
    }

    /// Qualify an unqualified range with a sheet name; already-qualified
    /// ranges are left untouched.
    pub fn with_sheet(mut self, sheet: &str) -> Self {
        if self.sheet.is_none() {
            self.sheet = Some(sheet.to_string());
        }
        self
    }

    /// Starting grid coordinate, defaulting open halves to 1.
    pub fn start_cell(&self) -> (u32, u32) {
        (self.start.row.unwrap_or(1), self.start.col.unwrap_or(1))
    }
}

impl fmt::Display for RangeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(sheet) = &self.sheet {
            write!(f, "{}!", quote_sheet(sheet))?;
        }
        write!(f, "{}", self.start)?;
        if let Some(end) = &self.end {
            write!(f, ":{end}")?;
        }
        Ok(())
    }
}

/// Parse the starting coordinate out of a returned range descriptor.
///
/// Backends report where an append landed as a range string; this pulls the
/// 1-based (row, column) origin back out of it.
pub fn parse_range_start(range: &str) -> Result<(u32, u32), AddrError> {
    Ok(RangeRef::parse(range)?.start_cell())
}

fn split_sheet(range: &str) -> Result<(Option<String>, &str), AddrError> {
    if let Some(rest) = range.strip_prefix('\'') {
        // Quoted sheet name; embedded quotes are doubled.
        let mut name = String::new();
        let mut chars = rest.char_indices().peekable();
        while let Some((i, c)) = chars.next() {
            if c != '\'' {
                name.push(c);
                continue;
            }
            if let Some(&(_, '\'')) = chars.peek() {
                chars.next();
                name.push('\'');
                continue;
            }
            let after = &rest[i + 1..];
            let after = after
                .strip_prefix('!')
                .ok_or_else(|| AddrError::BadEndpoint(range.to_string()))?;
            return Ok((Some(name), after));
        }
        Err(AddrError::UnterminatedQuote(range.to_string()))
    } else if let Some((sheet, rest)) = range.split_once('!') {
        Ok((Some(sheet.to_string()), rest))
    } else {
        Ok((None, range))
    }
}

fn parse_bound(part: &str) -> Result<Bound, AddrError> {
    let part = part.trim();
    let digits_at = part
        .find(|c: char| c.is_ascii_digit())
        .unwrap_or(part.len());
    let (letters, digits) = part.split_at(digits_at);
    if letters.is_empty() && digits.is_empty() {
        return Err(AddrError::BadEndpoint(part.to_string()));
    }
    let col = if letters.is_empty() {
        None
    } else {
        Some(column_number(letters).ok_or_else(|| AddrError::BadEndpoint(part.to_string()))?)
    };
    let row = if digits.is_empty() {
        None
    } else {
        let row: u32 = digits
            .parse()
            .map_err(|_| AddrError::BadEndpoint(part.to_string()))?;
        if row == 0 {
            return Err(AddrError::BadEndpoint(part.to_string()));
        }
        Some(row)
    };
    Ok(Bound { row, col })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn column_letter_roundtrip() {
        for col in [1, 2, 25, 26, 27, 52, 53, 701, 702, 703, 18278] {
            assert_eq!(column_number(&column_letter(col)), Some(col));
        }
        assert_eq!(column_letter(1), "A");
        assert_eq!(column_letter(26), "Z");
        assert_eq!(column_letter(27), "AA");
        assert_eq!(column_letter(702), "ZZ");
        assert_eq!(column_letter(703), "AAA");
    }

    #[test]
    fn column_number_rejects_non_letters() {
        assert_eq!(column_number(""), None);
        assert_eq!(column_number("A1"), None);
        assert_eq!(column_number("ABCD"), None);
        assert_eq!(column_number("Ä"), None);
        assert_eq!(column_number("aa"), Some(27), "case-insensitive");
    }

    #[test]
    fn quote_sheet_doubles_quotes() {
        assert_eq!(quote_sheet("Data"), "'Data'");
        assert_eq!(quote_sheet("Bob's Sheet"), "'Bob''s Sheet'");
    }

    #[test]
    fn range_display_forms() {
        assert_eq!(RangeRef::cell("Data", 3, 2).to_string(), "'Data'!B3");
        assert_eq!(RangeRef::rect("Data", 1, 1, 9, 3).to_string(), "'Data'!A1:C9");
        assert_eq!(RangeRef::rows("Data", 1, 20).to_string(), "'Data'!1:20");
        assert_eq!(RangeRef::open_column("Data", 2, 4).to_string(), "'Data'!B4:B");
    }

    #[test]
    fn parse_qualified_rect() {
        let range = RangeRef::parse("'My Sheet'!A2:C9").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("My Sheet"));
        assert_eq!(range.start, Bound::cell(2, 1));
        assert_eq!(range.end, Some(Bound::cell(9, 3)));
    }

    #[test]
    fn parse_unquoted_sheet_and_bare_range() {
        let range = RangeRef::parse("Data!B3").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Data"));
        assert_eq!(range.start, Bound::cell(3, 2));
        assert_eq!(range.end, None);

        let bare = RangeRef::parse("B3:D7").unwrap();
        assert_eq!(bare.sheet, None);
        assert_eq!(bare.with_sheet("Data").to_string(), "'Data'!B3:D7");
    }

    #[test]
    fn parse_open_ended_ranges() {
        let rows = RangeRef::parse("'Data'!1:20").unwrap();
        assert_eq!(rows.start, Bound { row: Some(1), col: None });
        assert_eq!(rows.end, Some(Bound { row: Some(20), col: None }));

        let col = RangeRef::parse("'Data'!B2:B").unwrap();
        assert_eq!(col.start, Bound::cell(2, 2));
        assert_eq!(col.end, Some(Bound { row: None, col: Some(2) }));
    }

    #[test]
    fn parse_doubled_quote_sheet() {
        let range = RangeRef::parse("'Bob''s Sheet'!A1").unwrap();
        assert_eq!(range.sheet.as_deref(), Some("Bob's Sheet"));
        assert_eq!(range.to_string(), "'Bob''s Sheet'!A1");
    }

    #[test]
    fn parse_rejects_garbage() {
        assert_eq!(RangeRef::parse(""), Err(AddrError::EmptyRange));
        assert!(matches!(RangeRef::parse("'Data!A1"), Err(AddrError::UnterminatedQuote(_))));
        assert!(matches!(RangeRef::parse("Data!A0"), Err(AddrError::BadEndpoint(_))));
        assert!(matches!(RangeRef::parse("Data!$%"), Err(AddrError::BadEndpoint(_))));
    }

    #[test]
    fn start_coordinate_of_returned_descriptor() {
        assert_eq!(parse_range_start("'Data'!B3:D7").unwrap(), (3, 2));
        assert_eq!(parse_range_start("Data!A5").unwrap(), (5, 1));
        assert_eq!(parse_range_start("'Data'!B2:B").unwrap(), (2, 2));
    }
}
