//! Reading the rows of an uploaded workbook.
//!
//! Only literal cell values are read: formulas are not evaluated and no value is coerced beyond
//! what the file format stores. `.xlsx`, `.xls`, `.xlsb` and `.ods` are detected from the bytes.

use std::io::{Cursor, Read, Seek};

use bytes::Bytes;
use calamine::{Data, Range, Reader, Sheets, open_workbook_auto_from_rs};
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, instrument};

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("The uploaded file is not a readable workbook")]
    InvalidWorkbook(#[source] calamine::Error),

    #[error("Worksheet not found")]
    WorksheetNotFound,

    #[error("Worksheet '{name}' could not be read")]
    Worksheet {
        name: String,
        #[source]
        source: calamine::Error,
    },

    #[error("Spreadsheet parsing was interrupted")]
    Interrupted(#[from] tokio::task::JoinError),
}

/// A literal cell value. Serializes as the bare JSON value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CellValue {
    Empty,
    String(String),
    Int(i64),
    Float(f64),
    Bool(bool),
    /// Excel serial date number
    DateTime(f64),
    /// Error value displayed by the cell, such as `#DIV/0!`
    Error(String),
}

impl From<&Data> for CellValue {
    fn from(data: &Data) -> Self {
        match data {
            Data::Empty => CellValue::Empty,
            Data::String(s) => CellValue::String(s.clone()),
            Data::Int(i) => CellValue::Int(*i),
            Data::Float(f) => CellValue::Float(*f),
            Data::Bool(b) => CellValue::Bool(*b),
            Data::DateTime(dt) => CellValue::DateTime(dt.as_f64()),
            // ODS stores dates and durations as ISO 8601 text
            Data::DateTimeIso(s) | Data::DurationIso(s) => CellValue::String(s.clone()),
            Data::Error(e) => CellValue::Error(e.to_string()),
        }
    }
}

/// Row-major cell values of one worksheet, anchored at A1: `rows[r][c]` is the cell at row `r`,
/// column `c` (both zero-based), with leading blank rows and columns kept as [`CellValue::Empty`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SheetRows {
    pub sheet_name: String,
    pub rows: Vec<Vec<CellValue>>,
}

impl SheetRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// The worksheet an upload is read from: always the first one by position, whatever its name.
pub fn select_worksheet<RS: Read + Seek>(workbook: &mut Sheets<RS>) -> Result<(String, Range<Data>), ParseError> {
    let name = workbook.sheet_names().into_iter().next().ok_or(ParseError::WorksheetNotFound)?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::WorksheetNotFound)?
        .map_err(|source| ParseError::Worksheet { name: name.clone(), source })?;

    Ok((name, range))
}

/// Parse a workbook held in memory and collect the rows of its first worksheet.
pub fn read_first_worksheet(bytes: &[u8]) -> Result<SheetRows, ParseError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(bytes)).map_err(ParseError::InvalidWorkbook)?;

    let (sheet_name, range) = select_worksheet(&mut workbook)?;
    Ok(SheetRows {
        sheet_name,
        rows: anchored_rows(&range),
    })
}

/// A `Range` begins at its first used cell; pad it back out so positions match the worksheet.
fn anchored_rows(range: &Range<Data>) -> Vec<Vec<CellValue>> {
    let Some((first_row, first_col)) = range.start() else {
        return Vec::new();
    };
    let (first_row, first_col) = (first_row as usize, first_col as usize);
    let width = first_col + range.width();

    std::iter::repeat_n(vec![CellValue::Empty; width], first_row)
        .chain(range.rows().map(|row| {
            std::iter::repeat_n(CellValue::Empty, first_col)
                .chain(row.iter().map(CellValue::from))
                .collect()
        }))
        .collect()
}

/// Run [`read_first_worksheet`] on the blocking thread pool.
#[instrument(skip(bytes), fields(bytes = bytes.len()), err)]
pub async fn parse(bytes: Bytes) -> Result<SheetRows, ParseError> {
    let sheet = tokio::task::spawn_blocking(move || read_first_worksheet(&bytes)).await??;
    debug!(sheet = %sheet.sheet_name, rows = sheet.len(), "Read first worksheet");
    Ok(sheet)
}
