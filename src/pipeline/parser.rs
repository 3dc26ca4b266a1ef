//! Tabular parser - raw file bytes to header-keyed rows
//!
//! CSV parsing delegates to the `csv` crate (quoting, trimming);
//! workbooks go through `calamine`. Either way the output is the same:
//! a header list plus ordered rows, with rows whose field count does
//! not match the header surfaced as defects rather than dropped.

use calamine::{Data, Reader};
use csv::ReaderBuilder;
use std::io::Cursor;
use std::path::Path;

use crate::pipeline::error::{ErrorKind, ParseError, RowError};

/// Input format, declared by the caller or detected from the extension
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileFormat {
    Csv { delimiter: u8 },
    Spreadsheet,
}

impl FileFormat {
    /// Detect the format from a file extension
    pub fn from_path(path: &Path, delimiter: u8) -> Result<Self, ParseError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default()
            .to_lowercase();
        match extension.as_str() {
            "csv" => Ok(FileFormat::Csv { delimiter }),
            "xlsx" | "xlsm" | "xls" | "ods" => Ok(FileFormat::Spreadsheet),
            _ => Err(ParseError::UnsupportedFormat { extension }),
        }
    }
}

/// One parsed but unvalidated row
///
/// `number` is the 1-based position in the file, header row = 1.
#[derive(Debug, Clone, PartialEq)]
pub struct RawRow {
    pub number: usize,
    pub values: Vec<String>,
}

/// Parser output: headers, rows, and row-level defects
#[derive(Debug, Clone)]
pub struct ParsedTable {
    pub headers: Vec<String>,
    pub rows: Vec<RawRow>,

    /// Rows excluded before validation (column count mismatch, bad
    /// quoting), surfaced as errors rather than silently dropped
    pub defects: Vec<RowError>,
}

/// Parse raw file content into a table
pub fn parse(bytes: &[u8], format: FileFormat) -> Result<ParsedTable, ParseError> {
    match format {
        FileFormat::Csv { delimiter } => parse_csv(bytes, delimiter),
        FileFormat::Spreadsheet => parse_workbook(bytes),
    }
}

fn parse_csv(bytes: &[u8], delimiter: u8) -> Result<ParsedTable, ParseError> {
    let text = String::from_utf8_lossy(bytes);
    let text = text.trim_start_matches('\u{feff}').trim_start();
    if text.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .delimiter(delimiter)
        .from_reader(text.as_bytes());

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(ParseError::NoHeader);
    }

    let mut rows = Vec::new();
    let mut defects = Vec::new();

    for (index, result) in reader.records().enumerate() {
        // Physical line number when available, else sequential
        let fallback = index + 2;
        match result {
            Err(error) => {
                let number = error
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback);
                defects.push(RowError::general(
                    number,
                    ErrorKind::ParseError,
                    format!("malformed row: {}", error),
                ));
            }
            Ok(record) => {
                let number = record
                    .position()
                    .map(|p| p.line() as usize)
                    .unwrap_or(fallback);
                if record.iter().all(|cell| cell.is_empty()) {
                    continue;
                }
                if record.len() != headers.len() {
                    defects.push(RowError::general(
                        number,
                        ErrorKind::MissingColumns,
                        format!(
                            "wrong number of columns: expected {}, found {}",
                            headers.len(),
                            record.len()
                        ),
                    ));
                    continue;
                }
                rows.push(RawRow {
                    number,
                    values: record.iter().map(str::to_string).collect(),
                });
            }
        }
    }

    Ok(ParsedTable {
        headers,
        rows,
        defects,
    })
}

fn parse_workbook(bytes: &[u8]) -> Result<ParsedTable, ParseError> {
    let cursor = Cursor::new(bytes.to_vec());
    let mut workbook = calamine::open_workbook_auto_from_rs(cursor)
        .map_err(|e| ParseError::Workbook(e.to_string()))?;

    let range = workbook
        .worksheet_range_at(0)
        .ok_or(ParseError::NoSheets)?
        .map_err(|e| ParseError::Workbook(e.to_string()))?;
    if range.is_empty() {
        return Err(ParseError::Empty);
    }

    let mut cells = range
        .rows()
        .enumerate()
        .map(|(index, row)| (index + 1, row.iter().map(cell_text).collect::<Vec<_>>()))
        .skip_while(|(_, row)| row.iter().all(|c| c.is_empty()));

    let Some((_, header_row)) = cells.next() else {
        return Err(ParseError::NoHeader);
    };

    // Drop trailing padding the used range adds past the last header
    let mut headers = header_row;
    while headers.last().is_some_and(|h| h.is_empty()) {
        headers.pop();
    }
    if headers.is_empty() {
        return Err(ParseError::NoHeader);
    }

    let mut rows = Vec::new();
    for (number, mut values) in cells {
        if values.iter().all(|c| c.is_empty()) {
            continue;
        }
        // Cell ranges are rectangular; align to the header width
        values.resize(headers.len(), String::new());
        rows.push(RawRow { number, values });
    }

    Ok(ParsedTable {
        headers,
        rows,
        defects: Vec::new(),
    })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        other => other.to_string().trim().to_string(),
    }
}
