use crate::error::{CongestionError, Result};
use crate::types::{Cell, Dataset};
use crate::util::{excel_serial_to_date, parse_date_safe};
use calamine::{open_workbook_auto, Data, Reader};
use csv::ReaderBuilder;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    pub total_rows: usize,
    pub empty_rows: usize,
    pub unreadable_rows: usize,
}

impl LoadReport {
    pub fn kept_rows(&self) -> usize {
        self.total_rows - self.empty_rows - self.unreadable_rows
    }
}

enum InputFormat {
    Csv,
    Workbook,
}

fn input_format(path: &Path) -> Result<InputFormat> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "csv" => Ok(InputFormat::Csv),
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(InputFormat::Workbook),
        _ => Err(CongestionError::UnsupportedFormat(path.display().to_string())),
    }
}

/// Load a daily KPI export into a `Dataset`.
///
/// `sheet` selects a worksheet in a workbook and is ignored for CSV input.
pub fn load_dataset(path: &Path, sheet: Option<&str>) -> Result<(Dataset, LoadReport)> {
    let (dataset, report) = match input_format(path)? {
        InputFormat::Csv => load_csv(path)?,
        InputFormat::Workbook => load_workbook(path, sheet)?,
    };
    tracing::debug!(
        columns = dataset.headers.len(),
        rows = report.total_rows,
        empty = report.empty_rows,
        unreadable = report.unreadable_rows,
        "dataset loaded"
    );
    if report.unreadable_rows > 0 {
        tracing::warn!(rows = report.unreadable_rows, "skipped unreadable rows");
    }
    Ok((dataset, report))
}

/// Exports saved from a French-locale spreadsheet use `;` between fields.
fn sniff_delimiter(path: &Path) -> Result<u8> {
    let mut first = Vec::new();
    BufReader::new(File::open(path)?).read_until(b'\n', &mut first)?;
    let semis = first.iter().filter(|b| **b == b';').count();
    let commas = first.iter().filter(|b| **b == b',').count();
    Ok(if semis > commas { b';' } else { b',' })
}

/// Decode one field; bytes that are not UTF-8 (Windows-1252 site names)
/// become replacement characters instead of costing the whole row.
fn decode_field(field: &[u8]) -> String {
    String::from_utf8_lossy(field).into_owned()
}

fn clean_header(h: &str) -> String {
    h.trim_start_matches('\u{feff}').trim().to_string()
}

fn load_csv(path: &Path) -> Result<(Dataset, LoadReport)> {
    let delimiter = sniff_delimiter(path)?;
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .delimiter(delimiter)
        .from_path(path)?;

    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| clean_header(&decode_field(h)))
        .collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CongestionError::EmptyDataset);
    }

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for result in rdr.byte_records() {
        report.total_rows += 1;
        let record = match result {
            Ok(r) => r,
            Err(_) => {
                report.unreadable_rows += 1;
                continue;
            }
        };
        let row: Vec<Cell> = record
            .iter()
            .map(|field| {
                if field.is_empty() {
                    Cell::Empty
                } else {
                    Cell::Text(decode_field(field))
                }
            })
            .collect();
        if row.iter().all(Cell::is_empty) {
            report.empty_rows += 1;
            continue;
        }
        rows.push(row);
    }
    Ok((Dataset { headers, rows }, report))
}

fn cell_from_data(value: &Data) -> Cell {
    match value {
        Data::Int(i) => Cell::Number(*i as f64),
        Data::Float(f) => Cell::Number(*f),
        Data::String(s) => Cell::Text(s.clone()),
        Data::Bool(b) => Cell::Text(b.to_string()),
        Data::DateTime(dt) => excel_serial_to_date(dt.as_f64())
            .map(Cell::Date)
            .unwrap_or(Cell::Empty),
        Data::DateTimeIso(s) => parse_date_safe(Some(s.as_str()))
            .map(Cell::Date)
            .unwrap_or_else(|| Cell::Text(s.clone())),
        Data::DurationIso(s) => Cell::Text(s.clone()),
        Data::Error(_) | Data::Empty => Cell::Empty,
    }
}

fn load_workbook(path: &Path, sheet: Option<&str>) -> Result<(Dataset, LoadReport)> {
    let mut workbook = open_workbook_auto(path)?;
    let sheet_names = workbook.sheet_names().to_vec();
    let sheet_name = match sheet {
        Some(name) => sheet_names
            .iter()
            .find(|s| s.as_str() == name)
            .cloned()
            .ok_or_else(|| CongestionError::SheetNotFound(name.to_string()))?,
        None => sheet_names
            .first()
            .cloned()
            .ok_or(CongestionError::EmptyDataset)?,
    };
    tracing::debug!(sheet = %sheet_name, "reading worksheet");

    let range = workbook.worksheet_range(&sheet_name)?;
    let mut raw_rows = range.rows();
    let headers: Vec<String> = match raw_rows.next() {
        Some(header_row) => header_row
            .iter()
            .map(|c| clean_header(&cell_from_data(c).as_label()))
            .collect(),
        None => return Err(CongestionError::EmptyDataset),
    };

    let mut report = LoadReport::default();
    let mut rows = Vec::new();
    for raw in raw_rows {
        report.total_rows += 1;
        let row: Vec<Cell> = raw.iter().map(cell_from_data).collect();
        if row.iter().all(Cell::is_empty) {
            report.empty_rows += 1;
            continue;
        }
        rows.push(row);
    }
    Ok((Dataset { headers, rows }, report))
}
