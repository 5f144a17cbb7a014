use chrono::NaiveDate;
use serde::Serialize;
use tabled::Tabled;

use crate::util::{excel_serial_to_date, finite, number_to_label, parse_date_safe, parse_kpi_safe};

/// One raw value as read from the export, before any coercion.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Empty,
    Text(String),
    Number(f64),
    Date(NaiveDate),
}

impl Cell {
    pub fn is_empty(&self) -> bool {
        match self {
            Cell::Empty => true,
            Cell::Text(s) => s.trim().is_empty(),
            _ => false,
        }
    }

    pub fn as_kpi(&self) -> Option<f64> {
        match self {
            Cell::Number(n) => finite(*n),
            Cell::Text(s) => parse_kpi_safe(Some(s.as_str())),
            Cell::Empty | Cell::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            Cell::Text(s) => parse_date_safe(Some(s.as_str())),
            Cell::Number(n) => excel_serial_to_date(*n),
            Cell::Empty => None,
        }
    }

    pub fn as_label(&self) -> String {
        match self {
            Cell::Text(s) => s.trim().to_string(),
            Cell::Number(n) => number_to_label(*n),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
            Cell::Empty => String::new(),
        }
    }
}

/// A header row plus the data rows beneath it.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<Cell>>,
}

impl Dataset {
    /// Position of the first column with this (trimmed) name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }

    /// Value of `col` in `row`, `Cell::Empty` for short rows.
    pub fn cell<'a>(&'a self, row: &'a [Cell], col: usize) -> &'a Cell {
        static EMPTY: Cell = Cell::Empty;
        row.get(col).unwrap_or(&EMPTY)
    }
}

/// One cell on one day with its KPI reading, after coercion.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub date: Option<NaiveDate>,
    pub cell: String,
    pub site: String,
    pub kpi: Option<f64>,
}

#[derive(Debug, Serialize, Tabled, Clone)]
pub struct ParameterRow {
    #[serde(rename = "Paramètre")]
    #[tabled(rename = "Paramètre")]
    pub name: String,
    #[serde(rename = "Valeur")]
    #[tabled(rename = "Valeur")]
    pub value: String,
}

#[derive(Debug, Serialize, Clone)]
pub struct SummaryStats {
    pub technology: crate::profile::Technology,
    pub kpi_column: String,
    pub site_column: String,
    pub comparator: crate::profile::Comparator,
    pub threshold: f64,
    pub min_days: u32,
    pub distinct_days: usize,
    pub dataset_rows: usize,
    pub congested_rows: usize,
    pub congested_cells: usize,
    pub congested_sites: usize,
}
