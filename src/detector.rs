// Congestion detection.
//
// A cell is reported when its KPI passes the threshold on at least
// `min_days` distinct calendar days. The day count only decides which cells
// are admitted: once admitted, every passing row of that cell is kept.
use crate::error::{CongestionError, Result};
use crate::profile::{Comparator, TechnologyProfile, CELL_COLUMN, DATE_COLUMN};
use crate::types::{Dataset, Reading};
use chrono::NaiveDate;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Criteria {
    pub threshold: f64,
    pub min_days: u32,
    pub comparator: Comparator,
}

/// Column names the detector reads for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct ColumnSet {
    pub kpi: String,
    /// Header that holds the site name in this dataset.
    pub site_source: String,
    /// Name the site column carries in the report.
    pub site_label: String,
}

impl ColumnSet {
    /// Resolve the profile's columns against the dataset header once.
    pub fn resolve(
        profile: &TechnologyProfile,
        headers: &[String],
        kpi_override: Option<&str>,
    ) -> Self {
        let site_source = profile.resolve_site_column(headers);
        if site_source != profile.site_column {
            tracing::info!(
                from = site_source,
                to = profile.site_column,
                "using legacy site column"
            );
        }
        ColumnSet {
            kpi: kpi_override.unwrap_or(profile.kpi_column).to_string(),
            site_source: site_source.to_string(),
            site_label: profile.site_column.to_string(),
        }
    }

    fn required(&self) -> [&str; 4] {
        [CELL_COLUMN, DATE_COLUMN, self.kpi.as_str(), self.site_source.as_str()]
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Passing rows of admitted cells, ordered by (cell, date).
    pub rows: Vec<Reading>,
    /// Distinct dates across the whole dataset.
    pub distinct_days: usize,
}

impl Detection {
    pub fn congested_cells(&self) -> usize {
        self.rows
            .iter()
            .map(|r| r.cell.as_str())
            .collect::<HashSet<_>>()
            .len()
    }

    pub fn congested_sites(&self) -> usize {
        self.rows
            .iter()
            .filter(|r| !r.site.is_empty())
            .map(|r| r.site.as_str())
            .collect::<HashSet<_>>()
            .len()
    }
}

/// Check the header, then coerce every row into a `Reading`.
///
/// All absent columns are reported at once; nothing is coerced when any is
/// missing.
pub fn extract_readings(dataset: &Dataset, columns: &ColumnSet) -> Result<Vec<Reading>> {
    let required = columns.required();
    let indices: Vec<Option<usize>> = required
        .iter()
        .map(|name| dataset.column_index(name))
        .collect();
    let (cell_col, date_col, kpi_col, site_col) = match indices.as_slice() {
        &[Some(cell), Some(date), Some(kpi), Some(site)] => (cell, date, kpi, site),
        _ => {
            let missing = required
                .iter()
                .zip(&indices)
                .filter(|(_, index)| index.is_none())
                .map(|(name, _)| name.to_string())
                .collect();
            return Err(CongestionError::MissingColumns(missing));
        }
    };

    let readings: Vec<Reading> = dataset
        .rows
        .iter()
        .map(|row| Reading {
            date: dataset.cell(row, date_col).as_date(),
            cell: dataset.cell(row, cell_col).as_label(),
            site: dataset.cell(row, site_col).as_label(),
            kpi: dataset.cell(row, kpi_col).as_kpi(),
        })
        .collect();

    let missing_kpi = readings.iter().filter(|r| r.kpi.is_none()).count();
    let missing_date = readings.iter().filter(|r| r.date.is_none()).count();
    tracing::debug!(
        rows = readings.len(),
        missing_kpi,
        missing_date,
        "readings coerced"
    );
    Ok(readings)
}

/// Dated rows first, in calendar order; undated rows last.
fn date_order(a: Option<NaiveDate>, b: Option<NaiveDate>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

pub fn detect(readings: &[Reading], criteria: &Criteria) -> Detection {
    let passing: Vec<&Reading> = readings
        .iter()
        .filter(|r| !r.cell.is_empty())
        .filter(|r| {
            r.kpi
                .map_or(false, |v| criteria.comparator.holds(v, criteria.threshold))
        })
        .collect();

    let mut days_by_cell: HashMap<&str, HashSet<NaiveDate>> = HashMap::new();
    for r in &passing {
        let days = days_by_cell.entry(r.cell.as_str()).or_default();
        if let Some(d) = r.date {
            days.insert(d);
        }
    }
    let admitted: HashSet<&str> = days_by_cell
        .into_iter()
        .filter(|(_, days)| days.len() >= criteria.min_days as usize)
        .map(|(cell, _)| cell)
        .collect();

    let mut rows: Vec<Reading> = passing
        .into_iter()
        .filter(|r| admitted.contains(r.cell.as_str()))
        .cloned()
        .collect();
    // Stable: same (cell, date) rows keep their source order.
    rows.sort_by(|a, b| a.cell.cmp(&b.cell).then_with(|| date_order(a.date, b.date)));

    let distinct_days = readings
        .iter()
        .filter_map(|r| r.date)
        .collect::<HashSet<_>>()
        .len();

    tracing::debug!(
        admitted = admitted.len(),
        rows = rows.len(),
        distinct_days,
        "congestion detected"
    );
    Detection { rows, distinct_days }
}

/// Validate, coerce and detect in one step.
pub fn analyze(dataset: &Dataset, columns: &ColumnSet, criteria: &Criteria) -> Result<Detection> {
    let readings = extract_readings(dataset, columns)?;
    Ok(detect(&readings, criteria))
}
