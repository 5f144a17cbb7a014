use crate::config::RunConfig;
use crate::detector::{ColumnSet, Detection};
use crate::profile::{CELL_COLUMN, DATE_COLUMN};
use crate::types::{ParameterRow, Reading, SummaryStats};

pub const DETAILS_SHEET: &str = "Détails";
pub const PARAMETERS_SHEET: &str = "Paramètres";

/// The finished report: detail rows, parameters used and run counters.
#[derive(Debug, Clone)]
pub struct CongestionReport {
    pub name: String,
    pub headers: Vec<String>,
    pub details: Vec<Vec<String>>,
    pub parameters: Vec<ParameterRow>,
    pub summary: SummaryStats,
}

fn detail_row(r: &Reading) -> Vec<String> {
    vec![
        r.date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default(),
        r.cell.clone(),
        r.site.clone(),
        r.kpi.map(|v| v.to_string()).unwrap_or_default(),
    ]
}

fn parameter(name: &str, value: String) -> ParameterRow {
    ParameterRow {
        name: name.to_string(),
        value,
    }
}

pub fn build_report(
    config: &RunConfig,
    columns: &ColumnSet,
    detection: &Detection,
    dataset_rows: usize,
) -> CongestionReport {
    let criteria = &config.criteria;
    let headers = vec![
        DATE_COLUMN.to_string(),
        CELL_COLUMN.to_string(),
        columns.site_label.clone(),
        columns.kpi.clone(),
    ];
    let details = detection.rows.iter().map(detail_row).collect();
    let parameters = vec![
        parameter("Seuil Congestion (%)", criteria.threshold.to_string()),
        parameter("Seuil Jours", criteria.min_days.to_string()),
        parameter("Jours Distincts", detection.distinct_days.to_string()),
    ];
    let summary = SummaryStats {
        technology: config.technology,
        kpi_column: columns.kpi.clone(),
        site_column: columns.site_label.clone(),
        comparator: criteria.comparator,
        threshold: criteria.threshold,
        min_days: criteria.min_days,
        distinct_days: detection.distinct_days,
        dataset_rows,
        congested_rows: detection.rows.len(),
        congested_cells: detection.congested_cells(),
        congested_sites: detection.congested_sites(),
    };
    CongestionReport {
        name: config.technology.report_name(),
        headers,
        details,
        parameters,
        summary,
    }
}
