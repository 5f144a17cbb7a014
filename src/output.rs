use crate::error::Result;
use crate::report::{CongestionReport, DETAILS_SHEET, PARAMETERS_SHEET};
use crate::util::format_int;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style, Table, Tabled};

pub fn write_csv<T: Serialize>(path: &Path, rows: &[T]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_records(path: &Path, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    wtr.write_record(headers)?;
    for r in rows {
        wtr.write_record(r)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    fs::write(path, s)?;
    Ok(())
}

fn write_report_files(dir: &Path, report: &CongestionReport) -> Result<()> {
    write_records(
        &dir.join(format!("{}.csv", DETAILS_SHEET)),
        &report.headers,
        &report.details,
    )?;
    write_csv(
        &dir.join(format!("{}.csv", PARAMETERS_SHEET)),
        &report.parameters,
    )?;
    write_json(&dir.join("summary.json"), &report.summary)?;
    Ok(())
}

/// Write the report directory under `parent` and return its path.
///
/// Files are assembled in `<name>.partial` and the directory is renamed into
/// place only once every file is on disk. On failure the staging directory
/// is removed and no report is left behind.
pub fn write_report(parent: &Path, report: &CongestionReport) -> Result<PathBuf> {
    let final_dir = parent.join(&report.name);
    let staging = parent.join(format!("{}.partial", report.name));
    if staging.exists() {
        fs::remove_dir_all(&staging)?;
    }
    fs::create_dir_all(&staging)?;

    let published = write_report_files(&staging, report).and_then(|_| {
        if final_dir.exists() {
            fs::remove_dir_all(&final_dir)?;
        }
        fs::rename(&staging, &final_dir)?;
        Ok(())
    });
    if let Err(e) = published {
        if let Err(cleanup) = fs::remove_dir_all(&staging) {
            tracing::warn!(error = %cleanup, dir = %staging.display(), "could not remove staging directory");
        }
        return Err(e);
    }
    tracing::info!(dir = %final_dir.display(), "report written");
    Ok(final_dir)
}

pub fn preview_table_rows<T>(rows: &[T], max_rows: usize)
where
    T: Tabled + Clone,
{
    let slice: Vec<T> = rows.iter().cloned().take(max_rows).collect();
    if slice.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let table_str = Table::new(slice).with(Style::markdown()).to_string();
    println!("{}\n", table_str);
}

pub fn preview_records(headers: &[String], rows: &[Vec<String>], max_rows: usize) {
    if rows.is_empty() {
        println!("(no rows)\n");
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(headers.iter().cloned());
    for r in rows.iter().take(max_rows) {
        builder.push_record(r.iter().cloned());
    }
    let table_str = builder.build().with(Style::markdown()).to_string();
    println!("{}\n", table_str);
    if rows.len() > max_rows {
        println!("... {} more rows\n", format_int(rows.len() - max_rows));
    }
}

/// Console summary printed after the report is written.
pub fn print_report(report: &CongestionReport, dir: &Path, preview_rows: usize) {
    let s = &report.summary;
    println!(
        "Result: {} congested cells ({} rows, {} sites)",
        format_int(s.congested_cells),
        format_int(s.congested_rows),
        format_int(s.congested_sites)
    );
    println!("Total distinct days in dataset: {}\n", format_int(s.distinct_days));

    println!("{}", PARAMETERS_SHEET);
    preview_table_rows(&report.parameters, report.parameters.len());

    if preview_rows > 0 {
        println!("{}", DETAILS_SHEET);
        preview_records(&report.headers, &report.details, preview_rows);
    }
    println!("(Full report exported to {})", dir.display());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::{Comparator, Technology};
    use crate::types::{ParameterRow, SummaryStats};

    fn sample_report() -> CongestionReport {
        CongestionReport {
            name: "rapport_congestion_2g".into(),
            headers: vec![
                "Date".into(),
                "Cell Name".into(),
                "Site Name".into(),
                "TCH Congestion Rate(%)".into(),
            ],
            details: vec![vec![
                "2025-05-01".into(),
                "A1".into(),
                "S1".into(),
                "2".into(),
            ]],
            parameters: vec![ParameterRow {
                name: "Seuil Jours".into(),
                value: "2".into(),
            }],
            summary: SummaryStats {
                technology: Technology::G2,
                kpi_column: "TCH Congestion Rate(%)".into(),
                site_column: "Site Name".into(),
                comparator: Comparator::Greater,
                threshold: 1.0,
                min_days: 2,
                distinct_days: 3,
                dataset_rows: 3,
                congested_rows: 1,
                congested_cells: 1,
                congested_sites: 1,
            },
        }
    }

    #[test]
    fn writes_both_sheets_and_summary() {
        let tmp = tempfile::tempdir().unwrap();
        let dir = write_report(tmp.path(), &sample_report()).unwrap();

        assert_eq!(dir, tmp.path().join("rapport_congestion_2g"));
        assert!(!tmp.path().join("rapport_congestion_2g.partial").exists());

        let details = fs::read_to_string(dir.join("Détails.csv")).unwrap();
        assert_eq!(
            details,
            "Date,Cell Name,Site Name,TCH Congestion Rate(%)\n2025-05-01,A1,S1,2\n"
        );
        let params = fs::read_to_string(dir.join("Paramètres.csv")).unwrap();
        assert_eq!(params, "Paramètre,Valeur\nSeuil Jours,2\n");

        let summary: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.join("summary.json")).unwrap()).unwrap();
        assert_eq!(summary["technology"], "2G");
        assert_eq!(summary["comparator"], ">");
        assert_eq!(summary["distinct_days"], 3);
    }

    #[test]
    fn replaces_an_existing_report() {
        let tmp = tempfile::tempdir().unwrap();
        let stale = tmp.path().join("rapport_congestion_2g");
        fs::create_dir_all(&stale).unwrap();
        fs::write(stale.join("old.txt"), "stale").unwrap();

        let dir = write_report(tmp.path(), &sample_report()).unwrap();
        assert!(!dir.join("old.txt").exists());
        assert!(dir.join("Détails.csv").exists());
    }

    #[test]
    fn failed_write_leaves_nothing_behind() {
        let tmp = tempfile::tempdir().unwrap();
        let parent = tmp.path().join("not-a-dir");
        fs::write(&parent, "file").unwrap();

        assert!(write_report(&parent, &sample_report()).is_err());
        assert!(!tmp.path().join("not-a-dir").is_dir());
    }
}
