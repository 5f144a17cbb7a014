// Entry point and high-level CLI flow.
//
// One run reads a daily KPI export, flags the cells congested on enough
// distinct days for the chosen technology, and writes a report directory
// with the "Détails" and "Paramètres" sheets as CSV plus a JSON summary.
mod config;
mod detector;
mod error;
mod loader;
mod logging;
mod output;
mod profile;
mod report;
mod types;
mod util;

use clap::Parser;
use config::{Overrides, RunConfig};
use detector::ColumnSet;
use error::CongestionError;
use profile::{Comparator, Technology};
use std::path::PathBuf;
use std::process::ExitCode;

/// Flag recurring cell congestion in daily 2G/3G/4G KPI exports
#[derive(Parser)]
#[command(name = "congestion_report")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// KPI export to analyse (.csv, .xlsx, .xls, .xlsm, .xlsb, .ods)
    input: PathBuf,

    /// Radio technology of the export
    #[arg(long, short, env = "CONGESTION_TECH", default_value = "2g")]
    tech: Technology,

    /// Congestion threshold in percent (defaults per technology)
    #[arg(long, env = "CONGESTION_THRESHOLD")]
    threshold: Option<f64>,

    /// Minimum number of distinct congested days, 1 to 31 (defaults per technology)
    #[arg(long, env = "CONGESTION_MIN_DAYS")]
    min_days: Option<u32>,

    /// Threshold comparison (defaults per technology)
    #[arg(long, env = "CONGESTION_COMPARATOR")]
    comparator: Option<Comparator>,

    /// Read the KPI from this column instead of the technology's default
    #[arg(long)]
    kpi_column: Option<String>,

    /// Worksheet to read from a workbook (first sheet if omitted)
    #[arg(long)]
    sheet: Option<String>,

    /// Directory the report directory is created in
    #[arg(long, short, env = "CONGESTION_OUTPUT_DIR", default_value = ".")]
    output_dir: PathBuf,

    /// Detail rows to preview on the console (0 disables the preview)
    #[arg(long, default_value_t = 10)]
    preview_rows: usize,

    /// Enable debug logging
    #[arg(long, short)]
    verbose: bool,
}

impl Cli {
    fn run_config(&self) -> Result<RunConfig, CongestionError> {
        let overrides = Overrides {
            threshold: self.threshold,
            min_days: self.min_days,
            comparator: self.comparator,
            kpi_column: self.kpi_column.clone(),
        };
        Ok(
            RunConfig::new(self.tech, self.input.clone(), self.output_dir.clone(), overrides)?
                .with_sheet(self.sheet.clone())
                .with_preview_rows(self.preview_rows),
        )
    }
}

fn run(config: &RunConfig) -> Result<(), CongestionError> {
    let profile = config.profile();
    println!(
        "Congestion analysis: {} ({})",
        profile.kpi_label, config.technology
    );
    println!(
        "Criteria: KPI {} {}, at least {} distinct days",
        config.criteria.comparator,
        util::format_number(config.criteria.threshold, 2),
        config.criteria.min_days
    );
    tracing::info!(
        input = %config.input.display(),
        threshold = config.criteria.threshold,
        min_days = config.criteria.min_days,
        comparator = %config.criteria.comparator,
        "starting analysis"
    );

    let (dataset, load_report) = loader::load_dataset(&config.input, config.sheet.as_deref())?;
    println!(
        "Processing dataset... ({} rows loaded, {} empty rows skipped)",
        util::format_int(load_report.kept_rows()),
        util::format_int(load_report.empty_rows)
    );

    let columns = ColumnSet::resolve(profile, &dataset.headers, config.kpi_column.as_deref());
    let detection = detector::analyze(&dataset, &columns, &config.criteria)?;
    let report = report::build_report(config, &columns, &detection, dataset.rows.len());

    let dir = output::write_report(&config.output_dir, &report)?;
    println!();
    output::print_report(&report, &dir, config.preview_rows);
    Ok(())
}

/// Turn a failed run into a user-facing message and an exit code.
fn report_failure(tech: Technology, err: &CongestionError) -> ExitCode {
    match err {
        CongestionError::MissingColumns(missing) => {
            tracing::error!(?missing, "schema check failed");
            eprintln!(
                "Error: missing required column(s) for {} analysis: {}",
                tech,
                missing.join(", ")
            );
        }
        CongestionError::InvalidParameter(msg) => {
            tracing::error!(%msg, "invalid parameter");
            eprintln!("Error: {}", msg);
        }
        other => {
            tracing::error!(error = %other, "analysis failed");
            eprintln!("An error occurred: {}", other);
        }
    }
    if err.is_user_facing() {
        ExitCode::from(2)
    } else {
        ExitCode::FAILURE
    }
}

fn main() -> ExitCode {
    let env_file = config::load_env();
    let cli = Cli::parse();
    if let Err(e) = logging::init_logging(cli.verbose) {
        eprintln!("Failed to initialise logging: {}", e);
    }
    if let Some(path) = env_file {
        tracing::debug!(path = %path.display(), "loaded .env");
    }

    match cli.run_config().and_then(|config| run(&config)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => report_failure(cli.tech, &e),
    }
}
