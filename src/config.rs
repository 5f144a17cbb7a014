use crate::detector::Criteria;
use crate::error::{CongestionError, Result};
use crate::profile::{Comparator, Technology, TechnologyProfile, MIN_DAYS_BOUNDS};
use std::path::PathBuf;

/// Load a `.env` file if one exists, so env-backed CLI options can live there.
///
/// Runs before logging is set up; the caller logs the returned path.
pub fn load_env() -> Option<PathBuf> {
    dotenvy::dotenv().ok()
}

/// Values the user may set; anything left `None` falls back to the profile.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub threshold: Option<f64>,
    pub min_days: Option<u32>,
    pub comparator: Option<Comparator>,
    pub kpi_column: Option<String>,
}

/// Everything one report run needs, validated before any file is read.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub technology: Technology,
    pub input: PathBuf,
    pub sheet: Option<String>,
    pub output_dir: PathBuf,
    pub preview_rows: usize,
    pub kpi_column: Option<String>,
    pub criteria: Criteria,
}

impl RunConfig {
    pub fn new(
        technology: Technology,
        input: PathBuf,
        output_dir: PathBuf,
        overrides: Overrides,
    ) -> Result<Self> {
        let profile = technology.profile();
        let criteria = criteria_for(profile, &overrides)?;
        let kpi_column = match overrides.kpi_column {
            Some(col) if col.trim().is_empty() => {
                return Err(CongestionError::InvalidParameter(
                    "KPI column name must not be empty".to_string(),
                ))
            }
            Some(col) => Some(col.trim().to_string()),
            None => None,
        };
        Ok(RunConfig {
            technology,
            input,
            sheet: None,
            output_dir,
            preview_rows: 10,
            kpi_column,
            criteria,
        })
    }

    pub fn with_sheet(mut self, sheet: Option<String>) -> Self {
        self.sheet = sheet;
        self
    }

    pub fn with_preview_rows(mut self, rows: usize) -> Self {
        self.preview_rows = rows;
        self
    }

    pub fn profile(&self) -> &'static TechnologyProfile {
        self.technology.profile()
    }
}

fn criteria_for(profile: &TechnologyProfile, overrides: &Overrides) -> Result<Criteria> {
    let threshold = overrides.threshold.unwrap_or(profile.default_threshold);
    if !profile.threshold_in_bounds(threshold) {
        let (lo, hi) = profile.threshold_bounds;
        return Err(CongestionError::InvalidParameter(format!(
            "threshold {} outside [{}, {}] for {}",
            threshold, lo, hi, profile.technology
        )));
    }

    let min_days = overrides.min_days.unwrap_or(profile.default_min_days);
    let (lo, hi) = MIN_DAYS_BOUNDS;
    if !(lo..=hi).contains(&min_days) {
        return Err(CongestionError::InvalidParameter(format!(
            "minimum days {} outside [{}, {}]",
            min_days, lo, hi
        )));
    }

    Ok(Criteria {
        threshold,
        min_days,
        comparator: overrides.comparator.unwrap_or(profile.comparator),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(tech: Technology, overrides: Overrides) -> Result<RunConfig> {
        RunConfig::new(tech, "in.csv".into(), ".".into(), overrides)
    }

    #[test]
    fn profile_defaults_apply() {
        let cfg = run(Technology::G3, Overrides::default()).unwrap();
        assert_eq!(cfg.criteria.threshold, 80.0);
        assert_eq!(cfg.criteria.min_days, 22);
        assert_eq!(cfg.criteria.comparator, Comparator::GreaterOrEqual);
        assert_eq!(cfg.kpi_column, None);
        assert_eq!(cfg.preview_rows, 10);
    }

    #[test]
    fn overrides_win() {
        let cfg = run(
            Technology::G2,
            Overrides {
                threshold: Some(2.5),
                min_days: Some(3),
                comparator: Some(Comparator::GreaterOrEqual),
                kpi_column: Some(" OG_SDCCH_Congestion_Rate(%) ".into()),
            },
        )
        .unwrap()
        .with_sheet(Some("Feuil1".into()))
        .with_preview_rows(0);
        assert_eq!(cfg.criteria.threshold, 2.5);
        assert_eq!(cfg.criteria.min_days, 3);
        assert_eq!(cfg.criteria.comparator, Comparator::GreaterOrEqual);
        assert_eq!(cfg.kpi_column.as_deref(), Some("OG_SDCCH_Congestion_Rate(%)"));
        assert_eq!(cfg.sheet.as_deref(), Some("Feuil1"));
        assert_eq!(cfg.preview_rows, 0);
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        for overrides in [
            Overrides {
                threshold: Some(101.0),
                ..Default::default()
            },
            Overrides {
                threshold: Some(-0.1),
                ..Default::default()
            },
            Overrides {
                min_days: Some(0),
                ..Default::default()
            },
            Overrides {
                min_days: Some(32),
                ..Default::default()
            },
            Overrides {
                kpi_column: Some("  ".into()),
                ..Default::default()
            },
        ] {
            let err = run(Technology::G4, overrides).unwrap_err();
            assert!(matches!(err, CongestionError::InvalidParameter(_)));
        }
    }

    #[test]
    fn bounds_are_inclusive() {
        let cfg = run(
            Technology::G4,
            Overrides {
                threshold: Some(100.0),
                min_days: Some(31),
                ..Default::default()
            },
        );
        assert!(cfg.is_ok());
    }
}
