// Per-technology column names and detection defaults.
//
// One generic detection routine serves every radio technology; what differs
// between 2G, 3G and 4G exports is only which columns hold the KPI and the
// site name, and what a sensible threshold looks like.
use clap::ValueEnum;
use once_cell::sync::Lazy;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

pub const DATE_COLUMN: &str = "Date";
pub const CELL_COLUMN: &str = "Cell Name";

/// Accepted range for the minimum-days criterion (one calendar month at most).
pub const MIN_DAYS_BOUNDS: (u32, u32) = (1, 31);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum, Serialize)]
pub enum Technology {
    #[value(name = "2g", alias = "2G")]
    #[serde(rename = "2G")]
    G2,
    #[value(name = "3g", alias = "3G")]
    #[serde(rename = "3G")]
    G3,
    #[value(name = "4g", alias = "4G")]
    #[serde(rename = "4G")]
    G4,
}

impl Technology {
    pub fn profile(self) -> &'static TechnologyProfile {
        &PROFILES[&self]
    }

    /// Directory name of the generated report, e.g. `rapport_congestion_3g`.
    pub fn report_name(self) -> String {
        format!("rapport_congestion_{}", self.to_string().to_lowercase())
    }
}

impl fmt::Display for Technology {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tag = match self {
            Technology::G2 => "2G",
            Technology::G3 => "3G",
            Technology::G4 => "4G",
        };
        f.write_str(tag)
    }
}

/// Boundary behaviour of the threshold test.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
pub enum Comparator {
    /// KPI strictly above the threshold
    #[value(name = "gt", alias = ">")]
    #[serde(rename = ">")]
    Greater,
    /// KPI at or above the threshold
    #[value(name = "ge", alias = ">=")]
    #[serde(rename = ">=")]
    GreaterOrEqual,
}

impl Comparator {
    pub fn holds(self, value: f64, threshold: f64) -> bool {
        match self {
            Comparator::Greater => value > threshold,
            Comparator::GreaterOrEqual => value >= threshold,
        }
    }
}

impl fmt::Display for Comparator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Comparator::Greater => f.write_str(">"),
            Comparator::GreaterOrEqual => f.write_str(">="),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TechnologyProfile {
    pub technology: Technology,
    /// Human name of the KPI, used in console headings.
    pub kpi_label: &'static str,
    pub kpi_column: &'static str,
    pub site_column: &'static str,
    /// Older exports name the site column differently; tried in order when
    /// `site_column` is absent.
    pub site_aliases: &'static [&'static str],
    pub default_threshold: f64,
    pub threshold_bounds: (f64, f64),
    pub default_min_days: u32,
    pub comparator: Comparator,
}

impl TechnologyProfile {
    /// Pick the header that holds the site name in this dataset.
    ///
    /// Falls back to the canonical name when neither it nor an alias is
    /// present, so schema validation reports the canonical name as missing.
    pub fn resolve_site_column(&self, headers: &[String]) -> &'static str {
        let has = |name: &str| headers.iter().any(|h| h == name);
        if has(self.site_column) {
            return self.site_column;
        }
        self.site_aliases
            .iter()
            .copied()
            .find(|alias| has(*alias))
            .unwrap_or(self.site_column)
    }

    pub fn threshold_in_bounds(&self, threshold: f64) -> bool {
        let (lo, hi) = self.threshold_bounds;
        threshold.is_finite() && threshold >= lo && threshold <= hi
    }
}

static PROFILES: Lazy<HashMap<Technology, TechnologyProfile>> = Lazy::new(|| {
    let profiles = [
        TechnologyProfile {
            technology: Technology::G2,
            kpi_label: "TCH Congestion Rate",
            kpi_column: "TCH Congestion Rate(%)",
            site_column: "Site Name",
            site_aliases: &[],
            default_threshold: 1.0,
            threshold_bounds: (0.0, 100.0),
            default_min_days: 22,
            comparator: Comparator::Greater,
        },
        TechnologyProfile {
            technology: Technology::G3,
            kpi_label: "RRC Congestion",
            kpi_column: "RRC Congestion (%)_CS",
            site_column: "NodeB Name",
            site_aliases: &[],
            default_threshold: 80.0,
            threshold_bounds: (0.0, 100.0),
            default_min_days: 22,
            comparator: Comparator::GreaterOrEqual,
        },
        TechnologyProfile {
            technology: Technology::G4,
            kpi_label: "DL PRB Utilization",
            kpi_column: "OG_DL_PRB_Utilization(%)",
            site_column: "eNodeB Name",
            site_aliases: &["NodeB Name"],
            default_threshold: 80.0,
            threshold_bounds: (0.0, 100.0),
            default_min_days: 22,
            comparator: Comparator::Greater,
        },
    ];
    profiles.into_iter().map(|p| (p.technology, p)).collect()
});
