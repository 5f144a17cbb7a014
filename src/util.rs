// Utility helpers for lenient parsing and number formatting.
//
// Performance exports are full of placeholders ("/0", "/", blanks) and mixed
// date layouts. Everything that turns a raw cell into a typed value lives here
// so the detector only ever sees `Option<f64>` and `Option<NaiveDate>`.
use chrono::{Days, NaiveDate, NaiveDateTime};
use num_format::{Locale, ToFormattedString};

/// Tokens exports write in place of a KPI value that could not be computed.
pub const PLACEHOLDER_TOKENS: [&str; 4] = ["/0", "/", " ", ""];

const DATE_FORMATS: [&str; 5] = ["%Y-%m-%d", "%d/%m/%Y", "%Y/%m/%d", "%d-%m-%Y", "%d.%m.%Y"];
const TIME_SUFFIXES: [&str; 4] = [" %H:%M:%S", " %H:%M", "T%H:%M:%S", "T%H:%M:%S%.f"];

/// Parse a KPI value, treating placeholders and anything non-numeric as missing.
///
/// - Placeholder tokens map to `None` before trimming, then the trimmed
///   value is checked again (a cell holding only spaces is blank too).
/// - A single comma with no dot is a decimal comma (`"81,5"` is 81.5), as
///   written by French-locale exports. Anything else with commas is missing.
/// - Values that parse but are not finite (`inf`, `NaN`) are missing, so
///   `inf` never passes a threshold.
pub fn parse_kpi_safe(s: Option<&str>) -> Option<f64> {
    let raw = s?;
    if PLACEHOLDER_TOKENS.contains(&raw) {
        return None;
    }
    let s = raw.trim();
    if PLACEHOLDER_TOKENS.contains(&s) {
        return None;
    }
    let parsed = match decimal_comma(s) {
        Some(fixed) => fixed.parse::<f64>().ok()?,
        None => s.parse::<f64>().ok()?,
    };
    finite(parsed)
}

fn decimal_comma(s: &str) -> Option<String> {
    if s.matches(',').count() == 1 && !s.contains('.') {
        Some(s.replace(',', "."))
    } else {
        None
    }
}

/// Keep a float only when it is a usable number.
pub fn finite(v: f64) -> Option<f64> {
    if v.is_finite() {
        Some(v)
    } else {
        None
    }
}

/// Parse a calendar date from the layouts seen in daily exports.
///
/// Slash and dash layouts are always read day-first (`23/05/2025`), never
/// month-first, so `05/06/2025` is 5 June. A trailing time-of-day is
/// accepted and dropped.
pub fn parse_date_safe(s: Option<&str>) -> Option<NaiveDate> {
    let s = s?.trim();
    if s.is_empty() {
        return None;
    }
    for fmt in DATE_FORMATS {
        if let Ok(d) = NaiveDate::parse_from_str(s, fmt) {
            return Some(d);
        }
        for suffix in TIME_SUFFIXES {
            let full = format!("{}{}", fmt, suffix);
            if let Ok(dt) = NaiveDateTime::parse_from_str(s, &full) {
                return Some(dt.date());
            }
        }
    }
    None
}

/// Convert an Excel serial day number to a calendar date.
///
/// Excel counts from 1899-12-30 (the 1900 leap-year bug is absorbed by that
/// epoch for every date after February 1900). The fractional part is the
/// time of day and is dropped.
pub fn excel_serial_to_date(serial: f64) -> Option<NaiveDate> {
    if !serial.is_finite() || serial < 1.0 {
        return None;
    }
    let epoch = NaiveDate::from_ymd_opt(1899, 12, 30)?;
    epoch.checked_add_days(Days::new(serial.floor() as u64))
}

/// Render an identifier read from a numeric cell (`1234.0` -> `"1234"`).
pub fn number_to_label(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{}", n)
    }
}

pub fn format_number(n: f64, decimals: usize) -> String {
    // Fixed decimals with locale thousands separators (`1,234.50`).
    let neg = n.is_sign_negative() && n != 0.0;
    let s = format!("{:.*}", decimals, n.abs());
    let mut parts = s.split('.');
    let int_part = parts.next().unwrap_or("0");
    let frac_part = parts.next();
    let int_val: i64 = int_part.parse().unwrap_or(0);
    let mut res = int_val.to_formatted_string(&Locale::en);
    if let Some(frac) = frac_part {
        res.push('.');
        res.push_str(frac);
    }
    if neg {
        format!("-{}", res)
    } else {
        res
    }
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    // Counts in console messages (`9,855 rows loaded`).
    n.to_formatted_string(&Locale::en)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ymd(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn placeholders_are_missing() {
        for token in ["/0", "/", " ", "", "   ", " /0 "] {
            assert_eq!(parse_kpi_safe(Some(token)), None, "token {:?}", token);
        }
        assert_eq!(parse_kpi_safe(None), None);
    }

    #[test]
    fn kpi_text_is_parsed_or_dropped() {
        assert_eq!(parse_kpi_safe(Some(" 2.5 ")), Some(2.5));
        assert_eq!(parse_kpi_safe(Some("80")), Some(80.0));
        assert_eq!(parse_kpi_safe(Some("n/a")), None);
        assert_eq!(parse_kpi_safe(Some("1,5")), Some(1.5));
        assert_eq!(parse_kpi_safe(Some(" 95,0 ")), Some(95.0));
        assert_eq!(parse_kpi_safe(Some("1,234,5")), None);
        assert_eq!(parse_kpi_safe(Some("1.234,5")), None);
        assert_eq!(parse_kpi_safe(Some("inf")), None);
        assert_eq!(parse_kpi_safe(Some("NaN")), None);
    }

    #[test]
    fn dates_in_common_layouts() {
        assert_eq!(parse_date_safe(Some("2025-05-23")), Some(ymd(2025, 5, 23)));
        assert_eq!(parse_date_safe(Some("23/05/2025")), Some(ymd(2025, 5, 23)));
        assert_eq!(parse_date_safe(Some("2025/05/23")), Some(ymd(2025, 5, 23)));
        assert_eq!(parse_date_safe(Some("23-05-2025")), Some(ymd(2025, 5, 23)));
        assert_eq!(parse_date_safe(Some("23.05.2025")), Some(ymd(2025, 5, 23)));
        assert_eq!(
            parse_date_safe(Some("2025-05-23 14:49:15")),
            Some(ymd(2025, 5, 23))
        );
        assert_eq!(
            parse_date_safe(Some("2025-05-23T00:00:00")),
            Some(ymd(2025, 5, 23))
        );
        assert_eq!(parse_date_safe(Some("23/05/2025 08:00")), Some(ymd(2025, 5, 23)));
        assert_eq!(parse_date_safe(Some("05/06/2025")), Some(ymd(2025, 6, 5)));
    }

    #[test]
    fn bad_dates_are_missing() {
        assert_eq!(parse_date_safe(Some("")), None);
        assert_eq!(parse_date_safe(Some("not a date")), None);
        assert_eq!(parse_date_safe(Some("2025-13-40")), None);
        assert_eq!(parse_date_safe(None), None);
    }

    #[test]
    fn excel_serials() {
        assert_eq!(excel_serial_to_date(45800.0), Some(ymd(2025, 5, 23)));
        assert_eq!(excel_serial_to_date(45800.75), Some(ymd(2025, 5, 23)));
        assert_eq!(excel_serial_to_date(0.0), None);
        assert_eq!(excel_serial_to_date(f64::NAN), None);
    }

    #[test]
    fn labels_from_numbers() {
        assert_eq!(number_to_label(1234.0), "1234");
        assert_eq!(number_to_label(12.5), "12.5");
    }

    #[test]
    fn formatting() {
        assert_eq!(format_number(1234567.891, 2), "1,234,567.89");
        assert_eq!(format_number(-3.5, 1), "-3.5");
        assert_eq!(format_number(80.0, 0), "80");
        assert_eq!(format_int(9855), "9,855");
    }
}
