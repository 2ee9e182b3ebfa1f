//! Shared parsing helpers for dates and flag columns.

use chrono::{NaiveDate, NaiveDateTime};

const DATE_FORMATS: [&str; 3] = ["%Y-%m-%d", "%Y/%m/%d", "%Y%m%d"];
const DATETIME_FORMATS: [&str; 3] = ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y/%m/%d %H:%M:%S"];

/// Parses a calendar date, dropping any time-of-day component.
pub fn parse_date(input: &str) -> Option<NaiveDate> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return None;
    }

    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(trimmed, format).ok())
        .or_else(|| {
            DATETIME_FORMATS
                .iter()
                .find_map(|format| NaiveDateTime::parse_from_str(trimmed, format).ok())
                .map(|dt| dt.date())
        })
}

/// Parses a 0/1 flag written as an integer, a float or a boolean literal.
pub fn parse_flag(input: &str) -> Option<bool> {
    match input.trim().to_ascii_lowercase().as_str() {
        "1" | "1.0" | "true" | "t" | "yes" => Some(true),
        "0" | "0.0" | "false" | "f" | "no" => Some(false),
        _ => None,
    }
}

/// Parses a finite score.
pub fn parse_score(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if let Some(flag) = parse_flag(trimmed) {
        return Some(if flag { 1.0 } else { 0.0 });
    }
    trimmed.parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Formats a date as `YYYY-MM-DD`.
pub fn format_date(date: NaiveDate) -> String {
    date.format("%Y-%m-%d").to_string()
}

/// Whether two floats agree within an absolute tolerance.
pub fn approx_eq(left: f64, right: f64, tolerance: f64) -> bool {
    (left - right).abs() <= tolerance
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_formats() {
        let expected = NaiveDate::from_ymd_opt(2018, 1, 15).unwrap();
        assert_eq!(parse_date("2018-01-15"), Some(expected));
        assert_eq!(parse_date("2018/01/15"), Some(expected));
        assert_eq!(parse_date(" 2018-01-15 13:45:00 "), Some(expected));
        assert_eq!(parse_date("2018-01-15T08:00:00"), Some(expected));
        assert_eq!(parse_date("15/01/2018"), None);
        assert_eq!(parse_date(""), None);
    }

    #[test]
    fn test_parse_flag() {
        assert_eq!(parse_flag("1"), Some(true));
        assert_eq!(parse_flag("0.0"), Some(false));
        assert_eq!(parse_flag("True"), Some(true));
        assert_eq!(parse_flag("2"), None);
    }

    #[test]
    fn test_parse_score() {
        assert_eq!(parse_score("0.25"), Some(0.25));
        assert_eq!(parse_score("true"), Some(1.0));
        assert_eq!(parse_score("NaN"), None);
        assert_eq!(parse_score("abc"), None);
    }

    #[test]
    fn test_approx_eq() {
        assert!(approx_eq(0.1 + 0.2, 0.3, 1e-12));
        assert!(!approx_eq(1.0, 1.1, 0.05));
    }
}
