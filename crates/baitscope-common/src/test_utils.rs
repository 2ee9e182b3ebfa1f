//! Test utilities and shared test helpers for Baitscope.
//!
//! Fixtures here are plain data (dates, vocabularies, CSV text) so every crate
//! in the workspace can build its own domain values from them.

use crate::{Category, Indicator, YearMonth};
use chrono::NaiveDate;
use std::sync::Once;
use tracing_subscriber::{fmt, EnvFilter};

/// Initialize test logging once per test run.
static INIT: Once = Once::new();

/// Initialize logging for tests with a sensible default configuration.
/// This function is safe to call multiple times and will only initialize once.
pub fn init_test_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

        let _ = fmt().with_test_writer().with_env_filter(filter).try_init();
    });
}

/// Shorthand for a calendar date.
pub fn date(year: i32, month: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(year, month, day).expect("valid fixture date")
}

/// Shorthand for a calendar month.
pub fn month(year: i32, month: u32) -> YearMonth {
    YearMonth::new(year, month).expect("valid fixture month")
}

/// Assert that two floating point numbers are approximately equal within a tolerance.
pub fn assert_approx_eq(left: f64, right: f64, tolerance: f64) {
    let diff = (left - right).abs();
    assert!(
        diff <= tolerance,
        "assertion failed: `{left}` is not approximately equal to `{right}` (tolerance: {tolerance}, diff: {diff})"
    );
}

/// Assert that two slices agree elementwise within a tolerance.
pub fn assert_all_approx_eq(left: &[f64], right: &[f64], tolerance: f64) {
    assert_eq!(left.len(), right.len(), "length mismatch: {left:?} vs {right:?}");
    for (l, r) in left.iter().zip(right) {
        assert_approx_eq(*l, *r, tolerance);
    }
}

/// Headline dataset fixtures written in the processed CSV layout.
pub mod csv_fixtures {
    use super::*;

    /// Header with every required column, indicators in vocabulary order.
    pub fn full_header() -> String {
        let mut columns = vec!["Date", "Press", "Category", "IsClickbait"];
        columns.extend(Indicator::ALL.iter().map(|i| i.as_str()));
        columns.join(",")
    }

    /// One CSV line for [`full_header`]; `emotional` receives `emotional`, other indicators 0.
    pub fn full_row(date: &str, press: &str, category: Category, clickbait: u8, emotional: f64) -> String {
        let mut fields = vec![
            date.to_string(),
            press.to_string(),
            category.as_str().to_string(),
            clickbait.to_string(),
        ];
        fields.extend(Indicator::ALL.iter().map(|i| {
            if *i == Indicator::Emotional {
                emotional.to_string()
            } else {
                "0".to_string()
            }
        }));
        fields.join(",")
    }

    /// Small dataset spanning two publishers and three months.
    pub fn small_dataset() -> String {
        let rows = [
            full_row("2017-12-30", "Apple Daily", Category::Politics, 1, 1.0),
            full_row("2018-01-15", "Apple Daily", Category::Politics, 1, 1.0),
            full_row("2018-01-20", "Apple Daily", Category::Finance, 0, 0.0),
            full_row("2018-02-01", "Liberty Times", Category::Politics, 1, 0.5),
            full_row("2018-02-11", "Liberty Times", Category::Tech, 0, 0.0),
            full_row("2018-03-03", "Apple Daily", Category::Tech, 1, 1.0),
        ];
        let mut text = full_header();
        for row in rows {
            text.push('\n');
            text.push_str(&row);
        }
        text.push('\n');
        text
    }

    /// Count-based layout: one row per (publisher, category, date) with two counters.
    pub fn count_dataset() -> &'static str {
        concat!(
            "Date,Press,Category,clickbait_count,total_count\n",
            "2018-01-03,Apple Daily,politics,2,5\n",
            "2018-01-19,Apple Daily,politics,1,1\n",
            "2018-02-07,Liberty Times,tech,0,4\n",
            "2018-02-08,Liberty Times,tech,0,0\n",
        )
    }
}

/// Property-based testing strategies.
#[cfg(feature = "proptest")]
pub mod property_testing {
    use super::*;
    use proptest::prelude::*;

    /// Dates between 2017-01-01 and 2019-12-31.
    pub fn date_strategy() -> impl Strategy<Value = NaiveDate> {
        (0i64..1095).prop_map(|offset| date(2017, 1, 1) + chrono::Duration::days(offset))
    }

    /// Any category.
    pub fn category_strategy() -> impl Strategy<Value = Category> {
        proptest::sample::select(Category::ALL.to_vec())
    }

    /// Any indicator.
    pub fn indicator_strategy() -> impl Strategy<Value = Indicator> {
        proptest::sample::select(Indicator::ALL.to_vec())
    }

    /// One of a handful of outlet names.
    pub fn publisher_name_strategy() -> impl Strategy<Value = &'static str> {
        proptest::sample::select(vec!["Apple Daily", "Liberty Times", "UDN", "ETtoday", "China Times"])
    }

    /// EWMA smoothing factors in (0, 1].
    pub fn alpha_strategy() -> impl Strategy<Value = f64> {
        (1u32..=1000).prop_map(|n| f64::from(n) / 1000.0)
    }
}
