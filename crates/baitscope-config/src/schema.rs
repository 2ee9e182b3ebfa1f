//! Configuration schema definitions using serde.

use baitscope_common::{
    BaitscopeError, Category, Indicator, KeyOrder, LoggingConfig, SmoothingMode,
};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::validator::is_hex_color;

/// Main configuration structure for Baitscope.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Data source configuration.
    pub data: DataConfig,
    /// Filter values applied when the caller supplies none.
    pub filters: FilterDefaults,
    /// Smoothing applied to monthly series.
    pub smoothing: SmoothingMode,
    /// Aggregation settings.
    pub aggregation: AggregationSettings,
    /// Result cache settings.
    pub cache: CacheSettings,
    /// Key to display-color table.
    pub palette: PaletteConfig,
    /// Logging configuration.
    pub logging: LoggingConfig,
}

/// Shape of the rows in the data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DataLayout {
    /// One row per article with a 0/1 clickbait flag.
    Articles,
    /// One row per (publisher, category, date) with clickbait and total counters.
    Counts,
}

/// Data source configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DataConfig {
    /// Path to the delimited file.
    pub path: PathBuf,
    /// Row layout of the file.
    pub layout: DataLayout,
    /// Field delimiter.
    pub delimiter: char,
    /// Column names.
    pub columns: ColumnsConfig,
}

/// Column names of the processed dataset.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct ColumnsConfig {
    /// Publication date column.
    pub date: String,
    /// Publisher column.
    pub publisher: String,
    /// Category column.
    pub category: String,
    /// Clickbait flag column (articles layout).
    pub clickbait: String,
    /// Clickbait counter column (counts layout).
    pub clickbait_count: String,
    /// Article counter column (counts layout).
    pub total_count: String,
    /// Indicator columns that must be present, named after the indicator.
    pub indicators: Vec<Indicator>,
}

/// Filter values used when the caller supplies none.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterDefaults {
    /// First day of the displayed range, 2018-01-01 by default.
    ///
    /// Cleared (dataset minimum) through `BAITSCOPE_START_DATE=open` or the
    /// command line; a missing key in a file keeps the default.
    pub start_date: Option<NaiveDate>,
    /// Last day of the displayed range; dataset maximum when absent.
    pub end_date: Option<NaiveDate>,
    /// Publisher allow-list; unconstrained when absent.
    pub publishers: Option<Vec<String>>,
    /// Category allow-list; unconstrained when absent.
    pub categories: Option<Vec<Category>>,
    /// Indicators charted; every loaded indicator when absent.
    pub indicators: Option<Vec<Indicator>>,
}

/// Aggregation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AggregationSettings {
    /// Order of grouped series.
    pub key_order: KeyOrder,
    /// Indicator plotted as the daily time series.
    pub daily_metric: Indicator,
}

/// Result cache settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// Whether selector and aggregator results are memoized.
    pub enabled: bool,
    /// Maximum number of memoized results.
    pub max_capacity: u64,
    /// Age after which an entry is recomputed; never when absent.
    pub max_age_seconds: Option<u64>,
}

/// Display colors keyed by series key.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PaletteConfig {
    /// Fixed colors for known keys (categories, indicators, publishers, "clickbait").
    pub colors: BTreeMap<String, String>,
    /// Colors cycled through for keys without a fixed color.
    pub fallback: Vec<String>,
}

impl Config {
    /// Validates the configuration.
    pub fn validate(&self) -> Result<(), BaitscopeError> {
        if self.data.path.as_os_str().is_empty() {
            return Err(BaitscopeError::config("Data source path cannot be empty"));
        }

        if !self.data.delimiter.is_ascii() {
            return Err(BaitscopeError::config(format!(
                "Delimiter '{}' must be a single ASCII character",
                self.data.delimiter
            )));
        }

        self.data.columns.validate()?;

        self.smoothing
            .validate()
            .map_err(|e| BaitscopeError::config_with_source("Invalid smoothing settings", e))?;

        if let (Some(start), Some(end)) = (self.filters.start_date, self.filters.end_date) {
            if start > end {
                return Err(BaitscopeError::config(format!(
                    "Default start date {start} is after default end date {end}"
                )));
            }
        }

        if self.cache.enabled && self.cache.max_capacity == 0 {
            return Err(BaitscopeError::config(
                "Cache capacity must be positive when caching is enabled",
            ));
        }

        for (key, color) in &self.palette.colors {
            if !is_hex_color(color) {
                return Err(BaitscopeError::config(format!(
                    "Color '{color}' for '{key}' is not a #RRGGBB hex color"
                )));
            }
        }

        if self.palette.fallback.is_empty() {
            return Err(BaitscopeError::config("Fallback palette cannot be empty"));
        }

        if let Some(color) = self.palette.fallback.iter().find(|c| !is_hex_color(c)) {
            return Err(BaitscopeError::config(format!(
                "Fallback color '{color}' is not a #RRGGBB hex color"
            )));
        }

        Ok(())
    }
}

impl ColumnsConfig {
    fn validate(&self) -> Result<(), BaitscopeError> {
        let named = [
            ("date", &self.date),
            ("publisher", &self.publisher),
            ("category", &self.category),
            ("clickbait", &self.clickbait),
            ("clickbait_count", &self.clickbait_count),
            ("total_count", &self.total_count),
        ];

        if let Some((field, _)) = named.iter().find(|(_, name)| name.trim().is_empty()) {
            return Err(BaitscopeError::config(format!(
                "Column name for '{field}' cannot be empty"
            )));
        }

        Ok(())
    }
}
