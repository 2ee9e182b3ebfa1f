//! Integration tests for baitscope-config crate.

use baitscope_common::{Category, Indicator, KeyOrder, SmoothingMode};
use baitscope_config::{Config, ConfigCache, ConfigError, ConfigLoader, DataLayout};
use chrono::NaiveDate;
use std::io::Write;

fn write_config(suffix: &str, content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("Failed to create temporary file");
    file.write_all(content.as_bytes()).unwrap();
    file
}

#[test]
fn test_default_config_validation() {
    let mut config = Config::default();
    assert!(config.validate().is_ok());
    assert_eq!(config.filters.start_date, NaiveDate::from_ymd_opt(2018, 1, 1));
    assert_eq!(config.data.columns.indicators.len(), Indicator::COUNT);

    config.smoothing = SmoothingMode::Ewma { alpha: 1.5 };
    assert!(config.validate().is_err());

    config.smoothing = SmoothingMode::Rolling { window: 0 };
    assert!(config.validate().is_err());
}

#[test]
fn test_reversed_default_range_is_rejected() {
    let mut config = Config::default();
    config.filters.start_date = NaiveDate::from_ymd_opt(2019, 1, 1);
    config.filters.end_date = NaiveDate::from_ymd_opt(2018, 1, 1);
    assert!(config.validate().is_err());
}

#[test]
fn test_bad_palette_color_is_rejected() {
    let mut config = Config::default();
    config
        .palette
        .colors
        .insert("politics".to_string(), "blue".to_string());
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("politics"));
}

#[test]
fn test_load_toml_file() {
    let file = write_config(
        ".toml",
        r#"
[data]
path = "headlines.csv"
layout = "counts"

[data.columns]
publisher = "Media"

[filters]
start_date = "2018-02-01"
end_date = "2018-06-30"
categories = ["politics", "tech"]

[smoothing]
mode = "rolling"
window = 4

[aggregation]
key_order = "first_seen"
"#,
    );

    let config = ConfigLoader::load_config(file.path()).unwrap();
    assert_eq!(config.data.path.to_str(), Some("headlines.csv"));
    assert_eq!(config.data.layout, DataLayout::Counts);
    assert_eq!(config.data.columns.publisher, "Media");
    assert_eq!(config.data.columns.date, "Date");
    assert_eq!(
        config.filters.categories,
        Some(vec![Category::Politics, Category::Tech])
    );
    assert_eq!(config.smoothing, SmoothingMode::Rolling { window: 4 });
    assert_eq!(config.aggregation.key_order, KeyOrder::FirstSeen);
    assert!(config.cache.enabled);
}

#[test]
fn test_load_yaml_file() {
    let file = write_config(
        ".yaml",
        r#"
data:
  path: "processed_data.csv"
smoothing:
  mode: ewma
  alpha: 0.25
filters:
  indicators: [emotional, "forward-referencing"]
"#,
    );

    let config = ConfigLoader::load_config(file.path()).unwrap();
    assert_eq!(config.smoothing, SmoothingMode::Ewma { alpha: 0.25 });
    assert_eq!(
        config.filters.indicators,
        Some(vec![Indicator::Emotional, Indicator::ForwardReferencing])
    );
}

#[test]
fn test_invalid_file_fails_validation() {
    let file = write_config(
        ".toml",
        r#"
[smoothing]
mode = "ewma"
alpha = 0.0
"#,
    );

    let err = ConfigLoader::load_config(file.path()).unwrap_err();
    assert!(matches!(err, ConfigError::ValidationError(_)));
}

#[test]
fn test_config_cache() {
    let config = Config::default();
    let cache = ConfigCache::new(config.clone());

    let cached_config = cache.get();
    assert_eq!(cached_config.data.path, config.data.path);

    let mut new_config = config.clone();
    new_config.smoothing = SmoothingMode::Rolling { window: 3 };
    cache.update(new_config).unwrap();
    assert_eq!(cache.get().smoothing, SmoothingMode::Rolling { window: 3 });

    // An invalid replacement leaves the active configuration untouched
    let mut broken = config;
    broken.palette.fallback.clear();
    assert!(cache.update(broken).is_err());
    assert_eq!(cache.get().smoothing, SmoothingMode::Rolling { window: 3 });
}
