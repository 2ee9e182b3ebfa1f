//! Configuration loading utilities

use crate::{Config, DataLayout};
use baitscope_common::{BaitscopeError, Indicator, LogFormat, SmoothingMode};
use chrono::NaiveDate;
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_VAR: &str = "BAITSCOPE_CONFIG_PATH";

/// Configuration loading errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O error when reading configuration file
    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    /// TOML parsing error
    #[error("Failed to parse TOML configuration: {0}")]
    TomlError(#[from] toml::de::Error),

    /// YAML parsing error
    #[error("Failed to parse YAML configuration: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// File extension is neither TOML nor YAML
    #[error("Unsupported configuration format '{0}', expected .toml, .yaml or .yml")]
    UnsupportedFormat(String),

    /// Configuration validation error
    #[error("Configuration validation failed: {0}")]
    ValidationError(#[source] BaitscopeError),

    /// Environment variable parsing error
    #[error("Failed to parse environment variable '{var}': {message}")]
    EnvParseError {
        /// Variable name.
        var: String,
        /// What was wrong with its value.
        message: String,
    },
}

impl From<ConfigError> for BaitscopeError {
    fn from(err: ConfigError) -> Self {
        BaitscopeError::config_with_source("Configuration loading failed", err)
    }
}

/// Configuration loader for the application
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from a TOML or YAML file with environment variable overrides
    pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let mut config = Self::parse(path, &content)?;
        info!("Loaded configuration from {}", path.display());

        Self::apply_env_overrides(&mut config)?;

        config.validate().map_err(ConfigError::ValidationError)?;

        Ok(config)
    }

    /// Load configuration from the environment and well-known file names
    pub fn load() -> baitscope_common::Result<Config> {
        let config = if let Ok(config_path) = env::var(CONFIG_PATH_VAR) {
            Self::load_config(&config_path)?
        } else if let Some(found) = ["baitscope.toml", "baitscope.yaml", "baitscope.yml"]
            .into_iter()
            .map(Path::new)
            .find(|p| p.exists())
        {
            Self::load_config(found)?
        } else {
            debug!("No configuration file found, using defaults");
            let mut config = Config::default();
            Self::apply_env_overrides(&mut config)?;
            config.validate().map_err(ConfigError::ValidationError)?;
            config
        };

        Ok(config)
    }

    /// Parse configuration text, choosing the format from the file extension
    pub fn parse(path: &Path, content: &str) -> Result<Config, ConfigError> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();

        match extension.as_str() {
            "toml" => Ok(toml::from_str(content)?),
            "yaml" | "yml" => Ok(serde_yaml::from_str(content)?),
            other => Err(ConfigError::UnsupportedFormat(other.to_string())),
        }
    }

    /// Apply `BAITSCOPE_*` environment variable overrides to configuration
    pub fn apply_env_overrides(config: &mut Config) -> Result<(), ConfigError> {
        Self::apply_overrides_from(config, |var| env::var(var).ok())
    }

    /// Apply overrides read through `lookup`, so callers can supply their own source
    pub fn apply_overrides_from<F>(config: &mut Config, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("BAITSCOPE_DATA_PATH") {
            config.data.path = PathBuf::from(path);
        }

        if let Some(layout) = lookup("BAITSCOPE_DATA_LAYOUT") {
            config.data.layout = match layout.trim().to_ascii_lowercase().as_str() {
                "articles" => DataLayout::Articles,
                "counts" => DataLayout::Counts,
                _ => return Err(env_error("BAITSCOPE_DATA_LAYOUT", format!("unknown layout '{layout}'"))),
            };
        }

        if let Some(start) = lookup("BAITSCOPE_START_DATE") {
            config.filters.start_date = parse_open_date("BAITSCOPE_START_DATE", &start)?;
        }

        if let Some(end) = lookup("BAITSCOPE_END_DATE") {
            config.filters.end_date = parse_open_date("BAITSCOPE_END_DATE", &end)?;
        }

        if let Some(indicators) = lookup("BAITSCOPE_INDICATORS") {
            let parsed = indicators
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::parse::<Indicator>)
                .collect::<Result<Vec<_>, _>>()
                .map_err(|e| env_error("BAITSCOPE_INDICATORS", e.to_string()))?;
            config.filters.indicators = Some(parsed);
        }

        if let Some(alpha) = lookup("BAITSCOPE_ALPHA") {
            let alpha = alpha
                .trim()
                .parse::<f64>()
                .map_err(|e| env_error("BAITSCOPE_ALPHA", e.to_string()))?;
            config.smoothing = SmoothingMode::Ewma { alpha };
        }

        if let Some(window) = lookup("BAITSCOPE_WINDOW") {
            let window = window
                .trim()
                .parse::<usize>()
                .map_err(|e| env_error("BAITSCOPE_WINDOW", e.to_string()))?;
            config.smoothing = SmoothingMode::Rolling { window };
        }

        if let Some(enabled) = lookup("BAITSCOPE_CACHE_ENABLED") {
            config.cache.enabled = enabled
                .trim()
                .parse()
                .map_err(|e: std::str::ParseBoolError| env_error("BAITSCOPE_CACHE_ENABLED", e.to_string()))?;
        }

        if let Some(level) = lookup("BAITSCOPE_LOG_LEVEL") {
            config.logging.level = level;
        }

        if let Some(format) = lookup("BAITSCOPE_LOG_FORMAT") {
            config.logging.format = match format.trim().to_ascii_lowercase().as_str() {
                "pretty" => LogFormat::Pretty,
                "compact" => LogFormat::Compact,
                "json" => LogFormat::Json,
                _ => return Err(env_error("BAITSCOPE_LOG_FORMAT", format!("unknown log format '{format}'"))),
            };
        }

        Ok(())
    }
}

fn env_error(var: &str, message: impl Into<String>) -> ConfigError {
    ConfigError::EnvParseError {
        var: var.to_string(),
        message: message.into(),
    }
}

/// `open` clears the bound so it falls back to the dataset span.
fn parse_open_date(var: &str, value: &str) -> Result<Option<NaiveDate>, ConfigError> {
    if value.trim().eq_ignore_ascii_case("open") {
        return Ok(None);
    }
    parse_env_date(var, value).map(Some)
}

fn parse_env_date(var: &str, value: &str) -> Result<NaiveDate, ConfigError> {
    baitscope_common::parse_date(value)
        .ok_or_else(|| env_error(var, format!("invalid date '{value}'")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |var| map.get(var).cloned()
    }

    #[test]
    fn test_open_start_clears_default() {
        let mut config = Config::default();
        assert!(config.filters.start_date.is_some());

        ConfigLoader::apply_overrides_from(&mut config, lookup_from(&[("BAITSCOPE_START_DATE", "open")]))
            .unwrap();
        assert_eq!(config.filters.start_date, None);

        let bad = ConfigLoader::apply_overrides_from(&mut config, lookup_from(&[("BAITSCOPE_END_DATE", "later")]));
        assert!(matches!(bad, Err(ConfigError::EnvParseError { .. })));
    }

    #[test]
    fn test_parse_errors_keep_their_format() {
        let toml_err = ConfigLoader::parse(Path::new("bad.toml"), "[data\n").unwrap_err();
        assert!(matches!(toml_err, ConfigError::TomlError(_)));
        let yaml_err = ConfigLoader::parse(Path::new("bad.yml"), "data: [unclosed").unwrap_err();
        assert!(matches!(yaml_err, ConfigError::YamlError(_)));

        let err: BaitscopeError = toml_err.into();
        assert!(err.to_string().starts_with("Configuration error"));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_overrides_replace_smoothing_and_range() {
        let mut config = Config::default();
        let lookup = lookup_from(&[
            ("BAITSCOPE_WINDOW", "4"),
            ("BAITSCOPE_START_DATE", "2018-03-01"),
            ("BAITSCOPE_INDICATORS", "emotional, gossip"),
        ]);

        ConfigLoader::apply_overrides_from(&mut config, lookup).unwrap();

        assert_eq!(config.smoothing, SmoothingMode::Rolling { window: 4 });
        assert_eq!(config.filters.start_date, NaiveDate::from_ymd_opt(2018, 3, 1));
        assert_eq!(
            config.filters.indicators,
            Some(vec![Indicator::Emotional, Indicator::Gossip])
        );
    }

    #[test]
    fn test_invalid_override_reports_variable() {
        let mut config = Config::default();
        let err = ConfigLoader::apply_overrides_from(&mut config, lookup_from(&[("BAITSCOPE_ALPHA", "high")]))
            .unwrap_err();
        assert!(err.to_string().contains("BAITSCOPE_ALPHA"));
    }

    #[test]
    fn test_unsupported_extension() {
        let err = ConfigLoader::parse(Path::new("config.ini"), "").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedFormat(ext) if ext == "ini"));
    }
}
