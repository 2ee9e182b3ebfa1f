//! Command line arguments layered over the loaded configuration.

use baitscope_common::{parse_date, Category, Indicator, KeyOrder, SmoothingMode};
use baitscope_config::{Config, DataLayout};
use chrono::NaiveDate;
use clap::Parser;
use std::path::PathBuf;

/// Filter, bucket and smooth headline indicators into dashboard charts
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Configuration file path (TOML or YAML)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Delimited data file to load
    #[arg(short, long)]
    pub data: Option<PathBuf>,

    /// Row layout of the data file: articles or counts
    #[arg(long, value_parser = parse_layout)]
    pub layout: Option<DataLayout>,

    /// First day shown (defaults to the configured start, 2018-01-01)
    #[arg(long, value_parser = parse_date_arg)]
    pub start: Option<NaiveDate>,

    /// Start at the earliest date in the data instead of the configured start
    #[arg(long, conflicts_with = "start")]
    pub open_start: bool,

    /// Last day shown (defaults to the data maximum)
    #[arg(long, value_parser = parse_date_arg)]
    pub end: Option<NaiveDate>,

    /// Publisher to keep; repeat for several
    #[arg(long = "publisher", value_name = "NAME")]
    pub publishers: Vec<String>,

    /// Categories to keep, comma separated
    #[arg(long = "category", value_delimiter = ',')]
    pub categories: Vec<Category>,

    /// Indicators to plot as trends, comma separated
    #[arg(long = "indicator", value_delimiter = ',')]
    pub indicators: Vec<Indicator>,

    /// EWMA smoothing factor in (0, 1]
    #[arg(long, conflicts_with_all = ["window", "no_smoothing"])]
    pub alpha: Option<f64>,

    /// Trailing mean window in months
    #[arg(long, conflicts_with = "no_smoothing")]
    pub window: Option<usize>,

    /// Plot raw monthly values
    #[arg(long)]
    pub no_smoothing: bool,

    /// Series order: lexical or first-seen
    #[arg(long)]
    pub key_order: Option<KeyOrder>,

    /// Indicator plotted per day
    #[arg(long)]
    pub daily_metric: Option<Indicator>,

    /// Write the dashboard view here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Pretty-print the JSON view
    #[arg(long)]
    pub pretty: bool,

    /// Log level (overrides the configured level)
    #[arg(short, long)]
    pub log_level: Option<String>,
}

impl Args {
    /// Smoothing selected on the command line, if any.
    pub fn smoothing(&self) -> Option<SmoothingMode> {
        if self.no_smoothing {
            Some(SmoothingMode::None)
        } else if let Some(alpha) = self.alpha {
            Some(SmoothingMode::Ewma { alpha })
        } else {
            self.window.map(|window| SmoothingMode::Rolling { window })
        }
    }

    /// Overrides `config` with every flag that was given.
    pub fn apply(&self, config: &mut Config) {
        if let Some(path) = &self.data {
            config.data.path.clone_from(path);
        }
        if let Some(layout) = self.layout {
            config.data.layout = layout;
        }
        if self.open_start {
            config.filters.start_date = None;
        } else if self.start.is_some() {
            config.filters.start_date = self.start;
        }
        if self.end.is_some() {
            config.filters.end_date = self.end;
        }
        if !self.publishers.is_empty() {
            config.filters.publishers = Some(self.publishers.clone());
        }
        if !self.categories.is_empty() {
            config.filters.categories = Some(self.categories.clone());
        }
        if !self.indicators.is_empty() {
            config.filters.indicators = Some(self.indicators.clone());
        }
        if let Some(smoothing) = self.smoothing() {
            config.smoothing = smoothing;
        }
        if let Some(order) = self.key_order {
            config.aggregation.key_order = order;
        }
        if let Some(metric) = self.daily_metric {
            config.aggregation.daily_metric = metric;
        }
        if let Some(level) = &self.log_level {
            config.logging.level.clone_from(level);
        }
    }
}

fn parse_date_arg(input: &str) -> Result<NaiveDate, String> {
    parse_date(input).ok_or_else(|| format!("'{input}' is not a date, expected YYYY-MM-DD"))
}

fn parse_layout(input: &str) -> Result<DataLayout, String> {
    match input.trim().to_ascii_lowercase().as_str() {
        "articles" => Ok(DataLayout::Articles),
        "counts" => Ok(DataLayout::Counts),
        other => Err(format!("unknown layout '{other}', expected articles or counts")),
    }
}
