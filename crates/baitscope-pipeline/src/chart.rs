//! Chart payloads: ordered (key, x, y) triples plus a key to color table

use crate::aggregator::{DailyPoint, GroupRatio};
use crate::palette::Palette;
use crate::selector::DateInterval;
use crate::smoother::SmoothedSeries;
use crate::source::SourceId;
use baitscope_common::{format_date, Result, SmoothingMode};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Supported chart types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    /// Bars, one per key.
    Bar,
    /// Lines, one per key.
    Line,
}

/// One plotted value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChartPoint {
    /// Series or group the point belongs to.
    pub key: String,
    /// Category, month or day label.
    pub x: String,
    /// Plotted value.
    pub y: f64,
}

/// Data handed to the rendering sink for one chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    /// Stable identifier, such as `clickbait_by_category`.
    pub id: String,
    /// Human-readable title.
    pub title: String,
    /// Bar or line.
    pub kind: ChartKind,
    /// Horizontal axis label.
    pub x_label: String,
    /// Vertical axis label.
    pub y_label: String,
    /// Points grouped by key, in plotting order.
    pub points: Vec<ChartPoint>,
    /// Display color per key.
    pub colors: BTreeMap<String, String>,
}

impl Chart {
    /// Empty chart with its labels set.
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        kind: ChartKind,
        x_label: impl Into<String>,
        y_label: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            kind,
            x_label: x_label.into(),
            y_label: y_label.into(),
            points: Vec::new(),
            colors: BTreeMap::new(),
        }
    }

    /// One bar per group, colored by group key.
    #[must_use]
    pub fn with_groups(mut self, groups: &[GroupRatio], palette: &Palette) -> Self {
        self.points = groups
            .iter()
            .map(|g| ChartPoint {
                key: g.key.clone(),
                x: g.key.clone(),
                y: g.value,
            })
            .collect();
        self.colors = palette.assign(groups.iter().map(|g| g.key.as_str()));
        self
    }

    /// A single line over calendar days, keyed by `key`.
    #[must_use]
    pub fn with_daily(mut self, key: &str, points: &[DailyPoint], palette: &Palette) -> Self {
        self.points = points
            .iter()
            .map(|p| ChartPoint {
                key: key.to_string(),
                x: format_date(p.date),
                y: p.value,
            })
            .collect();
        if !points.is_empty() {
            self.colors = palette.assign([key]);
        }
        self
    }

    /// One line per smoothed series over months, plotting the smoothed value.
    #[must_use]
    pub fn with_series(mut self, series: &[SmoothedSeries], palette: &Palette) -> Self {
        self.points = series
            .iter()
            .flat_map(|s| {
                s.points.iter().map(move |p| ChartPoint {
                    key: s.key.clone(),
                    x: p.month.to_string(),
                    y: p.smoothed,
                })
            })
            .collect();
        self.colors = palette.assign(series.iter().map(|s| s.key.as_str()));
        self
    }

    /// Distinct keys in plotting order.
    pub fn keys(&self) -> Vec<&str> {
        let mut keys: Vec<&str> = Vec::new();
        for point in &self.points {
            if !keys.contains(&point.key.as_str()) {
                keys.push(&point.key);
            }
        }
        keys
    }

    /// Whether nothing is plotted.
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Everything one dashboard pass produced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardView {
    /// Dataset the charts were built from.
    pub source: SourceId,
    /// Resolved date interval, `None` when the dataset gave nothing to resolve it from.
    pub interval: Option<DateInterval>,
    /// Smoothing applied to the monthly lines.
    pub smoothing: SmoothingMode,
    /// Articles covered by the selection.
    pub article_count: u64,
    /// Charts in display order.
    pub charts: Vec<Chart>,
}

impl DashboardView {
    /// Chart with the given id.
    pub fn chart(&self, id: &str) -> Option<&Chart> {
        self.charts.iter().find(|c| c.id == id)
    }

    /// Serializes the view for the rendering sink.
    pub fn to_json(&self, pretty: bool) -> Result<String> {
        let json = if pretty {
            serde_json::to_string_pretty(self)?
        } else {
            serde_json::to_string(self)?
        };
        Ok(json)
    }
}
