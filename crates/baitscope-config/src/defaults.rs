//! Default values for every configuration section.

use crate::schema::*;
use baitscope_common::{Category, Indicator, KeyOrder, LoggingConfig, SmoothingMode};
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// First day the dashboard shows unless told otherwise.
pub const DEFAULT_START_DATE: (i32, u32, u32) = (2018, 1, 1);

impl Default for Config {
    fn default() -> Self {
        Self {
            data: DataConfig::default(),
            filters: FilterDefaults::default(),
            smoothing: SmoothingMode::default(),
            aggregation: AggregationSettings::default(),
            cache: CacheSettings::default(),
            palette: PaletteConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("processed_data.csv"),
            layout: DataLayout::Articles,
            delimiter: ',',
            columns: ColumnsConfig::default(),
        }
    }
}

impl Default for ColumnsConfig {
    fn default() -> Self {
        Self {
            date: "Date".to_string(),
            publisher: "Press".to_string(),
            category: "Category".to_string(),
            clickbait: "IsClickbait".to_string(),
            clickbait_count: "clickbait_count".to_string(),
            total_count: "total_count".to_string(),
            indicators: Indicator::ALL.to_vec(),
        }
    }
}

impl Default for FilterDefaults {
    fn default() -> Self {
        let (year, month, day) = DEFAULT_START_DATE;
        Self {
            start_date: NaiveDate::from_ymd_opt(year, month, day),
            end_date: None,
            publishers: None,
            categories: None,
            indicators: None,
        }
    }
}

impl Default for AggregationSettings {
    fn default() -> Self {
        Self {
            key_order: KeyOrder::Lexical,
            daily_metric: Indicator::Emotional,
        }
    }
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            max_capacity: 256,
            max_age_seconds: None,
        }
    }
}

impl Default for PaletteConfig {
    fn default() -> Self {
        let mut colors = BTreeMap::new();

        let category_colors = [
            (Category::Politics, "#1f77b4"),
            (Category::Finance, "#ff7f0e"),
            (Category::Entertainment, "#2ca02c"),
            (Category::Health, "#d62728"),
            (Category::Life, "#9467bd"),
            (Category::Tech, "#8c564b"),
            (Category::Global, "#e377c2"),
        ];
        for (category, color) in category_colors {
            colors.insert(category.as_str().to_string(), color.to_string());
        }

        let indicator_colors = [
            (Indicator::ForwardReferencing, "#636efa"),
            (Indicator::Emotional, "#ef553b"),
            (Indicator::Interrogative, "#00cc96"),
            (Indicator::Surprise, "#ab63fa"),
            (Indicator::Ellipsis, "#ffa15a"),
            (Indicator::List, "#19d3f3"),
            (Indicator::HowTo, "#ff6692"),
            (Indicator::Interjection, "#b6e880"),
            (Indicator::SpillTheBeans, "#ff97ff"),
            (Indicator::Gossip, "#fecb52"),
            (Indicator::EndingWords, "#7f7f7f"),
            (Indicator::Netizen, "#bcbd22"),
            (Indicator::Exaggerated, "#17becf"),
            (Indicator::Uncertainty, "#aec7e8"),
        ];
        for (indicator, color) in indicator_colors {
            colors.insert(indicator.as_str().to_string(), color.to_string());
        }

        colors.insert("clickbait".to_string(), "#d62728".to_string());

        Self {
            colors,
            fallback: vec![
                "#4c78a8".to_string(),
                "#f58518".to_string(),
                "#54a24b".to_string(),
                "#e45756".to_string(),
                "#72b7b2".to_string(),
                "#eeca3b".to_string(),
                "#b279a2".to_string(),
                "#ff9da6".to_string(),
            ],
        }
    }
}
