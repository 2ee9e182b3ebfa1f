//! One dashboard pass: select, aggregate, smooth and assemble the charts

use crate::aggregator::{
    checked_total, DailyAggregator, DailyPoint, DataAggregator, GroupRatio, IndicatorTrendsAggregator,
    MonthlyAggregator, OverallAggregator, Series,
};
use crate::cache::{CachedData, Query, QueryCache, QueryKey};
use crate::chart::{Chart, ChartKind, DashboardView};
use crate::palette::Palette;
use crate::record::{Measured, Record};
use crate::selector::{select, DateInterval, Selection};
use crate::smoother::smooth_all;
use crate::source::Dataset;
use baitscope_common::{BaitscopeError, Category, Dimension, Indicator, KeyOrder, Metric, Publisher, Result, SmoothingMode};
use baitscope_config::Config;
use chrono::NaiveDate;
use std::cell::OnceCell;
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Filters and presentation settings for one pass.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardRequest {
    /// First day shown; the dataset minimum when `None`.
    pub start: Option<NaiveDate>,
    /// Last day shown; the dataset maximum when `None`.
    pub end: Option<NaiveDate>,
    /// Publisher allow-list; unconstrained when `None`.
    pub publishers: Option<Vec<Publisher>>,
    /// Category allow-list; unconstrained when `None`.
    pub categories: Option<Vec<Category>>,
    /// Indicators charted as trends; every loaded indicator when `None`.
    pub indicators: Option<Vec<Indicator>>,
    /// Smoothing applied to the monthly lines.
    pub smoothing: SmoothingMode,
    /// Order of keys within each chart.
    pub key_order: KeyOrder,
    /// Indicator plotted per day.
    pub daily_metric: Indicator,
}

impl DashboardRequest {
    /// Request built from the configured defaults.
    pub fn from_config(config: &Config) -> Self {
        let filters = &config.filters;
        Self {
            start: filters.start_date,
            end: filters.end_date,
            publishers: filters
                .publishers
                .as_ref()
                .map(|names| names.iter().map(Publisher::new).collect()),
            categories: filters.categories.clone(),
            indicators: filters.indicators.clone(),
            smoothing: config.smoothing,
            key_order: config.aggregation.key_order,
            daily_metric: config.aggregation.daily_metric,
        }
    }
}

impl Default for DashboardRequest {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

/// Runs dashboard passes over one shared dataset.
pub struct Dashboard<R = Record> {
    dataset: Arc<Dataset<R>>,
    palette: Palette,
    cache: Option<Arc<QueryCache>>,
}

impl<R> Dashboard<R>
where
    R: Measured + Clone,
{
    /// Dashboard over `dataset` without a result cache.
    pub fn new(dataset: Arc<Dataset<R>>, palette: Palette) -> Self {
        Self {
            dataset,
            palette,
            cache: None,
        }
    }

    /// Memoizes aggregation results in `cache`, which may be shared between dashboards.
    #[must_use]
    pub fn with_cache(mut self, cache: Arc<QueryCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Dataset the charts are built from.
    pub fn dataset(&self) -> &Arc<Dataset<R>> {
        &self.dataset
    }

    /// Result cache, if any.
    pub fn cache(&self) -> Option<&QueryCache> {
        self.cache.as_deref()
    }

    /// Selection for `request`, open bounds filled from the dataset span.
    ///
    /// `None` when a bound is open and the dataset is empty.
    pub fn selection(&self, request: &DashboardRequest) -> Option<Selection> {
        let interval = DateInterval::resolve(request.start, request.end, self.dataset.date_span())?;
        let mut selection = Selection::new(interval);
        if let Some(publishers) = &request.publishers {
            selection = selection.with_publishers(publishers.iter().cloned());
        }
        if let Some(categories) = &request.categories {
            selection = selection.with_categories(categories.iter().copied());
        }
        if let Some(indicators) = &request.indicators {
            selection = selection.with_indicators(indicators.iter().copied());
        }
        Some(selection)
    }

    /// Builds every chart for `request`.
    #[instrument(skip(self, request), fields(source = %self.dataset.source(), smoothing = %request.smoothing))]
    pub fn run(&self, request: &DashboardRequest) -> Result<DashboardView> {
        request.smoothing.validate()?;

        let Some(selection) = self.selection(request) else {
            debug!("Dataset is empty and the interval is open, nothing to chart");
            return Ok(DashboardView {
                source: self.dataset.source().clone(),
                interval: None,
                smoothing: request.smoothing,
                article_count: 0,
                charts: Vec::new(),
            });
        };

        let pass = Pass {
            dashboard: self,
            selection: &selection,
            selected: OnceCell::new(),
        };
        let order = request.key_order;
        let mut charts = Vec::new();

        let by_category = pass.groups(Dimension::Category, Metric::Clickbait, order)?;
        let article_count = checked_total(by_category.iter().map(|g| g.count))?;
        charts.push(
            Chart::new(
                "clickbait_by_category",
                "Clickbait ratio by category",
                ChartKind::Bar,
                "Category",
                "Clickbait ratio",
            )
            .with_groups(&by_category, &self.palette),
        );

        let by_publisher = pass.groups(Dimension::Publisher, Metric::Clickbait, order)?;
        charts.push(
            Chart::new(
                "clickbait_by_publisher",
                "Clickbait ratio by publisher",
                ChartKind::Bar,
                "Publisher",
                "Clickbait ratio",
            )
            .with_groups(&by_publisher, &self.palette),
        );

        let daily_metric = request.daily_metric;
        if self.dataset.has_indicator(daily_metric) {
            let daily = pass.daily(Metric::Indicator(daily_metric))?;
            charts.push(
                Chart::new(
                    format!("daily_{daily_metric}"),
                    format!("Daily mean of {daily_metric}"),
                    ChartKind::Line,
                    "Date",
                    format!("Mean {daily_metric}"),
                )
                .with_daily(daily_metric.as_str(), &daily, &self.palette),
            );
        } else {
            debug!("Indicator {} not loaded, skipping daily chart", daily_metric);
        }

        for (dimension, label) in [(Dimension::Publisher, "publisher"), (Dimension::Category, "category")] {
            let series = pass.monthly(dimension, Metric::Clickbait, order)?;
            let smoothed = smooth_all(&series, request.smoothing)?;
            charts.push(
                Chart::new(
                    format!("clickbait_trend_by_{label}"),
                    format!("Monthly clickbait ratio by {label} ({})", request.smoothing),
                    ChartKind::Line,
                    "Month",
                    "Clickbait ratio",
                )
                .with_series(&smoothed, &self.palette),
            );
        }

        if !self.dataset.indicators().is_empty() {
            let indicators = selection.indicator_metrics(self.dataset.indicators());
            let trends = pass.indicator_trends(indicators)?;
            let smoothed = smooth_all(&trends, request.smoothing)?;
            charts.push(
                Chart::new(
                    "indicator_trends",
                    format!("Monthly indicator means ({})", request.smoothing),
                    ChartKind::Line,
                    "Month",
                    "Mean score",
                )
                .with_series(&smoothed, &self.palette),
            );
        }

        info!(
            "Built {} charts over {} articles in {}",
            charts.len(),
            article_count,
            selection.interval
        );

        Ok(DashboardView {
            source: self.dataset.source().clone(),
            interval: Some(selection.interval),
            smoothing: request.smoothing,
            article_count,
            charts,
        })
    }
}

/// State of one [`Dashboard::run`]: the selection is computed at most once,
/// and only if some query misses the cache.
struct Pass<'a, R> {
    dashboard: &'a Dashboard<R>,
    selection: &'a Selection,
    selected: OnceCell<Vec<R>>,
}

impl<R> Pass<'_, R>
where
    R: Measured + Clone,
{
    fn selected(&self) -> &[R] {
        self.selected
            .get_or_init(|| select(self.dashboard.dataset.records(), self.selection))
    }

    fn query(&self, query: Query) -> Result<CachedData> {
        let compute = || self.compute(&query);
        match &self.dashboard.cache {
            Some(cache) => cache.get_or_compute(
                QueryKey {
                    source: self.dashboard.dataset.source().clone(),
                    selection: self.selection.clone(),
                    query: query.clone(),
                },
                compute,
            ),
            None => compute(),
        }
    }

    fn compute(&self, query: &Query) -> Result<CachedData> {
        let records = self.selected();
        Ok(match query {
            Query::Monthly { dimension, metric, order } => CachedData::Series(Arc::new(
                MonthlyAggregator::new(*dimension, *metric)
                    .with_order(*order)
                    .aggregate(records)?,
            )),
            Query::Overall { dimension, metric, order } => CachedData::Groups(Arc::new(
                OverallAggregator::new(*dimension, *metric)
                    .with_order(*order)
                    .aggregate(records)?,
            )),
            Query::Daily { metric } => {
                CachedData::Daily(Arc::new(DailyAggregator::new(*metric).aggregate(records)?))
            }
            Query::IndicatorTrends { indicators } => CachedData::Series(Arc::new(
                IndicatorTrendsAggregator::new(indicators.iter().copied()).aggregate(records)?,
            )),
        })
    }

    fn groups(&self, dimension: Dimension, metric: Metric, order: KeyOrder) -> Result<Arc<Vec<GroupRatio>>> {
        match self.query(Query::Overall { dimension, metric, order })? {
            CachedData::Groups(groups) => Ok(groups),
            other => Err(unexpected(&other)),
        }
    }

    fn daily(&self, metric: Metric) -> Result<Arc<Vec<DailyPoint>>> {
        match self.query(Query::Daily { metric })? {
            CachedData::Daily(points) => Ok(points),
            other => Err(unexpected(&other)),
        }
    }

    fn monthly(&self, dimension: Dimension, metric: Metric, order: KeyOrder) -> Result<Arc<Vec<Series>>> {
        match self.query(Query::Monthly { dimension, metric, order })? {
            CachedData::Series(series) => Ok(series),
            other => Err(unexpected(&other)),
        }
    }

    fn indicator_trends(&self, indicators: Vec<Indicator>) -> Result<Arc<Vec<Series>>> {
        match self.query(Query::IndicatorTrends { indicators })? {
            CachedData::Series(series) => Ok(series),
            other => Err(unexpected(&other)),
        }
    }
}

fn unexpected(data: &CachedData) -> BaitscopeError {
    BaitscopeError::new(format!("cached result has an unexpected shape: {data:?}"))
}
