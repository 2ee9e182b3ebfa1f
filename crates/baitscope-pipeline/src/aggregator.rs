//! Grouping of selected records into per-key monthly series and summary points

use crate::record::{Contribution, Measured};
use baitscope_common::{BaitscopeError, Dimension, Indicator, KeyOrder, Metric, Result, YearMonth};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use tracing::{debug, instrument};

/// Trait for aggregating selected records into chart data
pub trait DataAggregator<R> {
    /// One aggregated item, such as a series or a summary point
    type Output;

    /// Process the records and return the aggregated data points
    fn aggregate(&self, records: &[R]) -> Result<Vec<Self::Output>>;
}

/// Mean of one bucket in a monthly series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesPoint {
    /// Calendar month of the bucket.
    pub month: YearMonth,
    /// Mean of the metric over the bucket.
    pub value: f64,
    /// Records in the bucket, or expanded articles for count rows.
    pub count: u64,
}

/// Monthly points of one key, months strictly increasing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Series {
    /// Dimension value or indicator name the series belongs to.
    pub key: String,
    /// Non-empty buckets in chronological order.
    pub points: Vec<SeriesPoint>,
}

impl Series {
    /// Bucket means in month order.
    pub fn values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.value).collect()
    }

    /// Months that have a bucket.
    pub fn months(&self) -> Vec<YearMonth> {
        self.points.iter().map(|p| p.month).collect()
    }

    /// Number of records covered by the series.
    ///
    /// Fails when the bucket counts do not fit in a `u64`.
    pub fn total_count(&self) -> Result<u64> {
        checked_total(self.points.iter().map(|p| p.count))
    }
}

/// Sum of article counts, or a contract error when it overflows `u64`.
pub fn checked_total(counts: impl IntoIterator<Item = u64>) -> Result<u64> {
    counts
        .into_iter()
        .try_fold(0u64, u64::checked_add)
        .ok_or_else(count_overflow)
}

fn count_overflow() -> BaitscopeError {
    BaitscopeError::contract_param("article count exceeds u64::MAX", "total_count")
}

/// Mean of a metric over every selected record of one key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupRatio {
    /// Dimension value.
    pub key: String,
    /// Mean of the metric over the key's records.
    pub value: f64,
    /// Records covered, or expanded articles for count rows.
    pub count: u64,
}

/// Mean of a metric over every selected record of one day.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    /// Calendar day.
    pub date: NaiveDate,
    /// Mean of the metric over the day.
    pub value: f64,
    /// Records covered, or expanded articles for count rows.
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default)]
struct Accum {
    numerator: f64,
    weight: u64,
}

impl Accum {
    fn add(&mut self, contribution: Contribution) -> Result<()> {
        self.weight = self
            .weight
            .checked_add(contribution.weight)
            .ok_or_else(count_overflow)?;
        self.numerator += contribution.numerator;
        Ok(())
    }

    #[allow(clippy::cast_precision_loss)]
    fn mean(self) -> Option<f64> {
        (self.weight > 0).then(|| self.numerator / self.weight as f64)
    }
}

/// Keyed accumulators that remember the order keys were first seen in.
struct Groups<B> {
    index: HashMap<String, usize>,
    entries: Vec<(String, B)>,
}

impl<B: Default> Groups<B> {
    fn new() -> Self {
        Self {
            index: HashMap::new(),
            entries: Vec::new(),
        }
    }

    fn entry(&mut self, key: &str) -> &mut B {
        let position = match self.index.get(key) {
            Some(&position) => position,
            None => {
                self.entries.push((key.to_string(), B::default()));
                self.index.insert(key.to_string(), self.entries.len() - 1);
                self.entries.len() - 1
            }
        };
        &mut self.entries[position].1
    }

    fn into_ordered(self, order: KeyOrder) -> Vec<(String, B)> {
        let mut entries = self.entries;
        if order == KeyOrder::Lexical {
            entries.sort_by(|a, b| a.0.cmp(&b.0));
        }
        entries
    }
}

fn monthly_points(buckets: BTreeMap<YearMonth, Accum>) -> Vec<SeriesPoint> {
    buckets
        .into_iter()
        .filter_map(|(month, accum)| {
            accum.mean().map(|value| SeriesPoint {
                month,
                value,
                count: accum.weight,
            })
        })
        .collect()
}

/// Groups by a dimension and calendar month, averaging one metric per bucket.
///
/// Count rows contribute `clickbait_count / total_count`, so the same
/// aggregator yields the ratio of the two counters. Buckets without weight are
/// absent, and so are keys left without any bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthlyAggregator {
    /// Dimension the series are keyed by.
    pub dimension: Dimension,
    /// Value averaged in each bucket.
    pub metric: Metric,
    /// Order the series are emitted in.
    pub order: KeyOrder,
}

impl MonthlyAggregator {
    /// Aggregator emitting series in lexical key order.
    pub const fn new(dimension: Dimension, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            order: KeyOrder::Lexical,
        }
    }

    /// Emits series in `order` instead.
    #[must_use]
    pub const fn with_order(mut self, order: KeyOrder) -> Self {
        self.order = order;
        self
    }
}

impl<R: Measured> DataAggregator<R> for MonthlyAggregator {
    type Output = Series;

    #[instrument(skip(self, records), fields(dimension = %self.dimension, metric = %self.metric, records = records.len()))]
    fn aggregate(&self, records: &[R]) -> Result<Vec<Series>> {
        let mut groups: Groups<BTreeMap<YearMonth, Accum>> = Groups::new();

        for record in records {
            let contribution = record.contribution(self.metric)?;
            groups
                .entry(record.dimension_value(self.dimension))
                .entry(record.month())
                .or_default()
                .add(contribution)?;
        }

        let series: Vec<Series> = groups
            .into_ordered(self.order)
            .into_iter()
            .map(|(key, buckets)| Series {
                key,
                points: monthly_points(buckets),
            })
            .filter(|s| !s.points.is_empty())
            .collect();

        debug!("Aggregated {} monthly series", series.len());
        Ok(series)
    }
}

/// Mean of one metric per dimension value over the whole selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OverallAggregator {
    /// Dimension the groups are keyed by.
    pub dimension: Dimension,
    /// Value averaged per group.
    pub metric: Metric,
    /// Order the groups are emitted in.
    pub order: KeyOrder,
}

impl OverallAggregator {
    /// Aggregator emitting groups in lexical key order.
    pub const fn new(dimension: Dimension, metric: Metric) -> Self {
        Self {
            dimension,
            metric,
            order: KeyOrder::Lexical,
        }
    }

    /// Emits groups in `order` instead.
    #[must_use]
    pub const fn with_order(mut self, order: KeyOrder) -> Self {
        self.order = order;
        self
    }
}

impl<R: Measured> DataAggregator<R> for OverallAggregator {
    type Output = GroupRatio;

    #[instrument(skip(self, records), fields(dimension = %self.dimension, metric = %self.metric, records = records.len()))]
    fn aggregate(&self, records: &[R]) -> Result<Vec<GroupRatio>> {
        let mut groups: Groups<Accum> = Groups::new();

        for record in records {
            let contribution = record.contribution(self.metric)?;
            groups.entry(record.dimension_value(self.dimension)).add(contribution)?;
        }

        Ok(groups
            .into_ordered(self.order)
            .into_iter()
            .filter_map(|(key, accum)| {
                accum.mean().map(|value| GroupRatio {
                    key,
                    value,
                    count: accum.weight,
                })
            })
            .collect())
    }
}

/// Mean of one metric per calendar day across every key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailyAggregator {
    /// Value averaged per day.
    pub metric: Metric,
}

impl DailyAggregator {
    /// Aggregator averaging `metric` per day.
    pub const fn new(metric: Metric) -> Self {
        Self { metric }
    }
}

impl<R: Measured> DataAggregator<R> for DailyAggregator {
    type Output = DailyPoint;

    #[instrument(skip(self, records), fields(metric = %self.metric, records = records.len()))]
    fn aggregate(&self, records: &[R]) -> Result<Vec<DailyPoint>> {
        let mut days: BTreeMap<NaiveDate, Accum> = BTreeMap::new();

        for record in records {
            let contribution = record.contribution(self.metric)?;
            days.entry(record.date()).or_default().add(contribution)?;
        }

        Ok(days
            .into_iter()
            .filter_map(|(date, accum)| {
                accum.mean().map(|value| DailyPoint {
                    date,
                    value,
                    count: accum.weight,
                })
            })
            .collect())
    }
}

/// One monthly series per indicator, keyed by the indicator name, averaged over every key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndicatorTrendsAggregator {
    /// Indicators to trend, in output order.
    pub indicators: Vec<Indicator>,
}

impl IndicatorTrendsAggregator {
    /// Aggregator over `indicators`, emitted in the given order.
    pub fn new(indicators: impl IntoIterator<Item = Indicator>) -> Self {
        Self {
            indicators: indicators.into_iter().collect(),
        }
    }
}

impl<R: Measured> DataAggregator<R> for IndicatorTrendsAggregator {
    type Output = Series;

    #[instrument(skip(self, records), fields(indicators = self.indicators.len(), records = records.len()))]
    fn aggregate(&self, records: &[R]) -> Result<Vec<Series>> {
        let mut series = Vec::with_capacity(self.indicators.len());

        for indicator in &self.indicators {
            let metric = Metric::Indicator(*indicator);
            let mut buckets: BTreeMap<YearMonth, Accum> = BTreeMap::new();
            for record in records {
                let contribution = record.contribution(metric)?;
                buckets.entry(record.month()).or_default().add(contribution)?;
            }

            let points = monthly_points(buckets);
            if !points.is_empty() {
                series.push(Series {
                    key: indicator.as_str().to_string(),
                    points,
                });
            }
        }

        Ok(series)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{CountRecord, Record};
    use baitscope_common::test_utils::{assert_approx_eq, date, month};
    use baitscope_common::Category;

    fn scenario() -> Vec<Record> {
        vec![
            Record::new("A", Category::Politics, date(2018, 1, 15), true),
            Record::new("A", Category::Politics, date(2018, 1, 20), false),
            Record::new("B", Category::Politics, date(2018, 2, 1), true),
        ]
    }

    #[test]
    fn test_clickbait_mean_by_publisher() {
        let series = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait)
            .aggregate(&scenario())
            .unwrap();

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].key, "A");
        assert_eq!(series[0].points.len(), 1);
        assert_eq!(series[0].points[0].month, month(2018, 1));
        assert_approx_eq(series[0].points[0].value, 0.5, 1e-12);
        assert_eq!(series[0].points[0].count, 2);
        assert_eq!(series[1].key, "B");
        assert_eq!(series[1].points[0].month, month(2018, 2));
        assert_approx_eq(series[1].points[0].value, 1.0, 1e-12);
    }

    #[test]
    fn test_key_order() {
        let records = vec![
            Record::new("Zeta", Category::Tech, date(2018, 1, 1), true),
            Record::new("Alpha", Category::Tech, date(2018, 1, 1), false),
        ];

        let lexical = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait)
            .aggregate(&records)
            .unwrap();
        assert_eq!(lexical[0].key, "Alpha");

        let first_seen = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait)
            .with_order(KeyOrder::FirstSeen)
            .aggregate(&records)
            .unwrap();
        assert_eq!(first_seen[0].key, "Zeta");
    }

    #[test]
    fn test_months_are_chronological_and_gaps_absent() {
        let records = vec![
            Record::new("A", Category::Tech, date(2018, 5, 1), true),
            Record::new("A", Category::Tech, date(2017, 11, 3), false),
            Record::new("A", Category::Tech, date(2018, 1, 9), true),
        ];
        let series = MonthlyAggregator::new(Dimension::Category, Metric::Clickbait)
            .aggregate(&records)
            .unwrap();
        assert_eq!(series[0].key, "tech");
        assert_eq!(
            series[0].months(),
            vec![month(2017, 11), month(2018, 1), month(2018, 5)]
        );
    }

    #[test]
    fn test_empty_input_yields_no_series() {
        let records: Vec<Record> = Vec::new();
        assert!(MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait)
            .aggregate(&records)
            .unwrap()
            .is_empty());
        assert!(DailyAggregator::new(Metric::Clickbait).aggregate(&records).unwrap().is_empty());
    }

    #[test]
    fn test_missing_indicator_is_contract_error() {
        let err = MonthlyAggregator::new(Dimension::Publisher, Metric::Indicator(Indicator::Gossip))
            .aggregate(&scenario())
            .unwrap_err();
        assert!(err.is_contract());
    }

    #[test]
    fn test_ratio_mode_matches_expanded_flags() {
        let rows = vec![
            CountRecord::new("A", Category::Politics, date(2018, 1, 3), 2, 5).unwrap(),
            CountRecord::new("A", Category::Politics, date(2018, 1, 19), 1, 1).unwrap(),
            CountRecord::new("B", Category::Tech, date(2018, 2, 7), 0, 4).unwrap(),
        ];
        let expanded: Vec<Record> = rows.iter().flat_map(|row| row.expand()).collect();

        let aggregator = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait);
        let ratio = aggregator.aggregate(&rows).unwrap();
        let flags = aggregator.aggregate(&expanded).unwrap();

        assert_eq!(ratio.len(), flags.len());
        for (r, f) in ratio.iter().zip(&flags) {
            assert_eq!(r.key, f.key);
            assert_eq!(r.months(), f.months());
            for (rp, fp) in r.points.iter().zip(&f.points) {
                assert_approx_eq(rp.value, fp.value, 1e-9);
                assert_eq!(rp.count, fp.count);
            }
        }
        assert_approx_eq(ratio[0].points[0].value, 0.5, 1e-12);
    }

    #[test]
    fn test_bucket_weight_overflow_is_contract_error() {
        let huge = u64::MAX / 2 + 1;
        let rows = vec![
            CountRecord::new("A", Category::Tech, date(2018, 1, 1), 1, huge).unwrap(),
            CountRecord::new("A", Category::Tech, date(2018, 1, 2), 1, huge).unwrap(),
        ];

        let err = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait)
            .aggregate(&rows)
            .unwrap_err();
        assert!(err.is_contract());
        assert!(OverallAggregator::new(Dimension::Category, Metric::Clickbait)
            .aggregate(&rows)
            .unwrap_err()
            .is_contract());
        assert!(DailyAggregator::new(Metric::Clickbait).aggregate(&rows).is_ok());
    }

    #[test]
    fn test_total_count_overflow_across_months() {
        let huge = u64::MAX / 2 + 1;
        let rows = vec![
            CountRecord::new("A", Category::Tech, date(2018, 1, 1), 0, huge).unwrap(),
            CountRecord::new("A", Category::Tech, date(2018, 2, 1), 0, huge).unwrap(),
        ];
        let series = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait)
            .aggregate(&rows)
            .unwrap();

        assert_eq!(series[0].points.len(), 2);
        assert!(series[0].total_count().unwrap_err().is_contract());
        assert_eq!(checked_total([1, 2, 3]).unwrap(), 6);
    }

    #[test]
    fn test_zero_total_buckets_are_absent() {
        let rows = vec![
            CountRecord::new("A", Category::Tech, date(2018, 2, 8), 0, 0).unwrap(),
            CountRecord::new("B", Category::Tech, date(2018, 2, 8), 1, 2).unwrap(),
        ];
        let series = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait)
            .aggregate(&rows)
            .unwrap();
        assert_eq!(series.len(), 1);
        assert_eq!(series[0].key, "B");
    }

    #[test]
    fn test_overall_and_daily() {
        let records = vec![
            Record::new("A", Category::Politics, date(2018, 1, 1), true).with_indicator(Indicator::Emotional, 1.0),
            Record::new("A", Category::Tech, date(2018, 1, 1), false).with_indicator(Indicator::Emotional, 0.0),
            Record::new("B", Category::Politics, date(2018, 1, 2), false).with_indicator(Indicator::Emotional, 0.5),
        ];

        let bars = OverallAggregator::new(Dimension::Category, Metric::Clickbait)
            .aggregate(&records)
            .unwrap();
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].key, "politics");
        assert_approx_eq(bars[0].value, 0.5, 1e-12);
        assert_eq!(bars[1].key, "tech");
        assert_approx_eq(bars[1].value, 0.0, 1e-12);

        let daily = DailyAggregator::new(Metric::Indicator(Indicator::Emotional))
            .aggregate(&records)
            .unwrap();
        assert_eq!(daily.len(), 2);
        assert_approx_eq(daily[0].value, 0.5, 1e-12);
        assert_eq!(daily[0].count, 2);
        assert_approx_eq(daily[1].value, 0.5, 1e-12);
    }

    #[test]
    fn test_indicator_trends() {
        let records = vec![
            Record::new("A", Category::Politics, date(2018, 1, 1), true)
                .with_indicator(Indicator::Emotional, 1.0)
                .with_indicator(Indicator::Surprise, 0.0),
            Record::new("B", Category::Tech, date(2018, 1, 9), false)
                .with_indicator(Indicator::Emotional, 0.0)
                .with_indicator(Indicator::Surprise, 1.0),
            Record::new("B", Category::Tech, date(2018, 2, 9), false)
                .with_indicator(Indicator::Emotional, 1.0)
                .with_indicator(Indicator::Surprise, 1.0),
        ];

        let trends = IndicatorTrendsAggregator::new([Indicator::Emotional, Indicator::Surprise])
            .aggregate(&records)
            .unwrap();
        assert_eq!(trends.len(), 2);
        assert_eq!(trends[0].key, "emotional");
        assert_eq!(trends[0].values(), vec![0.5, 1.0]);
        assert_eq!(trends[1].key, "surprise");
        assert_eq!(trends[1].total_count().unwrap(), 3);
    }
}
