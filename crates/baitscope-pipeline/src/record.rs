//! Headline records and the observation traits the pipeline stages work on

use baitscope_common::{BaitscopeError, Category, Dimension, Indicator, Metric, Publisher, Result, YearMonth};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Indicator scores of one headline, indexed by [`Indicator::index`].
///
/// A slot is `None` when the indicator column was not part of the source.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct IndicatorScores([Option<f64>; Indicator::COUNT]);

impl IndicatorScores {
    /// Scores with every indicator absent.
    pub const fn empty() -> Self {
        Self([None; Indicator::COUNT])
    }

    /// Score for `indicator`, if it was loaded.
    pub const fn get(&self, indicator: Indicator) -> Option<f64> {
        self.0[indicator.index()]
    }

    /// Sets the score for `indicator`.
    pub fn set(&mut self, indicator: Indicator, value: f64) {
        self.0[indicator.index()] = Some(value);
    }

    /// Builder-style variant of [`IndicatorScores::set`].
    #[must_use]
    pub fn with(mut self, indicator: Indicator, value: f64) -> Self {
        self.set(indicator, value);
        self
    }
}

/// One headline observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    /// News outlet.
    pub publisher: Publisher,
    /// Editorial section.
    pub category: Category,
    /// Publication date.
    pub date: NaiveDate,
    /// Clickbait label.
    pub is_clickbait: bool,
    /// Indicator scores present in the source.
    pub indicators: IndicatorScores,
}

impl Record {
    /// Creates a record with no indicator scores.
    pub fn new(publisher: impl Into<Publisher>, category: Category, date: NaiveDate, is_clickbait: bool) -> Self {
        Self {
            publisher: publisher.into(),
            category,
            date,
            is_clickbait,
            indicators: IndicatorScores::empty(),
        }
    }

    /// Adds an indicator score.
    #[must_use]
    pub fn with_indicator(mut self, indicator: Indicator, value: f64) -> Self {
        self.indicators.set(indicator, value);
        self
    }

    /// Value of `metric` for this headline.
    pub fn metric_value(&self, metric: Metric) -> Option<f64> {
        match metric {
            Metric::Clickbait => Some(if self.is_clickbait { 1.0 } else { 0.0 }),
            Metric::Indicator(indicator) => self.indicators.get(indicator),
        }
    }
}

/// Pre-aggregated row: how many of `total_count` articles were clickbait.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountRecord {
    /// News outlet.
    pub publisher: Publisher,
    /// Editorial section.
    pub category: Category,
    /// Publication date.
    pub date: NaiveDate,
    /// Articles labeled clickbait.
    pub clickbait_count: u64,
    /// Articles in the row.
    pub total_count: u64,
}

impl CountRecord {
    /// Creates a count row, rejecting more clickbait articles than articles.
    pub fn new(
        publisher: impl Into<Publisher>,
        category: Category,
        date: NaiveDate,
        clickbait_count: u64,
        total_count: u64,
    ) -> Result<Self> {
        if clickbait_count > total_count {
            return Err(BaitscopeError::contract_param(
                format!("clickbait count {clickbait_count} exceeds total count {total_count}"),
                "clickbait_count",
            ));
        }

        Ok(Self {
            publisher: publisher.into(),
            category,
            date,
            clickbait_count,
            total_count,
        })
    }

    /// One flag record per counted article: `clickbait_count` positives, the rest negatives.
    pub fn expand(&self) -> impl Iterator<Item = Record> + '_ {
        (0..self.total_count).map(move |i| {
            Record::new(
                self.publisher.clone(),
                self.category,
                self.date,
                i < self.clickbait_count,
            )
        })
    }
}

/// Anything the selector can filter: it has a date, a publisher and a category.
pub trait Observation {
    /// Publication date.
    fn date(&self) -> NaiveDate;
    /// News outlet.
    fn publisher(&self) -> &Publisher;
    /// Editorial section.
    fn category(&self) -> Category;

    /// Value on a categorical grouping dimension.
    fn dimension_value(&self, dimension: Dimension) -> &str {
        match dimension {
            Dimension::Publisher => self.publisher().as_str(),
            Dimension::Category => self.category().as_str(),
        }
    }

    /// Calendar month of the observation.
    fn month(&self) -> YearMonth {
        YearMonth::from_date(self.date())
    }
}

impl Observation for Record {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    fn category(&self) -> Category {
        self.category
    }
}

impl Observation for CountRecord {
    fn date(&self) -> NaiveDate {
        self.date
    }

    fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    fn category(&self) -> Category {
        self.category
    }
}

/// What one observation adds to a bucket: a numerator and a weight.
///
/// Flag records contribute `(value, 1)`, count records `(clickbait, total)`;
/// the bucket value is `Σ numerator / Σ weight` in both cases.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Contribution {
    /// Sum the bucket mean is taken over.
    pub numerator: f64,
    /// Articles the numerator covers.
    pub weight: u64,
}

/// An observation that can contribute to a bucket mean.
pub trait Measured: Observation {
    /// What the record adds to a bucket averaging `metric`.
    fn contribution(&self, metric: Metric) -> Result<Contribution>;
}

impl Measured for Record {
    fn contribution(&self, metric: Metric) -> Result<Contribution> {
        let numerator = self.metric_value(metric).ok_or_else(|| {
            BaitscopeError::contract_param(format!("metric '{metric}' is not loaded for this record set"), "metric")
        })?;
        Ok(Contribution { numerator, weight: 1 })
    }
}

impl Measured for CountRecord {
    #[allow(clippy::cast_precision_loss)]
    fn contribution(&self, metric: Metric) -> Result<Contribution> {
        match metric {
            Metric::Clickbait => Ok(Contribution {
                numerator: self.clickbait_count as f64,
                weight: self.total_count,
            }),
            Metric::Indicator(_) => Err(BaitscopeError::contract_param(
                format!("count rows only carry the clickbait ratio, not '{metric}'"),
                "metric",
            )),
        }
    }
}
