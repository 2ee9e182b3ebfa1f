//! Record selection by date interval and categorical allow-lists

use crate::record::Observation;
use baitscope_common::{format_date, BaitscopeError, Category, Indicator, Publisher, Result};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use tracing::{debug, instrument};

/// Closed date interval, both ends inclusive.
///
/// An interval whose start lies after its end is empty and selects nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DateInterval {
    /// First day, inclusive.
    pub start: NaiveDate,
    /// Last day, inclusive.
    pub end: NaiveDate,
}

impl DateInterval {
    /// Interval from `start` to `end`, both inclusive.
    pub const fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// Like [`DateInterval::new`], but rejects `start > end`.
    pub fn strict(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(BaitscopeError::contract_param(
                format!("start date {start} is after end date {end}"),
                "interval",
            ));
        }
        Ok(Self::new(start, end))
    }

    /// Fills the missing bounds from `span`, typically [`crate::Dataset::date_span`].
    ///
    /// Returns `None` when a bound is missing and there is no span to take it from.
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, span: Option<Self>) -> Option<Self> {
        let start = start.or_else(|| span.map(|s| s.start))?;
        let end = end.or_else(|| span.map(|s| s.end))?;
        Some(Self::new(start, end))
    }

    /// Whether `date` lies inside the interval.
    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }

    /// Whether the interval holds no day at all.
    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

impl fmt::Display for DateInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..={}", format_date(self.start), format_date(self.end))
    }
}

/// Filter predicates applied by [`select`].
///
/// `None` leaves a dimension unconstrained; `Some` of an empty set matches nothing.
/// The indicator allow-list does not filter records, it picks the indicator
/// metrics computed downstream.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Selection {
    /// Dates kept.
    pub interval: DateInterval,
    /// Publishers kept; all when `None`.
    pub publishers: Option<BTreeSet<Publisher>>,
    /// Categories kept; all when `None`.
    pub categories: Option<BTreeSet<Category>>,
    /// Indicators computed downstream; all when `None`.
    pub indicators: Option<BTreeSet<Indicator>>,
}

impl Selection {
    /// Selection constrained only by `interval`.
    pub const fn new(interval: DateInterval) -> Self {
        Self {
            interval,
            publishers: None,
            categories: None,
            indicators: None,
        }
    }

    /// Keeps only `publishers`.
    #[must_use]
    pub fn with_publishers<I, P>(mut self, publishers: I) -> Self
    where
        I: IntoIterator<Item = P>,
        P: Into<Publisher>,
    {
        self.publishers = Some(publishers.into_iter().map(Into::into).collect());
        self
    }

    /// Keeps only `categories`.
    #[must_use]
    pub fn with_categories(mut self, categories: impl IntoIterator<Item = Category>) -> Self {
        self.categories = Some(categories.into_iter().collect());
        self
    }

    /// Computes only `indicators`.
    #[must_use]
    pub fn with_indicators(mut self, indicators: impl IntoIterator<Item = Indicator>) -> Self {
        self.indicators = Some(indicators.into_iter().collect());
        self
    }

    /// Whether `record` passes the interval and every supplied allow-list.
    pub fn matches<T: Observation + ?Sized>(&self, record: &T) -> bool {
        self.interval.contains(record.date())
            && self
                .publishers
                .as_ref()
                .map_or(true, |allowed| allowed.contains(record.publisher()))
            && self
                .categories
                .as_ref()
                .map_or(true, |allowed| allowed.contains(&record.category()))
    }

    /// Indicators of `available` admitted by the indicator allow-list, in vocabulary order.
    pub fn indicator_metrics(&self, available: &[Indicator]) -> Vec<Indicator> {
        Indicator::ALL
            .into_iter()
            .filter(|i| available.contains(i))
            .filter(|i| self.indicators.as_ref().map_or(true, |allowed| allowed.contains(i)))
            .collect()
    }
}

/// Returns the records that satisfy `selection`, preserving input order.
#[instrument(skip(records), fields(input = records.len(), interval = %selection.interval))]
pub fn select<T: Observation + Clone>(records: &[T], selection: &Selection) -> Vec<T> {
    if selection.interval.is_empty() {
        debug!("Empty interval, nothing selected");
        return Vec::new();
    }

    let selected: Vec<T> = records.iter().filter(|r| selection.matches(*r)).cloned().collect();
    debug!("Selected {} records", selected.len());
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Record;
    use baitscope_common::test_utils::date;

    fn records() -> Vec<Record> {
        vec![
            Record::new("A", Category::Politics, date(2017, 12, 31), true),
            Record::new("A", Category::Tech, date(2018, 1, 1), false),
            Record::new("B", Category::Tech, date(2018, 6, 30), true),
            Record::new("C", Category::Life, date(2018, 7, 1), false),
        ]
    }

    #[test]
    fn test_interval_is_inclusive() {
        let interval = DateInterval::new(date(2018, 1, 1), date(2018, 6, 30));
        let selected = select(&records(), &Selection::new(interval));
        assert_eq!(selected.len(), 2);
        assert_eq!(selected[0].date, date(2018, 1, 1));
        assert_eq!(selected[1].date, date(2018, 6, 30));
    }

    #[test]
    fn test_reversed_interval_selects_nothing() {
        let interval = DateInterval::new(date(2019, 1, 1), date(2018, 1, 1));
        assert!(interval.is_empty());
        assert!(select(&records(), &Selection::new(interval)).is_empty());
        assert!(DateInterval::strict(date(2019, 1, 1), date(2018, 1, 1))
            .unwrap_err()
            .is_contract());
    }

    #[test]
    fn test_allow_lists() {
        let interval = DateInterval::new(date(2017, 1, 1), date(2019, 1, 1));

        let by_publisher = Selection::new(interval).with_publishers(["A", "C"]);
        assert_eq!(select(&records(), &by_publisher).len(), 3);

        let by_both = by_publisher.with_categories([Category::Tech]);
        let selected = select(&records(), &by_both);
        assert_eq!(selected.len(), 1);
        assert_eq!(selected[0].publisher.as_str(), "A");

        let nothing = Selection::new(interval).with_categories([]);
        assert!(select(&records(), &nothing).is_empty());
    }

    #[test]
    fn test_indicator_allow_list_picks_metrics() {
        let interval = DateInterval::new(date(2017, 1, 1), date(2019, 1, 1));
        let available = [Indicator::Emotional, Indicator::Surprise, Indicator::Gossip];

        let all = Selection::new(interval);
        assert_eq!(all.indicator_metrics(&available), available.to_vec());

        let some = Selection::new(interval).with_indicators([Indicator::Gossip, Indicator::List]);
        assert_eq!(some.indicator_metrics(&available), vec![Indicator::Gossip]);
        assert_eq!(select(&records(), &some).len(), records().len());

        let none = Selection::new(interval).with_indicators([]);
        assert!(none.indicator_metrics(&available).is_empty());
    }

    #[test]
    fn test_resolve_open_bounds() {
        let span = DateInterval::new(date(2017, 5, 1), date(2019, 2, 3));
        let resolved = DateInterval::resolve(Some(date(2018, 1, 1)), None, Some(span)).unwrap();
        assert_eq!(resolved, DateInterval::new(date(2018, 1, 1), date(2019, 2, 3)));
        assert_eq!(DateInterval::resolve(None, None, None), None);
        assert_eq!(resolved.to_string(), "2018-01-01..=2019-02-03");
    }
}
