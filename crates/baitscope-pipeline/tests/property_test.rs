//! Property tests for selection, aggregation and smoothing.

use baitscope_common::test_utils::property_testing::{
    alpha_strategy, category_strategy, date_strategy, publisher_name_strategy,
};
use baitscope_common::{Category, Dimension, Indicator, Metric};
use baitscope_pipeline::{
    select, CountRecord, DataAggregator, DateInterval, Ewma, MonthlyAggregator, Record, RollingMean,
    Selection, Smoother,
};
use proptest::prelude::*;
use std::collections::BTreeSet;

fn record_strategy() -> impl Strategy<Value = Record> {
    (
        publisher_name_strategy(),
        category_strategy(),
        date_strategy(),
        any::<bool>(),
        0.0f64..=1.0,
    )
        .prop_map(|(publisher, category, date, clickbait, emotional)| {
            Record::new(publisher, category, date, clickbait).with_indicator(Indicator::Emotional, emotional)
        })
}

fn count_strategy() -> impl Strategy<Value = CountRecord> {
    (
        publisher_name_strategy(),
        category_strategy(),
        date_strategy(),
        0u64..20,
        0u64..20,
    )
        .prop_map(|(publisher, category, date, a, b)| {
            CountRecord::new(publisher, category, date, a.min(b), a.max(b)).unwrap()
        })
}

fn selection_strategy() -> impl Strategy<Value = Selection> {
    (
        date_strategy(),
        date_strategy(),
        proptest::option::of(proptest::collection::btree_set(publisher_name_strategy(), 0..4)),
        proptest::option::of(proptest::collection::btree_set(category_strategy(), 0..4)),
    )
        .prop_map(|(start, end, publishers, categories)| {
            let mut selection = Selection::new(DateInterval::new(start.min(end), start.max(end)));
            if let Some(publishers) = publishers {
                selection = selection.with_publishers(publishers);
            }
            if let Some(categories) = categories {
                selection = selection.with_categories(categories);
            }
            selection
        })
}

fn admitted(selection: &Selection, record: &Record) -> bool {
    selection.interval.contains(record.date)
        && selection
            .publishers
            .as_ref()
            .map_or(true, |p| p.contains(&record.publisher))
        && selection
            .categories
            .as_ref()
            .map_or(true, |c: &BTreeSet<Category>| c.contains(&record.category))
}

proptest! {
    #[test]
    fn selection_is_sound_and_complete(
        records in proptest::collection::vec(record_strategy(), 0..80),
        selection in selection_strategy(),
    ) {
        let selected = select(&records, &selection);

        prop_assert!(selected.iter().all(|r| admitted(&selection, r)));
        let expected: Vec<&Record> = records.iter().filter(|r| admitted(&selection, r)).collect();
        prop_assert_eq!(selected.len(), expected.len());
        for (got, want) in selected.iter().zip(expected) {
            prop_assert_eq!(got, want);
        }
    }

    #[test]
    fn buckets_partition_the_selection(
        records in proptest::collection::vec(record_strategy(), 0..120),
        dimension in prop_oneof![Just(Dimension::Publisher), Just(Dimension::Category)],
    ) {
        let series = MonthlyAggregator::new(dimension, Metric::Clickbait).aggregate(&records).unwrap();
        let covered: u64 = series.iter().map(|s| s.total_count().unwrap()).sum();
        prop_assert_eq!(covered, records.len() as u64);

        for s in &series {
            prop_assert!(s.points.windows(2).all(|w| w[0].month < w[1].month));
        }
        let keys: BTreeSet<&str> = series.iter().map(|s| s.key.as_str()).collect();
        prop_assert_eq!(keys.len(), series.len());
    }

    #[test]
    fn ratio_mode_agrees_with_flags(
        rows in proptest::collection::vec(count_strategy(), 0..40),
    ) {
        let expanded: Vec<Record> = rows.iter().flat_map(|row| row.expand()).collect();
        let aggregator = MonthlyAggregator::new(Dimension::Publisher, Metric::Clickbait);
        let ratio = aggregator.aggregate(&rows).unwrap();
        let flags = aggregator.aggregate(&expanded).unwrap();

        prop_assert_eq!(ratio.len(), flags.len());
        for (r, f) in ratio.iter().zip(&flags) {
            prop_assert_eq!(&r.key, &f.key);
            prop_assert_eq!(r.months(), f.months());
            for (rp, fp) in r.points.iter().zip(&f.points) {
                prop_assert!((rp.value - fp.value).abs() <= 1e-9);
                prop_assert_eq!(rp.count, fp.count);
            }
        }
    }

    #[test]
    fn ewma_seeds_with_first_value(
        raw in proptest::collection::vec(0.0f64..=1.0, 1..30),
        alpha in alpha_strategy(),
    ) {
        let smoothed = Ewma::new(alpha).unwrap().apply(&raw);
        prop_assert_eq!(smoothed.len(), raw.len());
        prop_assert_eq!(smoothed[0], raw[0]);
    }

    #[test]
    fn ewma_alpha_one_is_identity(raw in proptest::collection::vec(-5.0f64..5.0, 0..30)) {
        prop_assert_eq!(Ewma::new(1.0).unwrap().apply(&raw), raw);
    }

    #[test]
    fn ewma_keeps_constant_series(
        c in -10.0f64..10.0,
        len in 0usize..30,
        alpha in alpha_strategy(),
    ) {
        let smoothed = Ewma::new(alpha).unwrap().apply(&vec![c; len]);
        prop_assert!(smoothed.iter().all(|s| (s - c).abs() <= 1e-12));
    }

    #[test]
    fn rolling_window_one_is_identity(raw in proptest::collection::vec(-5.0f64..5.0, 0..30)) {
        prop_assert_eq!(RollingMean::new(1).unwrap().apply(&raw), raw);
    }
}
