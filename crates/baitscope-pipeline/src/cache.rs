//! Explicit memo caches for loaded datasets and aggregation results

use crate::aggregator::{DailyPoint, GroupRatio, Series};
use crate::selector::Selection;
use crate::source::{content_revision, CsvSource, Dataset, RowLayout, SourceId};
use baitscope_common::{Dimension, Indicator, KeyOrder, Metric, Result};
use baitscope_config::{CacheSettings, ColumnsConfig, DataLayout};
use moka::sync::Cache;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, instrument};

/// Decides whether a cached entry must be recomputed.
///
/// Checked on every lookup. Any `Fn(Duration) -> bool` taking the entry age
/// works as a policy.
pub trait InvalidationPolicy: Send + Sync {
    /// Whether an entry inserted `age` ago must be recomputed.
    fn is_stale(&self, age: Duration) -> bool;
}

impl<F> InvalidationPolicy for F
where
    F: Fn(Duration) -> bool + Send + Sync,
{
    fn is_stale(&self, age: Duration) -> bool {
        self(age)
    }
}

/// Entries stay valid until explicitly invalidated.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInvalidate;

impl InvalidationPolicy for NeverInvalidate {
    fn is_stale(&self, _age: Duration) -> bool {
        false
    }
}

/// Entries older than the given age are recomputed.
#[derive(Debug, Clone, Copy)]
pub struct MaxAge(pub Duration);

impl InvalidationPolicy for MaxAge {
    fn is_stale(&self, age: Duration) -> bool {
        age > self.0
    }
}

/// Policy described by the `[cache]` configuration section.
pub fn policy_from_settings(settings: &CacheSettings) -> Arc<dyn InvalidationPolicy> {
    match settings.max_age_seconds {
        Some(seconds) => Arc::new(MaxAge(Duration::from_secs(seconds))),
        None => Arc::new(NeverInvalidate),
    }
}

/// Cache performance metrics
#[derive(Debug, Default)]
pub struct CacheMetrics {
    /// Lookups answered from the cache.
    pub hits: AtomicU64,
    /// Lookups that had to compute.
    pub misses: AtomicU64,
    /// Entries dropped explicitly or as stale.
    pub invalidations: AtomicU64,
}

impl CacheMetrics {
    /// Counts one hit.
    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts one miss.
    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Counts `count` dropped entries.
    pub fn record_invalidations(&self, count: u64) {
        self.invalidations.fetch_add(count, Ordering::Relaxed);
    }

    /// Hits so far.
    pub fn hits(&self) -> u64 {
        self.hits.load(Ordering::Relaxed)
    }

    /// Misses so far.
    pub fn misses(&self) -> u64 {
        self.misses.load(Ordering::Relaxed)
    }

    /// Invalidations so far.
    pub fn invalidations(&self) -> u64 {
        self.invalidations.load(Ordering::Relaxed)
    }

    /// Share of lookups answered from the cache, 0 before any lookup.
    #[allow(clippy::cast_precision_loss)]
    pub fn hit_rate(&self) -> f64 {
        let hits = self.hits() as f64;
        let total = hits + self.misses() as f64;
        if total > 0.0 {
            hits / total
        } else {
            0.0
        }
    }

    /// Counters keyed by name, for logging.
    pub fn get_stats(&self) -> HashMap<String, u64> {
        let mut stats = HashMap::new();
        stats.insert("hits".to_string(), self.hits());
        stats.insert("misses".to_string(), self.misses());
        stats.insert("invalidations".to_string(), self.invalidations());
        stats
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    value: V,
    inserted_at: Instant,
}

/// Bounded memo table with an injectable invalidation policy.
pub struct Memo<K, V> {
    cache: Cache<K, Entry<V>>,
    policy: Arc<dyn InvalidationPolicy>,
    metrics: Arc<CacheMetrics>,
}

impl<K, V> Memo<K, V>
where
    K: Hash + Eq + fmt::Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    /// Memo holding at most `max_capacity` entries that never go stale.
    pub fn new(max_capacity: u64) -> Self {
        Self {
            cache: Cache::builder().max_capacity(max_capacity).build(),
            policy: Arc::new(NeverInvalidate),
            metrics: Arc::new(CacheMetrics::default()),
        }
    }

    /// Checks every lookup against `policy`.
    #[must_use]
    pub fn with_policy(mut self, policy: Arc<dyn InvalidationPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Cached value for `key`, dropping it first when the policy finds it stale.
    pub fn get(&self, key: &K) -> Option<V> {
        match self.cache.get(key) {
            Some(entry) if self.policy.is_stale(entry.inserted_at.elapsed()) => {
                debug!("Stale cache entry for {:?}", key);
                self.cache.invalidate(key);
                self.metrics.record_invalidations(1);
                self.metrics.record_miss();
                None
            }
            Some(entry) => {
                self.metrics.record_hit();
                Some(entry.value)
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    /// Stores `value`, stamped with the current time.
    pub fn insert(&self, key: K, value: V) {
        self.cache.insert(
            key,
            Entry {
                value,
                inserted_at: Instant::now(),
            },
        );
    }

    /// Returns the cached value or computes, stores and returns it. Errors are not cached.
    pub fn get_or_try_insert_with<F>(&self, key: K, compute: F) -> Result<V>
    where
        F: FnOnce() -> Result<V>,
    {
        if let Some(value) = self.get(&key) {
            return Ok(value);
        }
        let value = compute()?;
        self.insert(key, value.clone());
        Ok(value)
    }

    /// Drops the entry for `key`.
    pub fn invalidate(&self, key: &K) {
        self.cache.invalidate(key);
        self.metrics.record_invalidations(1);
    }

    /// Drops every entry whose key satisfies `predicate`, returning how many were dropped.
    pub fn invalidate_where<P>(&self, predicate: P) -> u64
    where
        P: Fn(&K) -> bool,
    {
        let keys: Vec<Arc<K>> = self
            .cache
            .iter()
            .filter_map(|(key, _)| predicate(key.as_ref()).then_some(key))
            .collect();

        for key in &keys {
            self.cache.invalidate(key.as_ref());
        }

        let count = keys.len() as u64;
        self.metrics.record_invalidations(count);
        count
    }

    /// Drops every entry.
    pub fn invalidate_all(&self) {
        self.cache.run_pending_tasks();
        let count = self.cache.entry_count();
        self.cache.invalidate_all();
        self.metrics.record_invalidations(count);
    }

    /// Entries currently held, after pending maintenance.
    pub fn entry_count(&self) -> u64 {
        self.cache.run_pending_tasks();
        self.cache.entry_count()
    }

    /// Shared counters.
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        Arc::clone(&self.metrics)
    }

    /// Counters keyed by name.
    pub fn stats(&self) -> HashMap<String, u64> {
        let mut stats = self.metrics.get_stats();
        stats.insert("entry_count".to_string(), self.entry_count());
        stats
    }
}

/// Aggregation a query asks for, with every parameter that changes its result.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Query {
    /// Per-key monthly series.
    Monthly {
        /// Grouping key.
        dimension: Dimension,
        /// Averaged quantity.
        metric: Metric,
        /// Order of the returned keys.
        order: KeyOrder,
    },
    /// Per-key ratio over the whole selection.
    Overall {
        /// Grouping key.
        dimension: Dimension,
        /// Averaged quantity.
        metric: Metric,
        /// Order of the returned groups.
        order: KeyOrder,
    },
    /// Per-day means.
    Daily {
        /// Averaged quantity.
        metric: Metric,
    },
    /// Monthly series per indicator.
    IndicatorTrends {
        /// Indicators to trend, in output order.
        indicators: Vec<Indicator>,
    },
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Monthly { dimension, metric, .. } => write!(f, "monthly:{dimension}:{metric}"),
            Self::Overall { dimension, metric, .. } => write!(f, "overall:{dimension}:{metric}"),
            Self::Daily { metric } => write!(f, "daily:{metric}"),
            Self::IndicatorTrends { indicators } => write!(f, "indicator_trends:{}", indicators.len()),
        }
    }
}

/// Cache key for aggregated data with all relevant parameters
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct QueryKey {
    /// Dataset the query ran over.
    pub source: SourceId,
    /// Interval and allow-lists applied first.
    pub selection: Selection,
    /// Aggregation and its parameters.
    pub query: Query,
}

/// Cached data variants for the aggregation kinds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CachedData {
    /// Monthly series.
    Series(Arc<Vec<Series>>),
    /// Per-key summary points.
    Groups(Arc<Vec<GroupRatio>>),
    /// Per-day points.
    Daily(Arc<Vec<DailyPoint>>),
}

/// Memoized aggregation results, keyed by source, selection and query.
pub struct QueryCache {
    memo: Memo<QueryKey, CachedData>,
}

impl QueryCache {
    /// Cache holding at most `max_capacity` results that never go stale.
    pub fn new(max_capacity: u64) -> Self {
        Self {
            memo: Memo::new(max_capacity),
        }
    }

    /// Cache sized and aged by the configured settings.
    pub fn from_settings(settings: &CacheSettings) -> Self {
        Self {
            memo: Memo::new(settings.max_capacity).with_policy(policy_from_settings(settings)),
        }
    }

    /// Checks every lookup against `policy`.
    #[must_use]
    pub fn with_policy(self, policy: Arc<dyn InvalidationPolicy>) -> Self {
        Self {
            memo: self.memo.with_policy(policy),
        }
    }

    /// Cached result for `key`, or the result of `compute`. Errors are not cached.
    #[instrument(skip(self, compute), fields(query = %key.query, source = %key.source))]
    pub fn get_or_compute<F>(&self, key: QueryKey, compute: F) -> Result<CachedData>
    where
        F: FnOnce() -> Result<CachedData>,
    {
        self.memo.get_or_try_insert_with(key, compute)
    }

    /// Drops every result computed from `source`.
    pub fn invalidate_source(&self, source: &SourceId) -> u64 {
        let count = self.memo.invalidate_where(|key| &key.source == source);
        info!("Invalidated {} cached results for {}", count, source);
        count
    }

    /// Drops every cached result.
    pub fn invalidate_all(&self) {
        info!("Invalidating all cached results");
        self.memo.invalidate_all();
    }

    /// Shared counters.
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        self.memo.metrics()
    }

    /// Counters keyed by name.
    pub fn stats(&self) -> HashMap<String, u64> {
        self.memo.stats()
    }
}

/// Identity of a dataset load request: the file, the content it held and how
/// its columns are read.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SourceKey {
    /// File the dataset was read from.
    pub path: PathBuf,
    /// Row layout used to parse it.
    pub layout: DataLayout,
    /// Field delimiter.
    pub delimiter: u8,
    /// Column mapping.
    pub columns: ColumnsConfig,
    /// Fingerprint of the file content, so edits at the same path miss.
    pub revision: u64,
}

impl SourceKey {
    /// Key for reading `content`, fetched from `source`, with `layout`.
    pub fn new(source: &CsvSource, layout: DataLayout, content: &[u8]) -> Self {
        Self {
            path: source.path().to_path_buf(),
            layout,
            delimiter: source.delimiter(),
            columns: source.columns().clone(),
            revision: content_revision(content),
        }
    }
}

/// Memoized dataset loads.
pub struct DatasetCache<R> {
    memo: Memo<SourceKey, Arc<Dataset<R>>>,
}

impl<R> DatasetCache<R>
where
    R: Send + Sync + 'static,
{
    /// Cache holding at most `max_capacity` datasets.
    pub fn new(max_capacity: u64) -> Self {
        Self {
            memo: Memo::new(max_capacity),
        }
    }

    /// Checks every lookup against `policy`.
    #[must_use]
    pub fn with_policy(self, policy: Arc<dyn InvalidationPolicy>) -> Self {
        Self {
            memo: self.memo.with_policy(policy),
        }
    }

    /// Cached dataset for `key`, or the result of `load`. Failed loads are not cached.
    #[instrument(skip(self, load), fields(path = %key.path.display()))]
    pub fn get_or_load<F>(&self, key: SourceKey, load: F) -> Result<Arc<Dataset<R>>>
    where
        F: FnOnce() -> Result<Dataset<R>>,
    {
        self.memo.get_or_try_insert_with(key, || load().map(Arc::new))
    }

    /// Dataset for the current content of `source`.
    ///
    /// The file is read on every call but parsed only when its revision is not
    /// cached yet. Loads of older revisions of the same file are dropped then.
    pub fn load_csv<L>(&self, source: &CsvSource, layout: DataLayout) -> Result<Arc<Dataset<R>>>
    where
        L: RowLayout<Row = R>,
    {
        let content = source.fetch()?;
        let key = SourceKey::new(source, layout, &content);
        let revision = key.revision;

        self.get_or_load(key, || {
            let stale = self
                .memo
                .invalidate_where(|k| k.path.as_path() == source.path() && k.revision != revision);
            if stale > 0 {
                debug!("Dropped {} outdated loads of {}", stale, source.path().display());
            }
            source.load_bytes::<L>(&content)
        })
    }

    /// Drops every cached load of `path`.
    pub fn invalidate_path(&self, path: &std::path::Path) -> u64 {
        self.memo.invalidate_where(|key| key.path == path)
    }

    /// Drops every cached dataset.
    pub fn invalidate_all(&self) {
        self.memo.invalidate_all();
    }

    /// Shared counters.
    pub fn metrics(&self) -> Arc<CacheMetrics> {
        self.memo.metrics()
    }
}
