//! CSV data sources and the loaded, read-only dataset

use crate::record::{CountRecord, IndicatorScores, Observation, Record};
use crate::selector::DateInterval;
use baitscope_common::{parse_date, parse_flag, parse_score, BaitscopeError, Category, Indicator, Publisher, Result};
use baitscope_config::{ColumnsConfig, DataConfig};
use csv::StringRecord;
use serde::{Deserialize, Serialize};
use std::collections::hash_map::DefaultHasher;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Identity of a loaded dataset: where it came from and which content it had.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SourceId {
    /// File path or caller-chosen name.
    pub name: String,
    /// Fingerprint of the content the dataset was parsed from.
    pub revision: u64,
}

impl SourceId {
    /// Fingerprints `content` for the source called `name`.
    pub fn fingerprint(name: impl Into<String>, content: &[u8]) -> Self {
        Self {
            name: name.into(),
            revision: content_revision(content),
        }
    }
}

/// Content fingerprint; equal content always yields the same revision.
pub fn content_revision(content: &[u8]) -> u64 {
    let mut hasher = DefaultHasher::new();
    content.hash(&mut hasher);
    hasher.finish()
}

impl fmt::Display for SourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:016x}", self.name, self.revision)
    }
}

/// The loaded record set. Cloning shares the records.
#[derive(Debug, Clone)]
pub struct Dataset<R = Record> {
    source: SourceId,
    records: Arc<[R]>,
    indicators: Vec<Indicator>,
    publishers: Vec<Publisher>,
}

impl<R: Observation> Dataset<R> {
    /// Wraps `records`, collecting the distinct publishers in first-seen order.
    pub fn new(source: SourceId, records: Vec<R>, indicators: Vec<Indicator>) -> Self {
        let mut seen = HashSet::new();
        let publishers = records
            .iter()
            .filter(|r| seen.insert(r.publisher().clone()))
            .map(|r| r.publisher().clone())
            .collect();

        Self {
            source,
            records: records.into(),
            indicators,
            publishers,
        }
    }

    /// Identity of the loaded content.
    pub fn source(&self) -> &SourceId {
        &self.source
    }

    /// Every loaded row, in file order.
    pub fn records(&self) -> &[R] {
        &self.records
    }

    /// Shared handle on the records.
    pub fn shared_records(&self) -> Arc<[R]> {
        Arc::clone(&self.records)
    }

    /// Indicator columns present in the source, in vocabulary order.
    pub fn indicators(&self) -> &[Indicator] {
        &self.indicators
    }

    /// Whether the source had a column for `indicator`.
    pub fn has_indicator(&self, indicator: Indicator) -> bool {
        self.indicators.contains(&indicator)
    }

    /// Distinct publishers in order of first appearance.
    pub fn publishers(&self) -> &[Publisher] {
        &self.publishers
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether no row was loaded.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Earliest to latest record date, `None` for an empty dataset.
    pub fn date_span(&self) -> Option<DateInterval> {
        let start = self.records.iter().map(Observation::date).min()?;
        let end = self.records.iter().map(Observation::date).max()?;
        Some(DateInterval::new(start, end))
    }
}

/// Maps the columns of one header onto a row type.
pub trait RowLayout: Sized {
    /// Row type produced by the layout.
    type Row: Observation;

    /// Resolves column positions, failing when a required column is missing.
    fn bind(headers: &StringRecord, columns: &ColumnsConfig) -> Result<Self>;

    /// Parses one data row; `line` is the 1-based line of the row in the file.
    fn parse(&self, row: &StringRecord, line: u64) -> Result<Self::Row>;

    /// Indicators this layout reads.
    fn indicators(&self) -> Vec<Indicator>;
}

/// One row per article with a clickbait flag and indicator scores.
#[derive(Debug, Clone)]
pub struct ArticleLayout {
    keys: KeyColumns,
    clickbait: Column,
    indicators: Vec<(Indicator, Column)>,
}

/// One row per (publisher, category, date) with clickbait and total counters.
#[derive(Debug, Clone)]
pub struct CountLayout {
    keys: KeyColumns,
    clickbait_count: Column,
    total_count: Column,
}

#[derive(Debug, Clone)]
struct Column {
    name: String,
    index: usize,
}

#[derive(Debug, Clone)]
struct KeyColumns {
    date: Column,
    publisher: Column,
    category: Column,
}

impl KeyColumns {
    fn bind(headers: &StringRecord, columns: &ColumnsConfig) -> Result<Self> {
        Ok(Self {
            date: require(headers, &columns.date)?,
            publisher: require(headers, &columns.publisher)?,
            category: require(headers, &columns.category)?,
        })
    }

    fn parse(&self, row: &StringRecord, line: u64) -> Result<(Publisher, Category, chrono::NaiveDate)> {
        let raw_date = field(row, &self.date, line)?;
        let date = parse_date(raw_date).ok_or_else(|| {
            BaitscopeError::load_at(format!("invalid date '{raw_date}'"), line, &self.date.name)
        })?;

        let raw_publisher = field(row, &self.publisher, line)?;
        let publisher = Publisher::new(raw_publisher);
        if publisher.as_str().is_empty() {
            return Err(BaitscopeError::load_at("empty publisher", line, &self.publisher.name));
        }

        let raw_category = field(row, &self.category, line)?;
        let category = raw_category.parse::<Category>().map_err(|_| {
            BaitscopeError::load_at(format!("unknown category '{raw_category}'"), line, &self.category.name)
        })?;

        Ok((publisher, category, date))
    }
}

impl RowLayout for ArticleLayout {
    type Row = Record;

    fn bind(headers: &StringRecord, columns: &ColumnsConfig) -> Result<Self> {
        let keys = KeyColumns::bind(headers, columns)?;
        let clickbait = require(headers, &columns.clickbait)?;

        let mut indicators = Vec::new();
        for indicator in Indicator::ALL {
            match position(headers, indicator.as_str()) {
                Some(column) => indicators.push((indicator, column)),
                None if columns.indicators.contains(&indicator) => {
                    return Err(missing_column(indicator.as_str()));
                }
                None => {}
            }
        }

        Ok(Self {
            keys,
            clickbait,
            indicators,
        })
    }

    fn parse(&self, row: &StringRecord, line: u64) -> Result<Record> {
        let (publisher, category, date) = self.keys.parse(row, line)?;

        let raw_flag = field(row, &self.clickbait, line)?;
        let is_clickbait = parse_flag(raw_flag).ok_or_else(|| {
            BaitscopeError::load_at(format!("invalid clickbait flag '{raw_flag}'"), line, &self.clickbait.name)
        })?;

        let mut scores = IndicatorScores::empty();
        for (indicator, column) in &self.indicators {
            let raw = field(row, column, line)?;
            let score = parse_score(raw).ok_or_else(|| {
                BaitscopeError::load_at(format!("invalid score '{raw}'"), line, &column.name)
            })?;
            scores.set(*indicator, score);
        }

        Ok(Record {
            publisher,
            category,
            date,
            is_clickbait,
            indicators: scores,
        })
    }

    fn indicators(&self) -> Vec<Indicator> {
        self.indicators.iter().map(|(indicator, _)| *indicator).collect()
    }
}

impl RowLayout for CountLayout {
    type Row = CountRecord;

    fn bind(headers: &StringRecord, columns: &ColumnsConfig) -> Result<Self> {
        Ok(Self {
            keys: KeyColumns::bind(headers, columns)?,
            clickbait_count: require(headers, &columns.clickbait_count)?,
            total_count: require(headers, &columns.total_count)?,
        })
    }

    fn parse(&self, row: &StringRecord, line: u64) -> Result<CountRecord> {
        let (publisher, category, date) = self.keys.parse(row, line)?;
        let clickbait_count = counter(row, &self.clickbait_count, line)?;
        let total_count = counter(row, &self.total_count, line)?;

        CountRecord::new(publisher, category, date, clickbait_count, total_count)
            .map_err(|e| BaitscopeError::load_at(e.to_string(), line, &self.clickbait_count.name))
    }

    fn indicators(&self) -> Vec<Indicator> {
        Vec::new()
    }
}

/// Delimited-file data source.
#[derive(Debug, Clone)]
pub struct CsvSource {
    path: PathBuf,
    delimiter: u8,
    columns: ColumnsConfig,
}

impl CsvSource {
    /// Comma-delimited source at `path`.
    pub fn new(path: impl Into<PathBuf>, columns: ColumnsConfig) -> Self {
        Self {
            path: path.into(),
            delimiter: b',',
            columns,
        }
    }

    /// Source described by the `[data]` configuration section.
    pub fn from_config(config: &DataConfig) -> Result<Self> {
        let delimiter = u8::try_from(config.delimiter).map_err(|_| {
            BaitscopeError::config(format!("delimiter '{}' is not a single byte", config.delimiter))
        })?;

        Ok(Self {
            path: config.path.clone(),
            delimiter,
            columns: config.columns.clone(),
        })
    }

    /// Uses `delimiter` instead of a comma.
    #[must_use]
    pub const fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// File read by [`CsvSource::load`].
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Column mapping.
    pub const fn columns(&self) -> &ColumnsConfig {
        &self.columns
    }

    /// Field delimiter.
    pub const fn delimiter(&self) -> u8 {
        self.delimiter
    }

    /// Reads the whole file. Any malformed row fails the load.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn load<L: RowLayout>(&self) -> Result<Dataset<L::Row>> {
        let content = self.fetch()?;
        self.load_bytes::<L>(&content)
    }

    /// Raw file content, read without parsing.
    pub fn fetch(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.path).map_err(|e| {
            BaitscopeError::load_with_source(format!("cannot read {}", self.path.display()), e)
        })
    }

    /// Parses content previously read from this source's file.
    pub fn load_bytes<L: RowLayout>(&self, content: &[u8]) -> Result<Dataset<L::Row>> {
        let dataset = self.parse::<L>(self.path.display().to_string(), content)?;
        info!(
            "Loaded {} rows from {} ({} publishers)",
            dataset.len(),
            self.path.display(),
            dataset.publishers().len()
        );
        Ok(dataset)
    }

    /// Reads rows from an arbitrary reader, named `name` in the resulting [`SourceId`].
    pub fn read<L: RowLayout, Rd: Read>(&self, name: impl Into<String>, mut reader: Rd) -> Result<Dataset<L::Row>> {
        let mut content = Vec::new();
        reader
            .read_to_end(&mut content)
            .map_err(|e| BaitscopeError::load_with_source("cannot read data source", e))?;
        self.parse::<L>(name.into(), &content)
    }

    fn parse<L: RowLayout>(&self, name: String, content: &[u8]) -> Result<Dataset<L::Row>> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .trim(csv::Trim::All)
            .from_reader(content);

        let headers = reader.headers()?.clone();
        let layout = L::bind(&headers, &self.columns)?;
        debug!("Bound {} columns, {} indicators", headers.len(), layout.indicators().len());

        let mut rows = Vec::new();
        for (offset, result) in reader.records().enumerate() {
            let row = result?;
            let line = row.position().map_or(offset as u64 + 2, csv::Position::line);
            rows.push(layout.parse(&row, line)?);
        }

        Ok(Dataset::new(SourceId::fingerprint(name, content), rows, layout.indicators()))
    }
}

fn position(headers: &StringRecord, name: &str) -> Option<Column> {
    headers.iter().position(|h| h == name).map(|index| Column {
        name: name.to_string(),
        index,
    })
}

fn require(headers: &StringRecord, name: &str) -> Result<Column> {
    position(headers, name).ok_or_else(|| missing_column(name))
}

fn missing_column(name: &str) -> BaitscopeError {
    BaitscopeError::load_at(format!("missing required column '{name}'"), 1, name)
}

fn field<'r>(row: &'r StringRecord, column: &Column, line: u64) -> Result<&'r str> {
    row.get(column.index)
        .ok_or_else(|| BaitscopeError::load_at("row is shorter than the header", line, &column.name))
}

fn counter(row: &StringRecord, column: &Column, line: u64) -> Result<u64> {
    let raw = field(row, column, line)?;
    raw.parse::<u64>().map_err(|_| {
        BaitscopeError::load_at(format!("invalid counter '{raw}'"), line, &column.name)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use baitscope_common::test_utils::{csv_fixtures, date};

    fn source() -> CsvSource {
        CsvSource::new("memory.csv", ColumnsConfig::default())
    }

    fn line_of(err: &BaitscopeError) -> Option<u64> {
        match err {
            BaitscopeError::Load { line, .. } => *line,
            _ => None,
        }
    }

    #[test]
    fn test_read_articles() {
        let text = csv_fixtures::small_dataset();
        let dataset = source().read::<ArticleLayout, _>("small", text.as_bytes()).unwrap();

        assert_eq!(dataset.len(), 6);
        assert_eq!(dataset.indicators(), Indicator::ALL.as_slice());
        assert_eq!(
            dataset.publishers(),
            &[Publisher::new("Apple Daily"), Publisher::new("Liberty Times")]
        );
        assert_eq!(dataset.records()[3].indicators.get(Indicator::Emotional), Some(0.5));

        let span = dataset.date_span().unwrap();
        assert_eq!(span.start, date(2017, 12, 30));
        assert_eq!(span.end, date(2018, 3, 3));
    }

    #[test]
    fn test_missing_column_fails() {
        let err = source()
            .read::<ArticleLayout, _>("bad", "Date,Press,Category\n2018-01-01,UDN,tech\n".as_bytes())
            .unwrap_err();
        assert!(err.is_load());
        assert!(err.to_string().contains("IsClickbait"));
    }

    #[test]
    fn test_optional_indicators() {
        let mut columns = ColumnsConfig::default();
        columns.indicators = vec![Indicator::Emotional];
        let text = "Date,Press,Category,IsClickbait,emotional\n2018-01-01,UDN,Tech,true,0.25\n";
        let dataset = CsvSource::new("x", columns)
            .read::<ArticleLayout, _>("x", text.as_bytes())
            .unwrap();

        assert_eq!(dataset.indicators(), &[Indicator::Emotional]);
        assert!(dataset.records()[0].is_clickbait);
        assert_eq!(dataset.records()[0].indicators.get(Indicator::Gossip), None);
    }

    #[test]
    fn test_bad_value_reports_line() {
        let mut columns = ColumnsConfig::default();
        columns.indicators.clear();
        let text = "Date,Press,Category,IsClickbait\n2018-01-01,UDN,tech,1\n2018-13-01,UDN,tech,0\n";
        let err = CsvSource::new("x", columns)
            .read::<ArticleLayout, _>("x", text.as_bytes())
            .unwrap_err();
        assert!(err.is_load());
        assert_eq!(line_of(&err), Some(3));
    }

    #[test]
    fn test_read_counts() {
        let dataset = source()
            .read::<CountLayout, _>("counts", csv_fixtures::count_dataset().as_bytes())
            .unwrap();
        assert_eq!(dataset.len(), 4);
        assert!(dataset.indicators().is_empty());
        assert_eq!(dataset.records()[0].clickbait_count, 2);
        assert_eq!(dataset.records()[0].total_count, 5);
    }

    #[test]
    fn test_count_overflow_is_load_error() {
        let text = "Date,Press,Category,clickbait_count,total_count\n2018-01-03,UDN,tech,3,2\n";
        let err = source().read::<CountLayout, _>("x", text.as_bytes()).unwrap_err();
        assert!(err.is_load());
        assert_eq!(line_of(&err), Some(2));
    }

    #[test]
    fn test_revision_tracks_content() {
        let a = SourceId::fingerprint("a", b"one");
        let b = SourceId::fingerprint("a", b"two");
        assert_ne!(a, b);
        assert_eq!(a, SourceId::fingerprint("a", b"one"));
    }

    #[test]
    fn test_semicolon_delimiter() {
        let mut columns = ColumnsConfig::default();
        columns.indicators.clear();
        let text = "Date;Press;Category;IsClickbait\n2018/02/03;UDN;life;0\n";
        let dataset = CsvSource::new("x", columns)
            .with_delimiter(b';')
            .read::<ArticleLayout, _>("x", text.as_bytes())
            .unwrap();
        assert_eq!(dataset.records()[0].date, date(2018, 2, 3));
    }
}
