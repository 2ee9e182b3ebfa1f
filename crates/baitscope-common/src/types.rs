//! Common type definitions and closed vocabularies for domain modeling.

use crate::{BaitscopeError, Result};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// Editorial section a headline was published under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Politics.
    Politics,
    /// Finance and business.
    Finance,
    /// Entertainment.
    Entertainment,
    /// Health.
    Health,
    /// Lifestyle.
    Life,
    /// Science and technology.
    Tech,
    /// International news.
    Global,
}

impl Category {
    /// Every category, in canonical order.
    pub const ALL: [Self; 7] = [
        Self::Politics,
        Self::Finance,
        Self::Entertainment,
        Self::Health,
        Self::Life,
        Self::Tech,
        Self::Global,
    ];

    /// Canonical lowercase name.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Politics => "politics",
            Self::Finance => "finance",
            Self::Entertainment => "entertainment",
            Self::Health => "health",
            Self::Life => "life",
            Self::Tech => "tech",
            Self::Global => "global",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = BaitscopeError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| BaitscopeError::contract_param(format!("unknown category '{s}'"), "category"))
    }
}

/// Bait technique scored per headline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Indicator {
    /// Withholds information so the reader has to click ("this is why...").
    #[serde(rename = "forward-referencing")]
    ForwardReferencing,
    /// Emotionally charged wording.
    #[serde(rename = "emotional")]
    Emotional,
    /// Phrased as a question.
    #[serde(rename = "interrogative")]
    Interrogative,
    /// Signals a surprise or twist.
    #[serde(rename = "surprise")]
    Surprise,
    /// Trails off with an ellipsis.
    #[serde(rename = "ellipsis")]
    Ellipsis,
    /// Numbered list ("5 things...").
    #[serde(rename = "list")]
    List,
    /// How-to or tutorial framing.
    #[serde(rename = "how_to")]
    HowTo,
    /// Exclamations and interjections.
    #[serde(rename = "interjection")]
    Interjection,
    /// Promises to reveal a secret.
    #[serde(rename = "spillthebeans")]
    SpillTheBeans,
    /// Celebrity or private-life gossip.
    #[serde(rename = "gossip")]
    Gossip,
    /// Bait phrase at the end of the headline.
    #[serde(rename = "ending_words")]
    EndingWords,
    /// Quotes or cites netizens.
    #[serde(rename = "netizen")]
    Netizen,
    /// Exaggerated claims.
    #[serde(rename = "exaggerated")]
    Exaggerated,
    /// Hedged or uncertain claims.
    #[serde(rename = "uncertainty")]
    Uncertainty,
}

impl Indicator {
    /// Size of the vocabulary.
    pub const COUNT: usize = 14;

    /// Every indicator, in column order of the processed dataset.
    pub const ALL: [Self; Self::COUNT] = [
        Self::ForwardReferencing,
        Self::Emotional,
        Self::Interrogative,
        Self::Surprise,
        Self::Ellipsis,
        Self::List,
        Self::HowTo,
        Self::Interjection,
        Self::SpillTheBeans,
        Self::Gossip,
        Self::EndingWords,
        Self::Netizen,
        Self::Exaggerated,
        Self::Uncertainty,
    ];

    /// Column name used by the processed dataset.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ForwardReferencing => "forward-referencing",
            Self::Emotional => "emotional",
            Self::Interrogative => "interrogative",
            Self::Surprise => "surprise",
            Self::Ellipsis => "ellipsis",
            Self::List => "list",
            Self::HowTo => "how_to",
            Self::Interjection => "interjection",
            Self::SpillTheBeans => "spillthebeans",
            Self::Gossip => "gossip",
            Self::EndingWords => "ending_words",
            Self::Netizen => "netizen",
            Self::Exaggerated => "exaggerated",
            Self::Uncertainty => "uncertainty",
        }
    }

    /// Position inside [`Indicator::ALL`].
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Indicator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Indicator {
    type Err = BaitscopeError;

    fn from_str(s: &str) -> Result<Self> {
        let needle = s.trim();
        Self::ALL
            .into_iter()
            .find(|i| i.as_str().eq_ignore_ascii_case(needle))
            .ok_or_else(|| {
                BaitscopeError::contract_param(format!("unknown indicator '{s}'"), "indicator")
            })
    }
}

/// A news outlet name. Cheap to clone, shared by every record of the outlet.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Publisher(Arc<str>);

impl Publisher {
    /// Creates a publisher from its display name.
    pub fn new(name: impl AsRef<str>) -> Self {
        Self(Arc::from(name.as_ref().trim()))
    }

    /// Display name.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Publisher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Publisher {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Calendar month without a day component.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    /// Creates a month, rejecting months outside 1..=12.
    pub fn new(year: i32, month: u32) -> Result<Self> {
        if (1..=12).contains(&month) {
            Ok(Self { year, month })
        } else {
            Err(BaitscopeError::contract_param(
                format!("month {month} is outside 1..=12"),
                "month",
            ))
        }
    }

    /// Month containing `date`.
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            year: date.year(),
            month: date.month(),
        }
    }

    /// Calendar year.
    pub const fn year(self) -> i32 {
        self.year
    }

    /// Month of the year, 1 to 12.
    pub const fn month(self) -> u32 {
        self.month
    }

    /// First calendar day of the month.
    pub fn first_day(self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    /// The following month.
    pub const fn succ(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl FromStr for YearMonth {
    type Err = BaitscopeError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || BaitscopeError::contract_param(format!("invalid month '{s}', expected YYYY-MM"), "month");
        let (year, month) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year = year.parse().map_err(|_| invalid())?;
        let month = month.parse().map_err(|_| invalid())?;
        Self::new(year, month)
    }
}

impl From<YearMonth> for String {
    fn from(value: YearMonth) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for YearMonth {
    type Error = BaitscopeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

/// Categorical column records are grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dimension {
    /// News outlet.
    Publisher,
    /// Editorial section.
    Category,
}

impl Dimension {
    /// Lowercase name, as used in configuration and chart ids.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Publisher => "publisher",
            Self::Category => "category",
        }
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Dimension {
    type Err = BaitscopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "publisher" | "press" => Ok(Self::Publisher),
            "category" => Ok(Self::Category),
            _ => Err(BaitscopeError::contract_param(
                format!("unknown grouping dimension '{s}'"),
                "dimension",
            )),
        }
    }
}

/// Order in which grouped series are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum KeyOrder {
    /// Sorted by key name.
    #[default]
    Lexical,
    /// Order of first appearance in the input.
    FirstSeen,
}

impl FromStr for KeyOrder {
    type Err = BaitscopeError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "lexical" => Ok(Self::Lexical),
            "first_seen" => Ok(Self::FirstSeen),
            _ => Err(BaitscopeError::contract_param(format!("unknown key order '{s}'"), "key_order")),
        }
    }
}

/// Value averaged inside a bucket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum Metric {
    /// The binary clickbait label.
    Clickbait,
    /// One indicator score column.
    Indicator(Indicator),
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Clickbait => f.write_str("clickbait"),
            Self::Indicator(indicator) => f.write_str(indicator.as_str()),
        }
    }
}

impl FromStr for Metric {
    type Err = BaitscopeError;

    fn from_str(s: &str) -> Result<Self> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("clickbait") || trimmed.eq_ignore_ascii_case("isclickbait") {
            return Ok(Self::Clickbait);
        }
        trimmed.parse().map(Self::Indicator)
    }
}

impl From<Metric> for String {
    fn from(value: Metric) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for Metric {
    type Error = BaitscopeError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<Indicator> for Metric {
    fn from(indicator: Indicator) -> Self {
        Self::Indicator(indicator)
    }
}

/// How monthly series are smoothed before plotting.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum SmoothingMode {
    /// Raw bucket values.
    None,
    /// Exponentially weighted moving average, `alpha` in (0, 1].
    Ewma {
        /// Weight of the newest month.
        alpha: f64,
    },
    /// Trailing simple moving average over `window` months.
    Rolling {
        /// Window length in months.
        window: usize,
    },
}

impl SmoothingMode {
    /// Checks the parameter against its documented range.
    pub fn validate(&self) -> Result<()> {
        match *self {
            Self::None => Ok(()),
            Self::Ewma { alpha } if alpha > 0.0 && alpha <= 1.0 => Ok(()),
            Self::Ewma { alpha } => Err(BaitscopeError::contract_param(
                format!("smoothing factor {alpha} must be in (0, 1]"),
                "alpha",
            )),
            Self::Rolling { window } if window >= 1 => Ok(()),
            Self::Rolling { window } => Err(BaitscopeError::contract_param(
                format!("rolling window {window} must be at least 1"),
                "window",
            )),
        }
    }
}

impl Default for SmoothingMode {
    fn default() -> Self {
        Self::Ewma { alpha: 0.4 }
    }
}

impl fmt::Display for SmoothingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str("none"),
            Self::Ewma { alpha } => write!(f, "ewma(alpha={alpha})"),
            Self::Rolling { window } => write!(f, "rolling(window={window})"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_parsing_is_case_insensitive() {
        assert_eq!("Politics".parse::<Category>().unwrap(), Category::Politics);
        assert_eq!(" tech ".parse::<Category>().unwrap(), Category::Tech);
        assert!("sports".parse::<Category>().unwrap_err().is_contract());
    }

    #[test]
    fn test_indicator_vocabulary_order_matches_index() {
        for (position, indicator) in Indicator::ALL.iter().enumerate() {
            assert_eq!(indicator.index(), position);
        }
        assert_eq!(
            "forward-referencing".parse::<Indicator>().unwrap(),
            Indicator::ForwardReferencing
        );
    }

    #[test]
    fn test_year_month_ordering_and_succ() {
        let dec = YearMonth::new(2017, 12).unwrap();
        let jan = dec.succ();
        assert_eq!(jan, YearMonth::new(2018, 1).unwrap());
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2018-01");
        assert_eq!("2018-01".parse::<YearMonth>().unwrap(), jan);
        assert!(YearMonth::new(2018, 13).is_err());
    }

    #[test]
    fn test_metric_round_trips_through_string() {
        let metric = Metric::Indicator(Indicator::HowTo);
        let json = serde_json::to_string(&metric).unwrap();
        assert_eq!(json, "\"how_to\"");
        assert_eq!(serde_json::from_str::<Metric>(&json).unwrap(), metric);
        assert_eq!("IsClickbait".parse::<Metric>().unwrap(), Metric::Clickbait);
    }

    #[test]
    fn test_smoothing_mode_validation() {
        assert!(SmoothingMode::Ewma { alpha: 1.0 }.validate().is_ok());
        assert!(SmoothingMode::Ewma { alpha: 0.0 }.validate().is_err());
        assert!(SmoothingMode::Ewma { alpha: f64::NAN }.validate().is_err());
        assert!(SmoothingMode::Rolling { window: 0 }.validate().is_err());
        assert!(SmoothingMode::Rolling { window: 4 }.validate().is_ok());
        assert!(SmoothingMode::None.validate().is_ok());
    }
}
