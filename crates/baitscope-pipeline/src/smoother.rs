//! Per-series smoothing of monthly values

use crate::aggregator::Series;
use baitscope_common::{BaitscopeError, Result, SmoothingMode, YearMonth};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

/// A smoothing transform over one value sequence.
pub trait Smoother {
    /// Smoothed values, same length as `raw`.
    fn apply(&self, raw: &[f64]) -> Vec<f64>;
}

/// Exponentially weighted moving average seeded with the first raw value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ewma {
    alpha: f64,
}

impl Ewma {
    /// Smoother with factor `alpha`, which must lie in (0, 1].
    pub fn new(alpha: f64) -> Result<Self> {
        if !(alpha > 0.0 && alpha <= 1.0) {
            return Err(BaitscopeError::contract_param(
                format!("smoothing factor {alpha} must be in (0, 1]"),
                "alpha",
            ));
        }
        Ok(Self { alpha })
    }

    /// Smoothing factor.
    pub const fn alpha(&self) -> f64 {
        self.alpha
    }
}

impl Smoother for Ewma {
    fn apply(&self, raw: &[f64]) -> Vec<f64> {
        let mut smoothed = Vec::with_capacity(raw.len());
        let mut previous: Option<f64> = None;
        for &value in raw {
            let next = match previous {
                None => value,
                Some(prev) => self.alpha.mul_add(value, (1.0 - self.alpha) * prev),
            };
            smoothed.push(next);
            previous = Some(next);
        }
        smoothed
    }
}

/// Trailing mean over the last `window` values; the first positions use what is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingMean {
    window: usize,
}

impl RollingMean {
    /// Trailing mean over `window` months, at least 1.
    pub fn new(window: usize) -> Result<Self> {
        if window == 0 {
            return Err(BaitscopeError::contract_param("rolling window must be at least 1", "window"));
        }
        Ok(Self { window })
    }

    /// Window length in months.
    pub const fn window(&self) -> usize {
        self.window
    }
}

impl Smoother for RollingMean {
    #[allow(clippy::cast_precision_loss)]
    fn apply(&self, raw: &[f64]) -> Vec<f64> {
        (0..raw.len())
            .map(|i| {
                let slice = &raw[(i + 1).saturating_sub(self.window)..=i];
                slice.iter().sum::<f64>() / slice.len() as f64
            })
            .collect()
    }
}

/// Leaves values untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct Identity;

impl Smoother for Identity {
    fn apply(&self, raw: &[f64]) -> Vec<f64> {
        raw.to_vec()
    }
}

/// Builds the smoother for `mode`, rejecting out-of-range parameters.
pub fn smoother_for(mode: SmoothingMode) -> Result<Box<dyn Smoother + Send + Sync>> {
    Ok(match mode {
        SmoothingMode::None => Box::new(Identity),
        SmoothingMode::Ewma { alpha } => Box::new(Ewma::new(alpha)?),
        SmoothingMode::Rolling { window } => Box::new(RollingMean::new(window)?),
    })
}

/// Raw and smoothed value of one month.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SmoothedPoint {
    /// Calendar month.
    pub month: YearMonth,
    /// Bucket mean before smoothing.
    pub raw: f64,
    /// Value after smoothing.
    pub smoothed: f64,
}

/// A series with its smoothed counterpart on the same month axis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmoothedSeries {
    /// Key of the underlying series.
    pub key: String,
    /// Points in month order.
    pub points: Vec<SmoothedPoint>,
}

impl SmoothedSeries {
    /// Smoothed values in month order.
    pub fn smoothed_values(&self) -> Vec<f64> {
        self.points.iter().map(|p| p.smoothed).collect()
    }
}

/// Smooths one series.
pub fn smooth_series(series: &Series, smoother: &dyn Smoother) -> SmoothedSeries {
    let raw = series.values();
    let smoothed = smoother.apply(&raw);
    SmoothedSeries {
        key: series.key.clone(),
        points: series
            .points
            .iter()
            .zip(smoothed)
            .map(|(point, smoothed)| SmoothedPoint {
                month: point.month,
                raw: point.value,
                smoothed,
            })
            .collect(),
    }
}

/// Smooths every series independently; state never carries over between keys.
#[instrument(skip(series), fields(series = series.len()))]
pub fn smooth_all(series: &[Series], mode: SmoothingMode) -> Result<Vec<SmoothedSeries>> {
    let smoother = smoother_for(mode)?;
    debug!("Smoothing with {}", mode);
    Ok(series.iter().map(|s| smooth_series(s, smoother.as_ref())).collect())
}
