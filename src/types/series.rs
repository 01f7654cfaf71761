//! Metric points and plot series.

use crate::types::ValueFlag;

use hashbrown::HashMap;
use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// A single observation of a metric, as produced by the bounded sampler.
///
/// `value` holds a sanitised placeholder (0.0) when `value_flag` is not
/// [ValueFlag::Finite]; see [crate::types::flag].
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct MetricPoint {
    /// Step at which the value was logged
    pub step: u64,
    /// Wall-clock time of the observation, seconds since the epoch
    pub time: f64,
    /// The (sanitised) value
    pub value: f64,
    /// Original finiteness classification of the value
    #[serde(default)]
    pub value_flag: ValueFlag,
}

impl MetricPoint {
    /// Return a MetricPoint, classifying a raw value into (placeholder, flag).
    pub fn new(step: u64, time: f64, value: f64) -> Self {
        let (value, value_flag) = ValueFlag::classify(value);
        Self {
            step,
            time,
            value,
            value_flag,
        }
    }
}

/// Role of a series within an assembled plot bundle.
///
/// The role encodes the rendering contract: only [SeriesRole::Main] series
/// appear in legends and are eligible for smoothing. Envelope companions carry
/// local extrema, so smoothing them would hide real outliers.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SeriesRole {
    /// The primary series for a metric
    #[default]
    Main,
    /// A low-opacity copy of the pre-smoothing data
    Original,
    /// Per-window minimum of the downsampled data
    EnvelopeMin,
    /// Per-window maximum of the downsampled data
    EnvelopeMax,
}

impl SeriesRole {
    /// Whether series with this role appear in chart legends.
    pub fn in_legend(self) -> bool {
        matches!(self, SeriesRole::Main)
    }

    /// Whether series with this role may be smoothed.
    pub fn smoothable(self) -> bool {
        matches!(self, SeriesRole::Main)
    }
}

/// A plot series: paired x/y arrays plus rendering metadata.
///
/// Invariants: `x.len() == y.len()` and `x` is strictly ascending after
/// assembly. Non-finite positions are recorded in `value_flags`, keyed by the
/// bit pattern of the x value so lookups are exact.
#[derive(Clone, Debug, PartialEq)]
pub struct Series {
    /// X values (steps)
    pub x: Vec<f64>,
    /// Y values (sanitised)
    pub y: Vec<f64>,
    /// Display label
    pub label: String,
    /// Optional stable identifier for in-place chart updates
    pub series_id: Option<String>,
    /// Optional display colour
    pub color: Option<String>,
    /// Display opacity in [0, 1]
    pub opacity: f64,
    /// Role within the assembled bundle
    pub role: SeriesRole,
    /// Flags for non-finite positions, keyed by x bit pattern
    pub value_flags: HashMap<u64, ValueFlag>,
}

impl Series {
    /// Return an empty series with the given label.
    pub fn new(label: &str) -> Self {
        Self {
            x: Vec::new(),
            y: Vec::new(),
            label: label.to_string(),
            series_id: None,
            color: None,
            opacity: 1.0,
            role: SeriesRole::Main,
            value_flags: HashMap::new(),
        }
    }

    /// Build a series from sampled metric points, using the step as x.
    pub fn from_points(label: &str, points: &[MetricPoint]) -> Self {
        let mut series = Self::new(label);
        series.x.reserve(points.len());
        series.y.reserve(points.len());
        for point in points {
            let x = point.step as f64;
            series.x.push(x);
            series.y.push(point.value);
            if !point.value_flag.is_finite() {
                series.value_flags.insert(x.to_bits(), point.value_flag);
            }
        }
        series
    }

    /// Number of points in the series.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether the series contains no points.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Flag recorded for an x value, defaulting to finite.
    pub fn flag_at(&self, x: f64) -> ValueFlag {
        self.value_flags
            .get(&x.to_bits())
            .copied()
            .unwrap_or_default()
    }

    /// Whether the point at index `i` is a non-finite placeholder.
    pub fn is_flagged(&self, i: usize) -> bool {
        !self.flag_at(self.x[i]).is_finite()
    }

    /// Slice the series to `[x_min, x_max]` with a one-point margin on each
    /// side, so line segments crossing the viewport edge are not truncated.
    ///
    /// Flags for surviving x values are carried over. An empty series or an
    /// empty intersection yields an empty series.
    pub fn slice_with_margin(&self, x_min: f64, x_max: f64) -> Series {
        let mut out = Series {
            x: Vec::new(),
            y: Vec::new(),
            value_flags: HashMap::new(),
            ..self.clone()
        };
        if self.is_empty() || x_min > x_max {
            return out;
        }
        // x is ascending, so the visible window is a contiguous index range.
        let start = self.x.partition_point(|&x| x < x_min);
        let end = self.x.partition_point(|&x| x <= x_max);
        if start >= end {
            return out;
        }
        let start = start.saturating_sub(1);
        let end = (end + 1).min(self.len());
        out.x.extend_from_slice(&self.x[start..end]);
        out.y.extend_from_slice(&self.y[start..end]);
        for &x in &out.x {
            if let Some(flag) = self.value_flags.get(&x.to_bits()) {
                out.value_flags.insert(x.to_bits(), *flag);
            }
        }
        out
    }
}
