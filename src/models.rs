//! Data types and associated functions and methods

use crate::sampler::SampleMode;
use crate::types::{MetricPoint, Series, SeriesRole, ValueFlag};

use serde::{Deserialize, Serialize};
use strum_macros::Display;
use validator::{Validate, ValidationError};

/// Identity of a metric series.
#[derive(Clone, Debug, Deserialize, Eq, Hash, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SeriesKey {
    /// Tenant (organisation) identifier
    #[validate(length(min = 1, message = "tenant_id must not be empty"))]
    pub tenant_id: String,
    /// Project name
    #[validate(length(min = 1, message = "project must not be empty"))]
    pub project: String,
    /// Run identifier
    #[validate(length(min = 1, message = "run_id must not be empty"))]
    pub run_id: String,
    /// Logged metric name
    #[validate(length(min = 1, message = "metric must not be empty"))]
    pub metric: String,
}

impl SeriesKey {
    /// Return a new SeriesKey.
    pub fn new(tenant_id: &str, project: &str, run_id: &str, metric: &str) -> Self {
        Self {
            tenant_id: tenant_id.to_string(),
            project: project.to_string(),
            run_id: run_id.to_string(),
            metric: metric.to_string(),
        }
    }
}

impl std::fmt::Display for SeriesKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}/{}/{}",
            self.tenant_id, self.project, self.run_id, self.metric
        )
    }
}

/// An inclusive step range.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_step_range"))]
pub struct StepRange {
    /// First step in range
    pub min: u64,
    /// Last step in range
    pub max: u64,
}

impl StepRange {
    /// Return a new StepRange.
    #[allow(dead_code)]
    pub fn new(min: u64, max: u64) -> Self {
        StepRange { min, max }
    }
}

/// Validate a step range
fn validate_step_range(range: &StepRange) -> Result<(), ValidationError> {
    if range.min > range.max {
        let mut error = ValidationError::new("Step range min must not exceed max");
        error.add_param("min".into(), &range.min);
        error.add_param("max".into(), &range.max);
        return Err(error);
    }
    Ok(())
}

/// Supported smoothing algorithms
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SmoothingAlgorithm {
    /// Time-weighted exponential moving average
    Twema,
    /// Exponential moving average
    Ema,
    /// Gaussian-weighted average
    Gaussian,
    /// Box-car running average
    Running,
}

/// User smoothing preferences, read per invocation.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SmoothingSettings {
    /// Whether user smoothing is applied
    pub enabled: bool,
    /// Selected algorithm
    pub algorithm: SmoothingAlgorithm,
    /// Algorithm parameter: window size, sigma or weight. Degenerate values
    /// are clamped by the kernels rather than rejected.
    pub parameter: f64,
    /// Whether to show the raw shape under the smoothed curve
    #[serde(default)]
    pub show_original_data: bool,
}

impl Default for SmoothingSettings {
    fn default() -> Self {
        Self {
            enabled: false,
            algorithm: SmoothingAlgorithm::Twema,
            parameter: 0.0,
            show_original_data: false,
        }
    }
}

/// Request data for the bounded sampler
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize, Validate)]
#[serde(deny_unknown_fields)]
pub struct SampleRequest {
    /// Series to sample
    #[validate]
    pub key: SeriesKey,
    /// Optional step range to sample within
    #[validate]
    pub range: Option<StepRange>,
    /// Maximum points to return; 0 means unlimited
    #[serde(default)]
    pub max_points: usize,
    /// Fast preview request
    #[serde(default)]
    pub preview: bool,
}

/// Response from the bounded sampler.
#[derive(Debug, Deserialize, PartialEq, Serialize)]
pub struct SampleResponse {
    /// Series that was sampled
    pub key: SeriesKey,
    /// Sampling mode that was applied
    pub mode: SampleMode,
    /// Number of points in range before sampling
    pub total: usize,
    /// The sampled points, step ascending
    pub points: Vec<MetricPoint>,
}

/// Request data for the batch sampler. The sampling contract is applied
/// independently per key; no cross-key cadence is guaranteed.
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct BatchSampleRequest {
    /// Series to sample
    #[validate]
    #[validate(length(min = 1, message = "keys must not be empty"))]
    pub keys: Vec<SeriesKey>,
    /// Optional step range applied to every key
    #[validate]
    pub range: Option<StepRange>,
    /// Maximum points per series; 0 means unlimited
    #[serde(default)]
    pub max_points: usize,
    /// Fast preview request
    #[serde(default)]
    pub preview: bool,
}

/// Response from the batch sampler.
#[derive(Debug, Serialize)]
pub struct BatchSampleResponse {
    /// One sample per requested key, in request order
    pub series: Vec<SampleResponse>,
}

/// Request data for the reduction pipeline over posted points.
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct ReduceRequest {
    /// Display label for the series
    #[validate(length(min = 1, message = "label must not be empty"))]
    pub label: String,
    /// Raw points, step ascending
    pub points: Vec<MetricPoint>,
    /// Maximum points per output series; 0 disables downsampling
    #[serde(default)]
    pub max_points: usize,
    /// User smoothing settings
    #[validate]
    #[serde(default)]
    pub smoothing: SmoothingSettings,
    /// Whether the series shares a chart with other metrics
    #[serde(default)]
    pub multi_metric: bool,
}

/// Response from the reduction pipeline.
#[derive(Debug, Serialize)]
pub struct ReduceResponse {
    /// Assembled plot series
    pub series: Vec<SeriesPayload>,
    /// Number of raw points the series were derived from
    pub raw_points: usize,
}

/// A point submitted for ingest.
///
/// JSON cannot carry NaN or the infinities, so non-finite observations arrive
/// as a default (0.0) value plus a flag. The ingest path re-classifies every
/// value, so a flagged point always stores the sanitised placeholder.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
#[serde(deny_unknown_fields)]
pub struct IngestPoint {
    /// Step at which the value was logged
    pub step: u64,
    /// Wall-clock time of the observation
    pub time: f64,
    /// The value; ignored when `value_flag` is set
    #[serde(default)]
    pub value: f64,
    /// Original finiteness classification
    #[serde(default)]
    pub value_flag: ValueFlag,
}

impl IngestPoint {
    /// Sanitise into a MetricPoint.
    pub fn sanitise(self) -> MetricPoint {
        if self.value_flag.is_finite() {
            MetricPoint::new(self.step, self.time, self.value)
        } else {
            MetricPoint {
                step: self.step,
                time: self.time,
                value: 0.0,
                value_flag: self.value_flag,
            }
        }
    }
}

/// Request data for ingest.
#[derive(Debug, Deserialize, PartialEq, Validate)]
#[serde(deny_unknown_fields)]
pub struct IngestRequest {
    /// Series to append to
    #[validate]
    pub key: SeriesKey,
    /// Points to append
    #[validate(length(min = 1, message = "points must not be empty"))]
    pub points: Vec<IngestPoint>,
}

/// Response from ingest.
#[derive(Debug, Serialize)]
pub struct IngestResponse {
    /// Series that was appended to
    pub key: SeriesKey,
    /// Number of points appended
    pub appended: usize,
    /// Number of points now stored for the series
    pub total: usize,
}

/// Response listing known series.
#[derive(Debug, Serialize)]
pub struct SeriesListResponse {
    /// Known series keys
    pub series: Vec<SeriesKey>,
}

/// A flagged x position on the wire.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq, Serialize)]
pub struct FlagEntry {
    /// X value of the flagged position
    pub x: f64,
    /// The flag
    pub flag: ValueFlag,
}

/// Wire representation of an assembled plot series.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
pub struct SeriesPayload {
    /// Display label
    pub label: String,
    /// Role within the assembled bundle
    pub role: SeriesRole,
    /// Whether the series appears in the legend
    pub in_legend: bool,
    /// Display opacity in [0, 1]
    pub opacity: f64,
    /// Optional stable identifier for in-place chart updates
    #[serde(skip_serializing_if = "Option::is_none")]
    pub series_id: Option<String>,
    /// Optional display colour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
    /// X values
    pub x: Vec<f64>,
    /// Y values
    pub y: Vec<f64>,
    /// Non-finite positions, ascending by x
    pub value_flags: Vec<FlagEntry>,
}

impl From<Series> for SeriesPayload {
    fn from(series: Series) -> Self {
        let mut value_flags: Vec<FlagEntry> = series
            .value_flags
            .iter()
            .map(|(&bits, &flag)| FlagEntry {
                x: f64::from_bits(bits),
                flag,
            })
            .collect();
        value_flags.sort_by(|a, b| a.x.total_cmp(&b.x));
        Self {
            label: series.label,
            role: series.role,
            in_legend: series.role.in_legend(),
            opacity: series.opacity,
            series_id: series.series_id,
            color: series.color,
            x: series.x,
            y: series.y,
            value_flags,
        }
    }
}
