//! Bounded sampling of metric series.
//!
//! Callers fetching a series for plotting never need more points than the
//! chart can show, so the sampler bounds the number of points returned while
//! spanning the full requested range. Four modes cover the latency/fidelity
//! trade-offs:
//!
//! * **full**: every point in range, for small known ranges and zoom slices.
//! * **stride**: one point per stride of steps, so a fast preview populates
//!   across the entire visible range immediately rather than left-to-right.
//! * **head**: the first points by step order, a placeholder before the real
//!   sample arrives when no step range is known.
//! * **reservoir**: a deterministic quota rule that preserves the value
//!   distribution and always retains the final point, so trend endpoints are
//!   never dropped.

use crate::types::MetricPoint;

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// The sampling mode applied to a request.
#[derive(Clone, Copy, Debug, Deserialize, Display, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum SampleMode {
    /// Every point in range
    Full,
    /// One point per stride of steps across the range
    Stride,
    /// First `max_points` points by step order
    Head,
    /// Deterministic quota sampling with a forced final point
    Reservoir,
}

/// Choose the sampling mode for a request.
///
/// * `max_points == 0` disables sampling entirely.
/// * Previews use stride sampling when a step range is given, head sampling
///   otherwise.
/// * Everything else gets reservoir sampling.
pub fn choose_mode(max_points: usize, preview: bool, has_range: bool) -> SampleMode {
    if max_points == 0 {
        SampleMode::Full
    } else if preview && has_range {
        SampleMode::Stride
    } else if preview {
        SampleMode::Head
    } else {
        SampleMode::Reservoir
    }
}

/// A bounded sample of a series.
#[derive(Clone, Debug, PartialEq)]
pub struct Sampled {
    /// The sampled points, step ascending
    pub points: Vec<MetricPoint>,
    /// The mode that was applied
    pub mode: SampleMode,
    /// Number of points in range before sampling. `total == points.len()`
    /// means the sample is complete.
    pub total: usize,
}

/// Sample points already filtered to the requested range, in step order.
///
/// # Arguments
///
/// * `points`: Points in range, step ascending.
/// * `range`: The requested `(step_min, step_max)` range, if any. Only used to
///   compute the stride for preview sampling.
/// * `max_points`: Maximum points to return; 0 means unlimited.
/// * `preview`: Whether this is a fast preview request.
pub fn sample(
    points: Vec<MetricPoint>,
    range: Option<(u64, u64)>,
    max_points: usize,
    preview: bool,
) -> Sampled {
    let total = points.len();
    let mode = choose_mode(max_points, preview, range.is_some());
    let points = match mode {
        SampleMode::Full => points,
        SampleMode::Head => head(points, max_points),
        SampleMode::Stride => {
            // choose_mode only selects Stride when a range is present.
            let (step_min, step_max) = range.unwrap_or((0, 0));
            stride(points, step_min, step_max, max_points)
        }
        SampleMode::Reservoir => reservoir(points, max_points),
    };
    Sampled {
        points,
        mode,
        total,
    }
}

/// First `max_points` points by step order.
fn head(mut points: Vec<MetricPoint>, max_points: usize) -> Vec<MetricPoint> {
    points.truncate(max_points);
    points
}

/// One point per `ceil(range / max_points)` steps.
///
/// Buckets the step range and emits the first point seen in each bucket, so a
/// preview populates across the entire range immediately. Trades distribution
/// fidelity for latency.
fn stride(
    points: Vec<MetricPoint>,
    step_min: u64,
    step_max: u64,
    max_points: usize,
) -> Vec<MetricPoint> {
    let range = step_max.saturating_sub(step_min) + 1;
    let stride = range.div_ceil(max_points as u64).max(1);
    let mut out = Vec::new();
    let mut last_bucket = None;
    for point in points {
        let bucket = point.step.saturating_sub(step_min) / stride;
        if last_bucket != Some(bucket) {
            out.push(point);
            last_bucket = Some(bucket);
        }
    }
    out
}

/// Deterministic quota sampling.
///
/// With `total` points in range and `stride = ceil(total / max_points)`, a
/// point at 1-based position `rn` in step order is kept iff
/// `total <= max_points`, `rn % stride == 1`, or `rn == total`. The output
/// size is within one point of `max_points`, the final point of the range is
/// always included, and the result is deterministic for a fixed `total`.
fn reservoir(points: Vec<MetricPoint>, max_points: usize) -> Vec<MetricPoint> {
    let total = points.len();
    if total <= max_points {
        return points;
    }
    let stride = total.div_ceil(max_points);
    points
        .into_iter()
        .enumerate()
        .filter(|(i, _)| {
            let rn = i + 1;
            rn % stride == 1 || rn == total
        })
        .map(|(_, point)| point)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_points(total: usize) -> Vec<MetricPoint> {
        (0..total)
            .map(|i| MetricPoint::new(i as u64, i as f64, (i as f64 / 10.0).cos()))
            .collect()
    }

    #[test]
    fn mode_selection() {
        assert_eq!(SampleMode::Full, choose_mode(0, false, true));
        assert_eq!(SampleMode::Full, choose_mode(0, true, false));
        assert_eq!(SampleMode::Stride, choose_mode(100, true, true));
        assert_eq!(SampleMode::Head, choose_mode(100, true, false));
        assert_eq!(SampleMode::Reservoir, choose_mode(100, false, true));
        assert_eq!(SampleMode::Reservoir, choose_mode(100, false, false));
    }

    #[test]
    fn full_returns_everything() {
        let sampled = sample(make_points(5000), None, 0, false);
        assert_eq!(SampleMode::Full, sampled.mode);
        assert_eq!(5000, sampled.points.len());
        assert_eq!(5000, sampled.total);
    }

    #[test]
    fn head_truncates() {
        let sampled = sample(make_points(1000), None, 100, true);
        assert_eq!(SampleMode::Head, sampled.mode);
        assert_eq!(100, sampled.points.len());
        assert_eq!(1000, sampled.total);
        assert_eq!(99, sampled.points[99].step);
    }

    #[test]
    fn stride_spans_whole_range() {
        let sampled = sample(make_points(1000), Some((0, 999)), 100, true);
        assert_eq!(SampleMode::Stride, sampled.mode);
        assert_eq!(100, sampled.points.len());
        // One point per 10-step bucket, spanning the range immediately.
        assert_eq!(0, sampled.points[0].step);
        assert_eq!(990, sampled.points[99].step);
    }

    #[test]
    fn stride_with_sparse_points() {
        // Points only every 7 steps across a 0..=999 range.
        let points: Vec<MetricPoint> = (0..1000)
            .step_by(7)
            .map(|i| MetricPoint::new(i as u64, i as f64, 0.0))
            .collect();
        let sampled = sample(points, Some((0, 999)), 100, true);
        // At most one point per bucket; never more than max_points.
        assert!(sampled.points.len() <= 100);
        let mut buckets: Vec<u64> = sampled.points.iter().map(|p| p.step / 10).collect();
        buckets.dedup();
        assert_eq!(buckets.len(), sampled.points.len());
    }

    #[test]
    fn reservoir_under_limit_is_identity() {
        let points = make_points(50);
        let sampled = sample(points.clone(), None, 100, false);
        assert_eq!(SampleMode::Reservoir, sampled.mode);
        assert_eq!(points, sampled.points);
    }

    #[test]
    fn reservoir_bounds_and_final_point() {
        for (total, max_points) in [(10000, 2000), (1001, 100), (999, 1000), (12345, 7)] {
            let sampled = sample(make_points(total), None, max_points, false);
            // Output size is within one stride of max_points (one extra for
            // the forced final point, up to one stride short when the quota
            // does not divide evenly).
            let stride = total.div_ceil(max_points);
            let quota = total.min(max_points);
            assert!(
                sampled.points.len() + stride >= quota && sampled.points.len() <= quota + 1,
                "total={total} max_points={max_points} got {}",
                sampled.points.len()
            );
            // The final point is always present even if it does not fall on a
            // stride boundary.
            assert_eq!(
                (total - 1) as u64,
                sampled.points.last().unwrap().step,
                "total={total} max_points={max_points}"
            );
        }
    }

    #[test]
    fn reservoir_is_deterministic() {
        let a = sample(make_points(10000), None, 2000, false);
        let b = sample(make_points(10000), None, 2000, false);
        assert_eq!(a.points, b.points);
    }

    #[test]
    fn reservoir_keeps_stride_positions() {
        // total=10, max_points=4, stride=3: 1-based positions 1, 4, 7, 10 kept
        // by the modulo rule, plus the forced final position 10.
        let sampled = sample(make_points(10), None, 4, false);
        let steps: Vec<u64> = sampled.points.iter().map(|p| p.step).collect();
        assert_eq!(vec![0, 3, 6, 9], steps);
    }

    #[test]
    fn empty_input() {
        for (max_points, preview, range) in
            [(0, false, None), (100, true, Some((0, 99))), (100, false, None)]
        {
            let sampled = sample(Vec::new(), range, max_points, preview);
            assert!(sampled.points.is_empty());
            assert_eq!(0, sampled.total);
        }
    }
}
