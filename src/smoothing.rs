//! Gap-aware smoothing.
//!
//! Each algorithm is implemented as a struct that implements the
//! [SmoothingKernel](crate::kernel::SmoothingKernel) trait over one gap-free
//! run. [smooth_series] partitions a series into maximal runs of unflagged
//! points and smooths each run independently with fresh kernel state, so
//! smoothing never crosses a non-finite gap.

use crate::kernel::{smooth_run, Element, SmoothingKernel};
use crate::models::SmoothingAlgorithm;
use crate::types::Series;

use std::ops::Range;

/// Maximum EMA/TWEMA weight. Weights at or above 1 would never converge.
pub const MAX_EMA_WEIGHT: f64 = 0.999;

/// Minimum Gaussian standard deviation. Sigma at or below 0 degenerates to a
/// division by zero.
pub const MIN_GAUSSIAN_SIGMA: f64 = 1e-6;

/// Box-car average over a trailing window of `parameter` points.
pub struct Running {}

impl SmoothingKernel for Running {
    fn smooth<T: Element>(_x: &[T], y: &[T], parameter: f64) -> Vec<T> {
        let n = y.len();
        if n < 2 {
            return y.to_vec();
        }
        // Parameter floor 1, integer.
        let window = if parameter.is_finite() && parameter >= 1.0 {
            parameter.floor() as usize
        } else {
            1
        };
        let mut out = Vec::with_capacity(n);
        let mut sum = 0.0;
        for i in 0..n {
            sum = sum + y[i].to_f64().unwrap_or(0.0);
            if i >= window {
                sum = sum - y[i - window].to_f64().unwrap_or(0.0);
            }
            let count = (i + 1).min(window);
            out.push(T::from_f64(sum / count as f64).unwrap_or_else(T::zero));
        }
        out
    }
}

/// Non-causal Gaussian-weighted average with standard deviation `parameter`.
///
/// The window is truncated at three sigma on each side; weights are
/// renormalised at the run edges so the output stays inside the data range.
pub struct Gaussian {}

impl SmoothingKernel for Gaussian {
    fn smooth<T: Element>(_x: &[T], y: &[T], parameter: f64) -> Vec<T> {
        let n = y.len();
        if n < 2 {
            return y.to_vec();
        }
        let sigma = if parameter.is_finite() {
            parameter.max(MIN_GAUSSIAN_SIGMA)
        } else {
            MIN_GAUSSIAN_SIGMA
        };
        let radius = ((sigma * 3.0).ceil() as usize).clamp(1, n - 1);
        let weights: Vec<f64> = (0..=radius)
            .map(|d| (-((d * d) as f64) / (2.0 * sigma * sigma)).exp())
            .collect();
        (0..n)
            .map(|i| {
                let lo = i.saturating_sub(radius);
                let hi = (i + radius).min(n - 1);
                let mut numerator = 0.0;
                let mut denominator = 0.0;
                for j in lo..=hi {
                    let weight = weights[i.abs_diff(j)];
                    numerator += weight * y[j].to_f64().unwrap_or(0.0);
                    denominator += weight;
                }
                T::from_f64(numerator / denominator).unwrap_or_else(T::zero)
            })
            .collect()
    }
}

/// Exponential moving average with weight `parameter`, de-biased so early
/// output does not decay toward zero.
pub struct Ema {}

impl SmoothingKernel for Ema {
    fn smooth<T: Element>(_x: &[T], y: &[T], parameter: f64) -> Vec<T> {
        let n = y.len();
        if n < 2 {
            return y.to_vec();
        }
        let weight = clamp_weight(parameter);
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        y.iter()
            .map(|value| {
                // The running denominator equals 1 - weight^(i+1), the de-bias
                // term for partial sums.
                numerator = weight * numerator + (1.0 - weight) * value.to_f64().unwrap_or(0.0);
                denominator = weight * denominator + (1.0 - weight);
                T::from_f64(numerator / denominator).unwrap_or_else(T::zero)
            })
            .collect()
    }
}

/// Time-weighted EMA: the decay between consecutive points is a function of
/// the gap between their x values rather than the position index, so irregular
/// sampling density does not bias the smoothing. Uniform spacing reproduces
/// [Ema] exactly.
pub struct Twema {}

impl SmoothingKernel for Twema {
    fn smooth<T: Element>(x: &[T], y: &[T], parameter: f64) -> Vec<T> {
        let n = y.len();
        if n < 2 {
            return y.to_vec();
        }
        let weight = clamp_weight(parameter);
        let first = x[0].to_f64().unwrap_or(0.0);
        let last = x[n - 1].to_f64().unwrap_or(0.0);
        let mean_dx = (last - first) / (n - 1) as f64;
        if !(mean_dx > 0.0) {
            // Degenerate x spacing: fall back to index-based decay.
            return Ema::smooth(x, y, parameter);
        }
        let mut numerator = 0.0;
        let mut denominator = 0.0;
        let mut previous_x = first;
        x.iter()
            .zip(y.iter())
            .enumerate()
            .map(|(i, (xi, yi))| {
                let xi = xi.to_f64().unwrap_or(0.0);
                let step_weight = if i == 0 {
                    weight
                } else {
                    weight.powf((xi - previous_x) / mean_dx)
                };
                previous_x = xi;
                numerator =
                    step_weight * numerator + (1.0 - step_weight) * yi.to_f64().unwrap_or(0.0);
                denominator = step_weight * denominator + (1.0 - step_weight);
                T::from_f64(numerator / denominator).unwrap_or_else(T::zero)
            })
            .collect()
    }
}

/// Clamp an EMA weight to `[0, MAX_EMA_WEIGHT]`.
fn clamp_weight(parameter: f64) -> f64 {
    if parameter.is_finite() {
        parameter.clamp(0.0, MAX_EMA_WEIGHT)
    } else {
        0.0
    }
}

/// Maximal contiguous index ranges of unflagged points.
fn unflagged_runs(series: &Series) -> Vec<Range<usize>> {
    if series.value_flags.is_empty() {
        return vec![0..series.len()];
    }
    let mut runs = Vec::new();
    let mut start = None;
    for i in 0..series.len() {
        if series.is_flagged(i) {
            if let Some(s) = start.take() {
                runs.push(s..i);
            }
        } else if start.is_none() {
            start = Some(i);
        }
    }
    if let Some(s) = start {
        runs.push(s..series.len());
    }
    runs
}

/// Smooth a series with the given algorithm, skipping non-finite gaps.
///
/// Flagged positions pass through as untouched placeholders; each unflagged
/// run restarts kernel state. The output has the same length, x values and
/// flags as the input.
pub fn smooth_series(series: &Series, algorithm: SmoothingAlgorithm, parameter: f64) -> Series {
    let mut out = series.clone();
    if series.is_empty() {
        return out;
    }
    for run in unflagged_runs(series) {
        if run.len() < 2 {
            continue;
        }
        let smoothed = smooth_run(
            algorithm,
            &series.x[run.clone()],
            &series.y[run.clone()],
            parameter,
        );
        out.y[run].copy_from_slice(&smoothed);
    }
    out
}
