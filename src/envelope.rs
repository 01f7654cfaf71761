//! Envelope downsampling.
//!
//! Reduces an arbitrary-length series to at most `max_points` points while
//! preserving each window's min and max as companion arrays, so visual
//! outliers are never lost to averaging. Window boundaries are by index, not
//! x-spacing. The representative (x, y) of a window is its first point: an
//! actual sample, so trend shape and spikes survive, and the envelope bound
//! `y_min[i] <= y[i] <= y_max[i]` holds trivially.

use crate::kernel::Element;
use crate::types::{Series, SeriesRole};

use ndarray::ArrayView1;

/// A downsampled series with per-window extrema.
///
/// All four arrays have the same length, at most the requested `max_points`.
#[derive(Clone, Debug, PartialEq)]
pub struct Envelope<T> {
    /// Representative x per window
    pub x: Vec<T>,
    /// Representative y per window
    pub y: Vec<T>,
    /// Minimum y per window
    pub y_min: Vec<T>,
    /// Maximum y per window
    pub y_max: Vec<T>,
}

/// Downsample `(x, y)` to at most `max_points` points.
///
/// If the input is already at or below `max_points` (or `max_points` is 0,
/// which disables reduction), the input passes through unchanged with
/// `y_min == y_max == y`. Empty input yields an empty envelope, never an
/// error.
pub fn downsample<T: Element>(x: &[T], y: &[T], max_points: usize) -> Envelope<T> {
    let n = x.len().min(y.len());
    if n <= max_points || max_points == 0 {
        return Envelope {
            x: x[..n].to_vec(),
            y: y[..n].to_vec(),
            y_min: y[..n].to_vec(),
            y_max: y[..n].to_vec(),
        };
    }
    let m = max_points;
    let mut envelope = Envelope {
        x: Vec::with_capacity(m),
        y: Vec::with_capacity(m),
        y_min: Vec::with_capacity(m),
        y_max: Vec::with_capacity(m),
    };
    for k in 0..m {
        let start = k * n / m;
        let end = ((k + 1) * n / m).max(start + 1);
        let window = ArrayView1::from(&y[start..end]);
        let first = y[start];
        let (low, high) = window.fold((first, first), |(low, high), &value| {
            let low = if value < low { value } else { low };
            let high = if value > high { value } else { high };
            (low, high)
        });
        envelope.x.push(x[start]);
        envelope.y.push(first);
        envelope.y_min.push(low);
        envelope.y_max.push(high);
    }
    envelope
}

/// Envelope-downsample a series into `(main, env_min, env_max)`.
///
/// The three output series share the same downsampled x values; the envelope
/// companions carry [SeriesRole::EnvelopeMin]/[SeriesRole::EnvelopeMax], which
/// excludes them from legends and from smoothing. Flags survive for x values
/// that survive.
pub fn downsample_series(series: &Series, max_points: usize) -> (Series, Series, Series) {
    let envelope = downsample(&series.x, &series.y, max_points);

    let carry = |y: &[f64], role: SeriesRole| -> Series {
        let mut out = Series {
            x: envelope.x.clone(),
            y: y.to_vec(),
            value_flags: hashbrown::HashMap::new(),
            role,
            ..series.clone()
        };
        for &x in &out.x {
            if let Some(flag) = series.value_flags.get(&x.to_bits()) {
                out.value_flags.insert(x.to_bits(), *flag);
            }
        }
        out
    };

    let main = carry(&envelope.y, series.role);
    let env_min = carry(&envelope.y_min, SeriesRole::EnvelopeMin);
    let env_max = carry(&envelope.y_max, SeriesRole::EnvelopeMax);
    (main, env_min, env_max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricPoint, ValueFlag};

    #[test]
    fn passthrough_at_or_below_limit() {
        let x: Vec<f64> = (0..10).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..10).map(|i| (i * i) as f64).collect();
        for max_points in [10, 11, 100] {
            let envelope = downsample(&x, &y, max_points);
            assert_eq!(x, envelope.x);
            assert_eq!(y, envelope.y);
            assert_eq!(y, envelope.y_min);
            assert_eq!(y, envelope.y_max);
        }
    }

    #[test]
    fn zero_max_points_disables_reduction() {
        let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let y = vec![1.0; 100];
        let envelope = downsample(&x, &y, 0);
        assert_eq!(100, envelope.x.len());
    }

    #[test]
    fn empty_input_empty_output() {
        let envelope = downsample::<f64>(&[], &[], 100);
        assert!(envelope.x.is_empty());
        assert!(envelope.y.is_empty());
    }

    #[test]
    fn output_length_and_bound() {
        let x: Vec<f64> = (0..1000).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..1000).map(|i| ((i as f64) / 50.0).sin()).collect();
        let envelope = downsample(&x, &y, 100);
        assert_eq!(100, envelope.x.len());
        for i in 0..100 {
            assert!(envelope.y_min[i] <= envelope.y[i]);
            assert!(envelope.y[i] <= envelope.y_max[i]);
        }
        // Each window's extrema bracket every original value in that window.
        for k in 0..100 {
            let start = k * 1000 / 100;
            let end = (k + 1) * 1000 / 100;
            for i in start..end {
                assert!(envelope.y_min[k] <= y[i] && y[i] <= envelope.y_max[k]);
            }
        }
    }

    #[test]
    fn representative_is_first_of_window() {
        let x: Vec<f64> = (0..20).map(|i| i as f64).collect();
        let y: Vec<f64> = (0..20).map(|i| i as f64 * 10.0).collect();
        let envelope = downsample(&x, &y, 4);
        // Windows of 5 points; the first point of each window represents it.
        assert_eq!(vec![0.0, 5.0, 10.0, 15.0], envelope.x);
        assert_eq!(vec![0.0, 50.0, 100.0, 150.0], envelope.y);
    }

    #[test]
    fn spikes_survive_in_extrema() {
        let x: Vec<f64> = (0..100).map(|i| i as f64).collect();
        let mut y = vec![0.0; 100];
        y[57] = 1000.0;
        y[58] = -1000.0;
        let envelope = downsample(&x, &y, 10);
        assert!(envelope.y_max.iter().any(|&v| v == 1000.0));
        assert!(envelope.y_min.iter().any(|&v| v == -1000.0));
    }

    #[test]
    fn generic_over_f32() {
        let x: Vec<f32> = (0..8).map(|i| i as f32).collect();
        let y: Vec<f32> = vec![1.0, 9.0, 2.0, 8.0, 3.0, 7.0, 4.0, 6.0];
        let envelope = downsample(&x, &y, 2);
        assert_eq!(vec![1.0_f32, 3.0], envelope.y);
        assert_eq!(vec![1.0_f32, 3.0], envelope.y_min);
        assert_eq!(vec![9.0_f32, 7.0], envelope.y_max);
    }

    #[test]
    fn series_bundle_roles_and_flags() {
        let points: Vec<MetricPoint> = (0..100)
            .map(|i| {
                let value = if i == 40 { f64::NAN } else { i as f64 };
                MetricPoint::new(i, i as f64, value)
            })
            .collect();
        let series = Series::from_points("loss", &points);
        let (main, env_min, env_max) = downsample_series(&series, 10);
        assert_eq!(10, main.len());
        assert_eq!(main.x, env_min.x);
        assert_eq!(main.x, env_max.x);
        assert_eq!(SeriesRole::Main, main.role);
        assert_eq!(SeriesRole::EnvelopeMin, env_min.role);
        assert_eq!(SeriesRole::EnvelopeMax, env_max.role);
        assert!(!env_min.role.in_legend());
        assert!(!env_max.role.smoothable());
        // Window starts fall on multiples of 10, so the flagged x=40 survives
        // and its flag is carried.
        assert_eq!(ValueFlag::Nan, main.flag_at(40.0));
    }
}
