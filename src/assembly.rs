//! Series assembly and the auto-smooth policy.
//!
//! [reduce_series] is the single entry point that turns a raw base series
//! into the set of plot series a chart renders: envelope downsampling, an
//! automatic light Gaussian pass for dense multi-metric charts, user
//! smoothing, and the optional low-opacity "(original)" companion.
//!
//! Renderers morph chart data in place by index, so the number and order of
//! output series is a function of `(max_points > 0, smoothing.enabled,
//! show_original_data)` only, never of input length or content. The one
//! exception is an empty input, which produces an empty output set: charts
//! frequently render before data arrives.

use crate::envelope;
use crate::models::{SmoothingAlgorithm, SmoothingSettings};
use crate::smoothing::smooth_series;
use crate::types::{Series, SeriesRole};

/// Downsampled series longer than this get the automatic Gaussian pass on
/// multi-metric charts.
pub const AUTO_SMOOTH_THRESHOLD: usize = 500;

/// Opacity of the "(original)" companion series.
pub const ORIGINAL_SERIES_OPACITY: f64 = 0.07;

/// Sigma for the automatic Gaussian pass: `max(4, len / 360)`.
fn auto_smooth_sigma(len: usize) -> f64 {
    4.0_f64.max((len / 360) as f64)
}

/// Reduce a raw series into plot series.
///
/// With `max_points > 0` the output is `[main, original?, env_min, env_max]`;
/// with `max_points == 0` the envelope stage is skipped and the sole output
/// is the (possibly smoothed) base series. Envelope companions are never
/// smoothed: they carry local extrema, and smoothing them would hide real
/// outliers.
///
/// # Arguments
///
/// * `base`: The raw series, x ascending.
/// * `max_points`: Maximum points per output series; 0 disables downsampling.
/// * `smoothing`: User smoothing settings.
/// * `multi_metric`: Whether the series shares a chart with other metrics.
///   Dense multi-metric series get an automatic light Gaussian pass, invisible
///   to the user and independent of the smoothing settings.
pub fn reduce_series(
    base: &Series,
    max_points: usize,
    smoothing: &SmoothingSettings,
    multi_metric: bool,
) -> Vec<Series> {
    if base.is_empty() {
        return Vec::new();
    }

    if max_points == 0 {
        let mut main = base.clone();
        main.role = SeriesRole::Main;
        main = apply_smoothing(main, smoothing, multi_metric);
        return vec![main];
    }

    let (main, env_min, env_max) = envelope::downsample_series(base, max_points);
    let original = main.clone();
    let main = apply_smoothing(main, smoothing, multi_metric);

    let mut out = Vec::with_capacity(4);
    out.push(main);
    if smoothing.enabled && smoothing.show_original_data {
        let mut original = original;
        original.label = format!("{} (original)", original.label);
        original.opacity = ORIGINAL_SERIES_OPACITY;
        original.role = SeriesRole::Original;
        out.push(original);
    }
    out.push(env_min);
    out.push(env_max);
    out
}

/// Apply the auto-smooth pass and then user smoothing to a main series.
fn apply_smoothing(main: Series, smoothing: &SmoothingSettings, multi_metric: bool) -> Series {
    let mut main = main;
    // Dashed line styles on dense multi-metric charts are visually
    // indistinguishable from noise unless lightly smoothed.
    if multi_metric && main.len() > AUTO_SMOOTH_THRESHOLD {
        let sigma = auto_smooth_sigma(main.len());
        main = smooth_series(&main, SmoothingAlgorithm::Gaussian, sigma);
    }
    if smoothing.enabled {
        main = smooth_series(&main, smoothing.algorithm, smoothing.parameter);
    }
    main
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::MetricPoint;

    fn base_series(len: usize) -> Series {
        let points: Vec<MetricPoint> = (0..len)
            .map(|i| MetricPoint::new(i as u64, i as f64, (i as f64 / 50.0).sin()))
            .collect();
        Series::from_points("loss", &points)
    }

    fn enabled(algorithm: SmoothingAlgorithm, parameter: f64, show_original: bool) -> SmoothingSettings {
        SmoothingSettings {
            enabled: true,
            algorithm,
            parameter,
            show_original_data: show_original,
        }
    }

    #[test]
    fn bundle_order_and_roles() {
        let series = base_series(1000);
        let out = reduce_series(&series, 100, &SmoothingSettings::default(), false);
        assert_eq!(3, out.len());
        assert_eq!(SeriesRole::Main, out[0].role);
        assert_eq!(SeriesRole::EnvelopeMin, out[1].role);
        assert_eq!(SeriesRole::EnvelopeMax, out[2].role);
        assert_eq!(100, out[0].len());
    }

    #[test]
    fn envelope_bound_holds_after_assembly() {
        // Without smoothing the main series is the window representative, so
        // the envelope bound holds per index.
        let series = base_series(1000);
        let out = reduce_series(&series, 100, &SmoothingSettings::default(), false);
        let (main, env_min, env_max) = (&out[0], &out[1], &out[2]);
        for i in 0..main.len() {
            assert!(env_min.y[i] <= main.y[i] && main.y[i] <= env_max.y[i]);
        }
    }

    #[test]
    fn original_companion_when_requested() {
        let series = base_series(1000);
        let settings = enabled(SmoothingAlgorithm::Ema, 0.9, true);
        let out = reduce_series(&series, 100, &settings, false);
        assert_eq!(4, out.len());
        assert_eq!(SeriesRole::Original, out[1].role);
        assert_eq!("loss (original)", out[1].label);
        assert_eq!(ORIGINAL_SERIES_OPACITY, out[1].opacity);
        assert!(!out[1].role.in_legend());
        // The companion holds the pre-smoothing downsampled values.
        let unsmoothed = reduce_series(&series, 100, &SmoothingSettings::default(), false);
        assert_eq!(unsmoothed[0].y, out[1].y);
    }

    #[test]
    fn no_companion_without_show_original() {
        let series = base_series(1000);
        let settings = enabled(SmoothingAlgorithm::Ema, 0.9, false);
        let out = reduce_series(&series, 100, &settings, false);
        assert_eq!(3, out.len());
    }

    #[test]
    fn auto_smooth_applies_without_companion() {
        // Dense multi-metric series get one Gaussian pass with
        // sigma = max(4, len / 360), and never an "(original)" companion.
        let series = base_series(1000);
        let out = reduce_series(&series, 1000, &SmoothingSettings::default(), true);
        assert_eq!(3, out.len());
        let expected = smooth_series(
            &reduce_series(&series, 1000, &SmoothingSettings::default(), false)[0],
            SmoothingAlgorithm::Gaussian,
            4.0,
        );
        assert_eq!(expected.y, out[0].y);
    }

    #[test]
    fn auto_smooth_sigma_scales_with_length() {
        assert_eq!(4.0, auto_smooth_sigma(1000));
        assert_eq!(4.0, auto_smooth_sigma(360 * 4));
        assert_eq!(5.0, auto_smooth_sigma(360 * 5));
        assert_eq!(27.0, auto_smooth_sigma(10000));
    }

    #[test]
    fn auto_smooth_skipped_below_threshold() {
        let series = base_series(400);
        let out = reduce_series(&series, 1000, &SmoothingSettings::default(), true);
        // 400 <= threshold: passthrough.
        assert_eq!(series.y, out[0].y);
    }

    #[test]
    fn auto_smooth_skipped_for_single_metric() {
        let series = base_series(1000);
        let out = reduce_series(&series, 1000, &SmoothingSettings::default(), false);
        assert_eq!(series.y, out[0].y);
    }

    #[test]
    fn zero_max_points_single_series() {
        let series = base_series(1000);
        // Even with user smoothing and show_original_data, the no-reduction
        // shape is always exactly one series.
        let settings = enabled(SmoothingAlgorithm::Gaussian, 2.0, true);
        let out = reduce_series(&series, 0, &settings, false);
        assert_eq!(1, out.len());
        assert_eq!(1000, out[0].len());
        assert_eq!(SeriesRole::Main, out[0].role);
    }

    #[test]
    fn cardinality_is_stable_across_inputs() {
        // For a fixed settings shape the series count never depends on input
        // length or content.
        let settings_variants = [
            (100, SmoothingSettings::default(), 3),
            (100, enabled(SmoothingAlgorithm::Running, 5.0, false), 3),
            (100, enabled(SmoothingAlgorithm::Running, 5.0, true), 4),
            (0, SmoothingSettings::default(), 1),
            (0, enabled(SmoothingAlgorithm::Twema, 0.9, true), 1),
        ];
        for len in [1, 2, 50, 100, 101, 5000] {
            let series = base_series(len);
            for (max_points, settings, expected) in &settings_variants {
                for multi_metric in [false, true] {
                    let out = reduce_series(&series, *max_points, settings, multi_metric);
                    assert_eq!(
                        *expected,
                        out.len(),
                        "len={len} max_points={max_points} multi={multi_metric}"
                    );
                }
            }
        }
    }

    #[test]
    fn empty_input_empty_output() {
        let series = Series::new("loss");
        for max_points in [0, 100] {
            let out = reduce_series(&series, max_points, &SmoothingSettings::default(), true);
            assert!(out.is_empty());
        }
    }

    #[test]
    fn user_smoothing_skips_flagged_positions() {
        let points: Vec<MetricPoint> = (0..10)
            .map(|i| {
                let value = if i == 5 { f64::NAN } else { 1.0 };
                MetricPoint::new(i, i as f64, value)
            })
            .collect();
        let series = Series::from_points("loss", &points);
        let settings = enabled(SmoothingAlgorithm::Running, 3.0, false);
        let out = reduce_series(&series, 0, &settings, false);
        // The flagged placeholder passes through unsmoothed.
        assert_eq!(0.0, out[0].y[5]);
        assert_eq!(1.0, out[0].y[4]);
        assert_eq!(1.0, out[0].y[6]);
    }
}
