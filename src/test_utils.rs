//! Utilities for use in test cases.

use crate::models;
use crate::types::MetricPoint;

/// Return a SeriesKey for a test metric.
pub(crate) fn get_test_series_key() -> models::SeriesKey {
    models::SeriesKey::new("acme", "vision", "run-1", "loss")
}

/// Return a SampleRequest with only required fields set.
pub(crate) fn get_test_sample_request() -> models::SampleRequest {
    models::SampleRequest {
        key: get_test_series_key(),
        range: None,
        max_points: 0,
        preview: false,
    }
}

/// Return a SampleRequest with optional fields set.
pub(crate) fn get_test_sample_request_optional() -> models::SampleRequest {
    models::SampleRequest {
        key: get_test_series_key(),
        range: Some(models::StepRange::new(100, 200)),
        max_points: 1000,
        preview: true,
    }
}

/// Return a ReduceRequest over a few points.
pub(crate) fn get_test_reduce_request() -> models::ReduceRequest {
    models::ReduceRequest {
        label: "loss".to_string(),
        points: (0..4)
            .map(|i| MetricPoint::new(i, i as f64, i as f64 * 0.5))
            .collect(),
        max_points: 100,
        smoothing: models::SmoothingSettings::default(),
        multi_metric: false,
    }
}
