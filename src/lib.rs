//! This crate provides Plotline, a metric series reduction service for ML
//! experiment tracking. Runs log millions of scalar observations per metric;
//! charts can render a few thousand points at most. Plotline turns raw metric
//! series into bounded, render-ready plot series: quota-bounded sampling,
//! min/max envelope downsampling, gap-aware smoothing and series assembly,
//! with a zoom controller that reconciles viewport changes against fresh
//! server fetches.
//!
//! The server is built on top of a number of open source components.
//!
//! * [Tokio](tokio), the most popular asynchronous Rust runtime.
//! * [Axum](axum) web framework, built by the Tokio team on top of various
//!   popular components, including the [hyper] HTTP library.
//! * [Serde](serde) performs (de)serialisation of JSON request and response data.
//! * [ndarray] provides [NumPy](https://numpy.org)-like n-dimensional arrays
//!   used in numerical computation.

pub mod app;
pub mod app_state;
pub mod assembly;
pub mod cli;
pub mod envelope;
pub mod error;
pub mod kernel;
pub mod metrics;
pub mod models;
pub mod resource_manager;
pub mod sample_client;
pub mod sampler;
pub mod server;
pub mod smoothing;
pub mod store;
#[cfg(test)]
pub mod test_utils;
pub mod tracing;
pub mod types;
pub mod validated_json;
pub mod zoom;
