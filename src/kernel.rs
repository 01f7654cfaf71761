//! Smoothing kernel traits.
//!
//! This forms the contract between series assembly and the numeric kernels in
//! [crate::smoothing].

use crate::models;

/// Trait for series elements.
pub trait Element:
    Clone
    + Copy
    + PartialOrd
    + num_traits::Float
    + num_traits::FromPrimitive
    + num_traits::ToPrimitive
    + std::fmt::Debug
{
}

/// Blanket implementation of Element.
impl<T> Element for T where
    T: Clone
        + Copy
        + PartialOrd
        + num_traits::Float
        + num_traits::FromPrimitive
        + num_traits::ToPrimitive
        + std::fmt::Debug
{
}

/// Trait for smoothing kernels.
///
/// A kernel smooths a single gap-free run of points. Gap handling (partitioning
/// a series at flagged positions and restarting kernel state) happens above
/// this trait, in [crate::smoothing::smooth_series]; a kernel may assume every
/// value it sees is a real, finite observation.
pub trait SmoothingKernel {
    /// Smooth one run of values.
    ///
    /// Returns the smoothed values, always the same length as the input.
    /// Kernels must clamp degenerate parameters rather than propagating
    /// NaN/Infinity, and must return runs of fewer than two points unchanged.
    ///
    /// # Arguments
    ///
    /// * `x`: X values of the run, strictly ascending. Same length as `y`.
    /// * `y`: Values to smooth.
    /// * `parameter`: Algorithm parameter (window size, sigma or weight).
    fn smooth<T: Element>(x: &[T], y: &[T], parameter: f64) -> Vec<T>;
}

/// Dispatch to a concrete kernel based on the runtime algorithm value.
pub fn smooth_run<T: Element>(
    algorithm: models::SmoothingAlgorithm,
    x: &[T],
    y: &[T],
    parameter: f64,
) -> Vec<T> {
    use crate::smoothing::{Ema, Gaussian, Running, Twema};
    match algorithm {
        models::SmoothingAlgorithm::Running => Running::smooth(x, y, parameter),
        models::SmoothingAlgorithm::Gaussian => Gaussian::smooth(x, y, parameter),
        models::SmoothingAlgorithm::Ema => Ema::smooth(x, y, parameter),
        models::SmoothingAlgorithm::Twema => Twema::smooth(x, y, parameter),
    }
}
