//! Non-finite value flags.
//!
//! Metric values are transported as JSON, which cannot represent NaN or the
//! infinities. A point whose original value was non-finite carries a sanitised
//! placeholder value (0.0) plus a [ValueFlag] recording the original
//! classification. The flag, not the placeholder, is the source of truth for
//! "this point is not a real value": the smoothing kernels never smooth across
//! a flagged position, and renderers substitute a gap for the placeholder.

use serde::{Deserialize, Serialize};
use strum_macros::Display;

/// Classification of a metric value's original finiteness.
#[derive(Clone, Copy, Debug, Default, Deserialize, Display, Eq, Hash, PartialEq, Serialize)]
pub enum ValueFlag {
    /// An ordinary finite value
    #[default]
    #[serde(rename = "")]
    #[strum(serialize = "")]
    Finite,
    /// The value was NaN
    #[serde(rename = "NaN")]
    #[strum(serialize = "NaN")]
    Nan,
    /// The value was positive infinity
    #[serde(rename = "Inf")]
    #[strum(serialize = "Inf")]
    PosInf,
    /// The value was negative infinity
    #[serde(rename = "-Inf")]
    #[strum(serialize = "-Inf")]
    NegInf,
}

impl ValueFlag {
    /// Classify a raw value into a sanitised (placeholder, flag) pair.
    ///
    /// Finite values pass through with [ValueFlag::Finite]; non-finite values
    /// collapse to a 0.0 placeholder plus the matching flag.
    pub fn classify(value: f64) -> (f64, ValueFlag) {
        if value.is_nan() {
            (0.0, ValueFlag::Nan)
        } else if value == f64::INFINITY {
            (0.0, ValueFlag::PosInf)
        } else if value == f64::NEG_INFINITY {
            (0.0, ValueFlag::NegInf)
        } else {
            (value, ValueFlag::Finite)
        }
    }

    /// Returns true for ordinary finite values.
    pub fn is_finite(self) -> bool {
        matches!(self, ValueFlag::Finite)
    }
}
