pub mod flag;
pub mod series;

// Re-export types for convenience.
pub use crate::types::flag::ValueFlag;
pub use crate::types::series::{MetricPoint, Series, SeriesRole};
