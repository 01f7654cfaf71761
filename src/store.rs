//! Series storage seam.
//!
//! [SeriesStore] is the interface stand-in for the external columnar
//! time-series store: scan rows in step order for a key and range, count
//! totals, append. Engine internals are out of scope; [MemoryStore] provides
//! a per-key columnar in-memory implementation used by the server and tests.

use crate::error::ReductionError;
use crate::models::SeriesKey;
use crate::types::{MetricPoint, ValueFlag};

use hashbrown::HashMap;
use std::sync::RwLock;

/// Storage interface for metric series.
pub trait SeriesStore {
    /// Return every point for a key within an optional inclusive step range,
    /// step ascending.
    fn scan(
        &self,
        key: &SeriesKey,
        range: Option<(u64, u64)>,
    ) -> Result<Vec<MetricPoint>, ReductionError>;

    /// Return the number of points for a key within an optional range.
    fn count(&self, key: &SeriesKey, range: Option<(u64, u64)>) -> Result<usize, ReductionError>;

    /// Append points to a key, keeping step order. Returns the new total.
    fn append(&self, key: &SeriesKey, points: Vec<MetricPoint>) -> Result<usize, ReductionError>;

    /// List known series keys.
    fn keys(&self) -> Result<Vec<SeriesKey>, ReductionError>;
}

/// Per-key columnar storage.
#[derive(Debug, Default)]
struct Column {
    steps: Vec<u64>,
    times: Vec<f64>,
    values: Vec<f64>,
    flags: Vec<ValueFlag>,
}

impl Column {
    fn len(&self) -> usize {
        self.steps.len()
    }

    fn push(&mut self, point: MetricPoint) {
        self.steps.push(point.step);
        self.times.push(point.time);
        self.values.push(point.value);
        self.flags.push(point.value_flag);
    }

    fn row(&self, i: usize) -> MetricPoint {
        MetricPoint {
            step: self.steps[i],
            time: self.times[i],
            value: self.values[i],
            value_flag: self.flags[i],
        }
    }

    /// Index range covering an optional inclusive step range.
    fn index_range(&self, range: Option<(u64, u64)>) -> (usize, usize) {
        match range {
            None => (0, self.len()),
            Some((step_min, step_max)) => {
                let start = self.steps.partition_point(|&s| s < step_min);
                let end = self.steps.partition_point(|&s| s <= step_max);
                (start, end.max(start))
            }
        }
    }

    /// Restore step order after an out-of-order append.
    fn sort_by_step(&mut self) {
        let mut rows: Vec<MetricPoint> = (0..self.len()).map(|i| self.row(i)).collect();
        rows.sort_by_key(|point| point.step);
        self.steps.clear();
        self.times.clear();
        self.values.clear();
        self.flags.clear();
        for row in rows {
            self.push(row);
        }
    }
}

/// In-memory series store.
///
/// A read-write lock synchronises access to a [hashbrown::HashMap] of per-key
/// columns, optimised for reads. Scans are short and synchronous, so a
/// std lock suffices.
#[derive(Debug, Default)]
pub struct MemoryStore {
    map: RwLock<HashMap<SeriesKey, Column>>,
}

impl MemoryStore {
    /// Create and return a [MemoryStore].
    pub fn new() -> Self {
        Self::default()
    }

    fn with_column<R>(
        &self,
        key: &SeriesKey,
        f: impl FnOnce(&Column) -> R,
    ) -> Result<R, ReductionError> {
        let map = self.map.read().unwrap_or_else(|e| e.into_inner());
        match map.get(key) {
            Some(column) => Ok(f(column)),
            None => Err(ReductionError::UnknownSeries {
                key: key.to_string(),
            }),
        }
    }
}

impl SeriesStore for MemoryStore {
    fn scan(
        &self,
        key: &SeriesKey,
        range: Option<(u64, u64)>,
    ) -> Result<Vec<MetricPoint>, ReductionError> {
        self.with_column(key, |column| {
            let (start, end) = column.index_range(range);
            (start..end).map(|i| column.row(i)).collect()
        })
    }

    fn count(&self, key: &SeriesKey, range: Option<(u64, u64)>) -> Result<usize, ReductionError> {
        self.with_column(key, |column| {
            let (start, end) = column.index_range(range);
            end - start
        })
    }

    fn append(&self, key: &SeriesKey, points: Vec<MetricPoint>) -> Result<usize, ReductionError> {
        let mut map = self.map.write().unwrap_or_else(|e| e.into_inner());
        let column = map.entry(key.clone()).or_default();
        let mut ordered = true;
        let mut last_step = column.steps.last().copied();
        for point in points {
            if let Some(last) = last_step {
                if point.step < last {
                    ordered = false;
                }
            }
            last_step = Some(point.step);
            column.push(point);
        }
        if !ordered {
            column.sort_by_step();
        }
        Ok(column.len())
    }

    fn keys(&self) -> Result<Vec<SeriesKey>, ReductionError> {
        let map = self.map.read().unwrap_or_else(|e| e.into_inner());
        let mut keys: Vec<SeriesKey> = map.keys().cloned().collect();
        keys.sort_by_key(|key| key.to_string());
        Ok(keys)
    }
}
