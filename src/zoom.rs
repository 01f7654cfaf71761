//! Zoom reconciliation.
//!
//! A chart starts on a sampled overview of its series. When the user zooms,
//! the visible step range is re-fetched at full resolution (unless the loaded
//! data is already complete), sliced to the viewport with a one-point margin,
//! and re-assembled with `max_points = 0` so every raw point in range is
//! shown. Newer zooms supersede older in-flight fetches: each fetch carries a
//! generation token, and a stale response is dropped when it resolves.

use crate::assembly::reduce_series;
use crate::error::ReductionError;
use crate::models::{SeriesKey, SmoothingSettings};
use crate::sampler::{self, Sampled};
use crate::store::{MemoryStore, SeriesStore};
use crate::types::Series;

use async_trait::async_trait;

/// Source of bounded samples: the in-process store or a remote server.
#[async_trait]
pub trait SampleSource {
    /// Fetch a bounded sample of a series.
    async fn fetch(
        &self,
        key: &SeriesKey,
        range: Option<(u64, u64)>,
        max_points: usize,
        preview: bool,
    ) -> Result<Sampled, ReductionError>;
}

/// The in-process path: scan the store and sample synchronously.
#[async_trait]
impl SampleSource for MemoryStore {
    async fn fetch(
        &self,
        key: &SeriesKey,
        range: Option<(u64, u64)>,
        max_points: usize,
        preview: bool,
    ) -> Result<Sampled, ReductionError> {
        let points = self.scan(key, range)?;
        Ok(sampler::sample(points, range, max_points, preview))
    }
}

/// Resolution tier of the loaded raw data.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DataTier {
    /// The raw cache holds a bounded sample
    Sampled,
    /// The raw cache holds every point
    Full,
}

/// Zoom state of a chart instance.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ZoomState {
    /// Overview (possibly sampled) data shown
    Overview,
    /// A zoom was requested and a fetch ticket issued
    ZoomRequested,
    /// The full-resolution fetch is in flight
    ZoomFetching,
    /// A full-resolution slice is displayed
    ZoomReady,
}

/// Token for an issued zoom fetch. Stale tickets are dropped on completion.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ZoomTicket {
    /// Generation of the request; only the newest generation wins
    pub generation: u64,
    /// Step range to fetch, widened by one step per side for the margin
    pub step_min: u64,
    pub step_max: u64,
}

/// What a zoom request resolved to.
#[derive(Debug)]
pub enum ZoomAction {
    /// The raw cache was already full resolution; the slice is ready
    Ready(Vec<Series>),
    /// A fetch is required; pass the completed result to
    /// [ZoomController::complete_zoom]
    Fetch(ZoomTicket),
}

/// Per-chart zoom controller.
///
/// Owns the chart's raw series cache exclusively; no two concurrent
/// computations ever write the same series. All reduction runs synchronously
/// inside the calling task; only the fetch is asynchronous.
pub struct ZoomController<S: SampleSource> {
    source: S,
    key: SeriesKey,
    /// Overview point budget, used for both the fetch and the assembly
    max_points: usize,
    settings: SmoothingSettings,
    multi_metric: bool,
    /// The raw series from the overview fetch, kept so settings changes and
    /// full-tier zooms re-derive plot series without a network round trip
    overview_cache: Series,
    /// The raw full-resolution slice from the latest completed zoom fetch
    zoom_cache: Option<Series>,
    tier: DataTier,
    state: ZoomState,
    generation: u64,
    visible: Option<(f64, f64)>,
    displayed: Vec<Series>,
}

impl<S: SampleSource> ZoomController<S> {
    /// Return a new controller for one chart instance.
    pub fn new(
        source: S,
        key: SeriesKey,
        max_points: usize,
        settings: SmoothingSettings,
        multi_metric: bool,
    ) -> Self {
        let label = key.metric.clone();
        Self {
            source,
            key,
            max_points,
            settings,
            multi_metric,
            overview_cache: Series::new(&label),
            zoom_cache: None,
            tier: DataTier::Sampled,
            state: ZoomState::Overview,
            generation: 0,
            visible: None,
            displayed: Vec::new(),
        }
    }

    /// Fetch the overview sample and assemble the initial plot series.
    pub async fn load_overview(&mut self) -> Result<Vec<Series>, ReductionError> {
        let sampled = self
            .source
            .fetch(&self.key, None, self.max_points, false)
            .await?;
        self.tier = if sampled.points.len() >= sampled.total {
            DataTier::Full
        } else {
            DataTier::Sampled
        };
        self.overview_cache = Series::from_points(&self.key.metric, &sampled.points);
        self.zoom_cache = None;
        self.state = ZoomState::Overview;
        self.visible = None;
        self.displayed = reduce_series(
            &self.overview_cache,
            self.max_points,
            &self.settings,
            self.multi_metric,
        );
        Ok(self.displayed.clone())
    }

    /// The currently displayed plot series.
    pub fn displayed(&self) -> &[Series] {
        &self.displayed
    }

    /// Current zoom state.
    pub fn state(&self) -> ZoomState {
        self.state
    }

    /// Resolution tier of the overview cache.
    pub fn tier(&self) -> DataTier {
        self.tier
    }

    /// The raw (pre-downsample) overview series.
    pub fn raw_lines(&self) -> &Series {
        &self.overview_cache
    }

    /// Request a zoom to the visible x range.
    ///
    /// Full-tier data is re-sliced locally with no fetch; otherwise a ticket
    /// for a full-resolution fetch of the visible step range is issued and any
    /// older outstanding ticket becomes stale.
    pub fn request_zoom(&mut self, x_min: f64, x_max: f64) -> ZoomAction {
        self.visible = Some((x_min, x_max));
        if self.tier == DataTier::Full {
            let slice = self.overview_cache.slice_with_margin(x_min, x_max);
            self.displayed = reduce_series(&slice, 0, &self.settings, self.multi_metric);
            self.state = ZoomState::ZoomReady;
            return ZoomAction::Ready(self.displayed.clone());
        }
        self.generation += 1;
        self.state = ZoomState::ZoomRequested;
        // Widen by one step per side so the viewport-edge margin points exist
        // in the fetched slice.
        let step_min = (x_min.max(0.0).floor() as u64).saturating_sub(1);
        let step_max = x_max.max(0.0).ceil() as u64 + 1;
        ZoomAction::Fetch(ZoomTicket {
            generation: self.generation,
            step_min,
            step_max,
        })
    }

    /// Mark a ticket's fetch as dispatched.
    pub fn begin_fetch(&mut self, ticket: ZoomTicket) {
        if ticket.generation == self.generation {
            self.state = ZoomState::ZoomFetching;
        }
    }

    /// Complete a zoom fetch.
    ///
    /// Returns the series to display, or None if the ticket was superseded by
    /// a newer zoom (last request wins; the stale result is dropped). A failed
    /// fetch leaves the previously displayed series in place: the zoom is not
    /// rolled back, and retry belongs to the data layer.
    pub fn complete_zoom(
        &mut self,
        ticket: ZoomTicket,
        result: Result<Sampled, ReductionError>,
    ) -> Option<Vec<Series>> {
        if ticket.generation != self.generation {
            return None;
        }
        match result {
            Ok(sampled) => {
                let raw = Series::from_points(&self.key.metric, &sampled.points);
                let (x_min, x_max) = self.visible.unwrap_or((f64::MIN, f64::MAX));
                let slice = raw.slice_with_margin(x_min, x_max);
                self.zoom_cache = Some(raw);
                self.displayed = reduce_series(&slice, 0, &self.settings, self.multi_metric);
                self.state = ZoomState::ZoomReady;
            }
            Err(error) => {
                tracing::warn!("zoom fetch for {} failed: {}", self.key, error);
                self.state = ZoomState::Overview;
            }
        }
        Some(self.displayed.clone())
    }

    /// Zoom to the visible x range, fetching through the source if needed.
    pub async fn zoom(&mut self, x_min: f64, x_max: f64) -> Result<Vec<Series>, ReductionError> {
        match self.request_zoom(x_min, x_max) {
            ZoomAction::Ready(series) => Ok(series),
            ZoomAction::Fetch(ticket) => {
                self.begin_fetch(ticket);
                let result = self
                    .source
                    .fetch(&self.key, Some((ticket.step_min, ticket.step_max)), 0, false)
                    .await;
                match self.complete_zoom(ticket, result) {
                    Some(series) => Ok(series),
                    // Superseded while in flight; keep what is displayed.
                    None => Ok(self.displayed.clone()),
                }
            }
        }
    }

    /// Reset to the overview: discard the zoom slice and re-assemble the
    /// overview cache.
    pub fn reset(&mut self) -> Vec<Series> {
        self.zoom_cache = None;
        self.visible = None;
        self.state = ZoomState::Overview;
        self.displayed = reduce_series(
            &self.overview_cache,
            self.max_points,
            &self.settings,
            self.multi_metric,
        );
        self.displayed.clone()
    }
}
