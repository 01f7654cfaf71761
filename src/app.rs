//! HTTP API for the metric reduction service.

use crate::app_state::{AppState, SharedAppState};
use crate::assembly;
use crate::cli::CommandLineArgs;
use crate::error::ReductionError;
use crate::metrics;
use crate::models;
use crate::sampler;
use crate::store::SeriesStore;
use crate::types::{MetricPoint, Series};
use crate::validated_json::ValidatedJson;

use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};
use std::mem::size_of;
use std::sync::Arc;
use tower::{Layer, ServiceBuilder};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;

/// The app service, a router with trailing slashes normalised away.
pub type Service = NormalizePath<Router>;

/// Build and return the [Service].
pub fn service(args: &CommandLineArgs) -> Service {
    NormalizePathLayer::trim_trailing_slash().layer(router(args))
}

/// Build the router.
fn router(args: &CommandLineArgs) -> Router {
    fn v1(state: SharedAppState) -> Router {
        Router::new()
            .route("/sample", post(sample))
            .route("/sample/batch", post(sample_batch))
            .route("/reduce", post(reduce))
            .route("/ingest", post(ingest))
            .route("/series", get(series))
            .with_state(state)
            .layer(
                ServiceBuilder::new().layer(
                    TraceLayer::new_for_http()
                        .on_request(metrics::request_counter)
                        .on_response(metrics::record_response_metrics),
                ),
            )
    }

    let state = Arc::new(AppState::new(args));
    Router::new()
        .route("/.well-known/plotline-schema", get(schema))
        .route("/metrics", get(metrics::metrics_handler))
        .nest("/v1", v1(state))
}

/// Service descriptor.
async fn schema() -> &'static str {
    "Plotline metric reduction API v1"
}

/// Run a closure on the rayon pool if `--use-rayon` was set, otherwise
/// inline on the current thread.
async fn maybe_rayon<F, R>(args: &CommandLineArgs, f: F) -> R
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    if args.use_rayon {
        tokio_rayon::spawn(f).await
    } else {
        f()
    }
}

/// Sample one series under the resource manager's limits.
///
/// Memory permits are proportional to the number of rows the scan will
/// materialise. The task permit is held for the duration of the sampling
/// computation.
async fn sample_one(
    state: &SharedAppState,
    key: models::SeriesKey,
    range: Option<models::StepRange>,
    max_points: usize,
    preview: bool,
) -> Result<models::SampleResponse, ReductionError> {
    let range = range.map(|r| (r.min, r.max));
    let total = state.store.count(&key, range)?;
    let _memory_permit = state
        .resource_manager
        .memory(total * size_of::<MetricPoint>())
        .await?;
    let _task_permit = state.resource_manager.task().await?;
    let points = state.store.scan(&key, range)?;
    let sampled = maybe_rayon(&state.args, move || {
        sampler::sample(points, range, max_points, preview)
    })
    .await;
    Ok(models::SampleResponse {
        key,
        mode: sampled.mode,
        total: sampled.total,
        points: sampled.points,
    })
}

/// Handler for `POST /v1/sample`.
async fn sample(
    State(state): State<SharedAppState>,
    ValidatedJson(request): ValidatedJson<models::SampleRequest>,
) -> Result<Json<models::SampleResponse>, ReductionError> {
    let response = sample_one(
        &state,
        request.key,
        request.range,
        request.max_points,
        request.preview,
    )
    .await?;
    Ok(Json(response))
}

/// Handler for `POST /v1/sample/batch`.
///
/// Keys are sampled independently and sequentially; responses preserve
/// request order. Any key failing fails the whole batch.
async fn sample_batch(
    State(state): State<SharedAppState>,
    ValidatedJson(request): ValidatedJson<models::BatchSampleRequest>,
) -> Result<Json<models::BatchSampleResponse>, ReductionError> {
    let mut series = Vec::with_capacity(request.keys.len());
    for key in request.keys {
        series.push(
            sample_one(
                &state,
                key,
                request.range,
                request.max_points,
                request.preview,
            )
            .await?,
        );
    }
    Ok(Json(models::BatchSampleResponse { series }))
}

/// Handler for `POST /v1/reduce`.
///
/// Runs the full reduction pipeline over the posted points and returns the
/// assembled plot series.
async fn reduce(
    State(state): State<SharedAppState>,
    ValidatedJson(request): ValidatedJson<models::ReduceRequest>,
) -> Result<Json<models::ReduceResponse>, ReductionError> {
    let _task_permit = state.resource_manager.task().await?;
    let raw_points = request.points.len();
    let series = maybe_rayon(&state.args, move || {
        let base = Series::from_points(&request.label, &request.points);
        assembly::reduce_series(&base, request.max_points, &request.smoothing, request.multi_metric)
            .into_iter()
            .map(models::SeriesPayload::from)
            .collect::<Vec<_>>()
    })
    .await;
    Ok(Json(models::ReduceResponse { series, raw_points }))
}

/// Handler for `POST /v1/ingest`.
async fn ingest(
    State(state): State<SharedAppState>,
    ValidatedJson(request): ValidatedJson<models::IngestRequest>,
) -> Result<Json<models::IngestResponse>, ReductionError> {
    let points: Vec<MetricPoint> = request
        .points
        .into_iter()
        .map(models::IngestPoint::sanitise)
        .collect();
    let appended = points.len();
    let total = state.store.append(&request.key, points)?;
    Ok(Json(models::IngestResponse {
        key: request.key,
        appended,
        total,
    }))
}

/// Handler for `GET /v1/series`.
async fn series(
    State(state): State<SharedAppState>,
) -> Result<Json<models::SeriesListResponse>, ReductionError> {
    let series = state.store.keys()?;
    Ok(Json(models::SeriesListResponse { series }))
}
