//! HTTP request handlers for the elevation service.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;
use terrain50::{GridRef, Terrain50Error};

use crate::AppState;

/// Response for a height query.
#[derive(Debug, Serialize)]
pub struct HeightResponse {
    /// Canonical ten-digit form of the queried reference.
    #[serde(rename = "osGridRef")]
    pub os_grid_ref: String,
    /// Easting in metres from the grid origin.
    pub easting: i32,
    /// Northing in metres from the grid origin.
    pub northing: i32,
    /// Height above Ordnance Datum Newlyn, in metres.
    pub height: f64,
    /// WGS84 latitude of the reference, for display.
    pub lat: f64,
    /// WGS84 longitude of the reference, for display.
    pub lon: f64,
}

/// Error response payload.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
}

/// Service statistics response.
#[derive(Debug, Serialize)]
pub struct StatsResponse {
    pub cached_tiles: usize,
    pub requests: u64,
    pub decodes: u64,
    pub failures: u64,
}

/// GET /v4/height/:gridref - height at a national grid reference.
pub async fn get_height(
    State(state): State<Arc<AppState>>,
    Path(reference): Path<String>,
) -> Result<Json<HeightResponse>, (StatusCode, Json<ErrorResponse>)> {
    let gridref: GridRef = reference
        .parse()
        .map_err(|e: Terrain50Error| error_response(StatusCode::BAD_REQUEST, &e))?;

    let height = state.terrain.height_at(&gridref).map_err(|e| {
        tracing::debug!(reference = %reference, error = %e, "height lookup failed");
        error_response(error_status(&e), &e)
    })?;

    let point = gridref.to_lat_lon();
    Ok(Json(HeightResponse {
        os_grid_ref: gridref.format(10),
        easting: gridref.easting(),
        northing: gridref.northing(),
        height,
        lat: point.lat,
        lon: point.lon,
    }))
}

/// GET /health - liveness check.
pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// GET /stats - cache and counter statistics.
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<StatsResponse> {
    let metrics = state.terrain.metrics_snapshot();
    Json(StatsResponse {
        cached_tiles: state.terrain.cached_tiles(),
        requests: metrics.requests,
        decodes: metrics.decodes,
        failures: metrics.failures,
    })
}

/// GET /metrics - counters in Prometheus text exposition format.
pub async fn get_metrics(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let metrics = state.terrain.metrics_snapshot();
    let body = format!(
        "# HELP terrain50_requests_total Height requests that reached the tile cache.\n\
         # TYPE terrain50_requests_total counter\n\
         terrain50_requests_total {}\n\
         # HELP terrain50_tile_decodes_total Tiles read and decoded from storage.\n\
         # TYPE terrain50_tile_decodes_total counter\n\
         terrain50_tile_decodes_total {}\n\
         # HELP terrain50_tile_failures_total Tile decodes that failed.\n\
         # TYPE terrain50_tile_failures_total counter\n\
         terrain50_tile_failures_total {}\n",
        metrics.requests, metrics.decodes, metrics.failures
    );
    (
        [(
            axum::http::header::CONTENT_TYPE,
            "text/plain; version=0.0.4",
        )],
        body,
    )
}

/// Map a lookup error to an HTTP status by its root cause.
fn error_status(err: &Terrain50Error) -> StatusCode {
    match err.root_cause() {
        Terrain50Error::TileNotFound { .. } => StatusCode::NOT_FOUND,
        Terrain50Error::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        _ => StatusCode::BAD_REQUEST,
    }
}

fn error_response(
    status: StatusCode,
    err: &Terrain50Error,
) -> (StatusCode, Json<ErrorResponse>) {
    (
        status,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}
