use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use utoipa::{IntoParams, ToSchema};

use crate::common::AppState;
use crate::config::Config;
use crate::entity::{Datastream, NormalizedSeries};
use crate::error::{AppError, AppResult};
use crate::routes::resolve_sensor;
use crate::routes::sensors::DatastreamResponse;
use crate::services::SeriesSummary;
use crate::sta::{EntityId, TimeWindow};

#[derive(Debug, Deserialize, IntoParams)]
pub struct ObservationsQuery {
    /// Time window: `all`, `24h`, `7d`, `30d`, `90d` (default: `all`)
    pub window: Option<String>,
    /// Maximum observations per datastream
    pub limit: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct CompareQuery {
    /// Comma-separated datastream ids
    pub datastreams: String,
    /// Time window: `all`, `24h`, `7d`, `30d`, `90d` (default: `all`)
    pub window: Option<String>,
    /// Maximum observations per datastream
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SeriesResponse {
    pub datastream: DatastreamResponse,
    pub series: NormalizedSeries,
    /// Null when the series is empty
    pub summary: Option<SeriesSummary>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ObservationsResponse {
    /// Window code that was applied
    pub window: String,
    /// Lower bound of the window (null for `all`)
    pub start: Option<DateTime<Utc>>,
    #[serde(flatten)]
    pub data: SeriesResponse,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompareResponse {
    pub window: String,
    pub start: Option<DateTime<Utc>>,
    /// Datastreams that returned data, in request order
    pub series: Vec<SeriesResponse>,
}

fn parse_window(raw: Option<&str>) -> AppResult<TimeWindow> {
    raw.map_or(Ok(TimeWindow::default()), |w| {
        w.parse::<TimeWindow>()
            .map_err(|e| AppError::BadRequest(e.to_string()))
    })
}

fn resolve_limit(config: &Config, limit: Option<u32>) -> AppResult<u32> {
    let limit = limit.unwrap_or(config.observations_default_limit);
    let (min, max) = (config.observations_min_limit, config.observations_max_limit);

    if limit < min || limit > max {
        return Err(AppError::BadRequest(format!(
            "limit must be between {min} and {max}"
        )));
    }
    Ok(limit)
}

fn series_response(datastream: &Datastream, series: NormalizedSeries) -> SeriesResponse {
    SeriesResponse {
        datastream: datastream.into(),
        summary: SeriesSummary::from_series(&series),
        series,
    }
}

/// Observations of one datastream, oldest first, with summary statistics
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/datastreams/{datastream_id}/observations",
    params(
        ("sensor_id" = String, Path, description = "Sensor `@iot.id`"),
        ("datastream_id" = String, Path, description = "Datastream `@iot.id`"),
        ObservationsQuery,
    ),
    responses(
        (status = 200, description = "Observations retrieved successfully", body = ObservationsResponse),
        (status = 400, description = "Invalid window or limit"),
        (status = 404, description = "Sensor or datastream not found"),
    ),
    tag = "observations"
)]
pub async fn get_observations(
    State(state): State<AppState>,
    Path((sensor_id, datastream_id)): Path<(String, String)>,
    Query(query): Query<ObservationsQuery>,
) -> AppResult<Json<ObservationsResponse>> {
    let window = parse_window(query.window.as_deref())?;
    let limit = resolve_limit(&state.config, query.limit)?;

    let detail = resolve_sensor(&state, &sensor_id).await?;
    let datastream = detail
        .datastream(&EntityId::from(datastream_id.as_str()))
        .ok_or_else(|| {
            AppError::NotFound(format!(
                "Datastream '{datastream_id}' not found on sensor '{sensor_id}'"
            ))
        })?;

    let now = state.explorer.now();
    let series = state.explorer.observations(datastream, limit, window, now).await;

    if series.is_empty() {
        tracing::debug!(
            sensor_id = %sensor_id,
            datastream_id = %datastream_id,
            window = window.code(),
            "No observations in window"
        );
    }

    Ok(Json(ObservationsResponse {
        window: window.code().to_string(),
        start: window.start(now),
        data: series_response(datastream, series),
    }))
}

/// Observations of several datastreams of one sensor, fetched concurrently
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}/compare",
    params(
        ("sensor_id" = String, Path, description = "Sensor `@iot.id`"),
        CompareQuery,
    ),
    responses(
        (status = 200, description = "Comparison data retrieved successfully", body = CompareResponse),
        (status = 400, description = "Too few or too many datastreams, invalid window or limit"),
        (status = 404, description = "Sensor or datastream not found"),
    ),
    tag = "observations"
)]
pub async fn compare_datastreams(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Query(query): Query<CompareQuery>,
) -> AppResult<Json<CompareResponse>> {
    let window = parse_window(query.window.as_deref())?;
    let limit = resolve_limit(&state.config, query.limit)?;

    let mut seen = HashSet::new();
    let ids: Vec<EntityId> = query
        .datastreams
        .split(',')
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(EntityId::from)
        .filter(|id| seen.insert(id.clone()))
        .collect();

    let max = state.config.max_compare_datastreams;
    if ids.len() < 2 || ids.len() > max {
        return Err(AppError::BadRequest(format!(
            "Select between 2 and {max} datastreams to compare"
        )));
    }

    let detail = resolve_sensor(&state, &sensor_id).await?;
    let datastreams = ids
        .iter()
        .map(|id| {
            detail.datastream(id).cloned().ok_or_else(|| {
                AppError::NotFound(format!("Datastream '{id}' not found on sensor '{sensor_id}'"))
            })
        })
        .collect::<AppResult<Vec<Datastream>>>()?;

    let now = state.explorer.now();
    let series = state.explorer.compare(&datastreams, limit, window, now).await;

    let series = series
        .into_iter()
        .filter_map(|s| {
            let datastream = datastreams.iter().find(|ds| ds.id == s.datastream_id)?;
            Some(series_response(datastream, s))
        })
        .collect();

    Ok(Json(CompareResponse {
        window: window.code().to_string(),
        start: window.start(now),
        series,
    }))
}
