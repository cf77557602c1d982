use axum::{
    extract::{Path, Query, State},
    Json,
};

use crate::common::AppState;
use crate::error::AppResult;
use crate::routes::resolve_sensor;

use super::types::{SensorDetailResponse, SensorResponse, SensorsQuery};

/// List sensors
///
/// An unreachable upstream yields an empty list rather than an error.
#[utoipa::path(
    get,
    path = "/api/sensors",
    params(SensorsQuery),
    responses(
        (status = 200, description = "Sensors retrieved successfully", body = Vec<SensorResponse>),
    ),
    tag = "sensors"
)]
pub async fn list_sensors(
    State(state): State<AppState>,
    Query(query): Query<SensorsQuery>,
) -> AppResult<Json<Vec<SensorResponse>>> {
    let limit = query.limit.unwrap_or(state.config.sensors_list_limit);

    let sensors = state.explorer.sensors(limit, query.filter).await;

    Ok(Json(sensors.into_iter().map(SensorResponse::from).collect()))
}

/// Get a sensor with its datastreams and location
#[utoipa::path(
    get,
    path = "/api/sensors/{sensor_id}",
    params(
        ("sensor_id" = String, Path, description = "Sensor `@iot.id`"),
    ),
    responses(
        (status = 200, description = "Sensor retrieved successfully", body = SensorDetailResponse),
        (status = 404, description = "Sensor not found or unavailable"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> AppResult<Json<SensorDetailResponse>> {
    let detail = resolve_sensor(&state, &sensor_id).await?;
    Ok(Json(detail.into()))
}
