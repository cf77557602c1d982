pub mod cache;
pub mod health;
pub mod observations;
pub mod sensors;

use axum::{
    routing::{get, post},
    Router,
};
use tower::ServiceBuilder;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    limit::RequestBodyLimitLayer,
    trace::TraceLayer,
};
use utoipa::OpenApi;
use utoipa_scalar::{Scalar, Servable};

use crate::common::AppState;
use crate::entity::SensorDetail;
use crate::error::{AppError, AppResult};
use crate::sta::EntityId;

/// Load a sensor with its datastreams, or 404.
///
/// An upstream failure looks the same as a missing sensor: the cached
/// substitute payload has no id.
pub async fn resolve_sensor(state: &AppState, sensor_id: &str) -> AppResult<SensorDetail> {
    state
        .explorer
        .sensor_detail(EntityId::from(sensor_id))
        .await
        .ok_or_else(|| AppError::NotFound(format!("Sensor '{sensor_id}' not found")))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::healthz,
        sensors::list_sensors,
        sensors::get_sensor,
        observations::get_observations,
        observations::compare_datastreams,
        cache::refresh_cache,
    ),
    components(
        schemas(
            sensors::SensorResponse,
            sensors::SensorDetailResponse,
            sensors::DatastreamResponse,
            observations::SeriesResponse,
            observations::ObservationsResponse,
            observations::CompareResponse,
            cache::RefreshResponse,
        )
    ),
    tags(
        (name = "health", description = "Health check endpoints"),
        (name = "sensors", description = "Sensors and their datastreams"),
        (name = "observations", description = "Observation series and summaries"),
        (name = "cache", description = "Upstream response cache"),
    ),
    info(
        title = "Sensor Explorer API",
        description = "Cached access to OGC SensorThings observation services",
        version = "0.1.0"
    )
)]
struct ApiDoc;

pub fn build_router(state: AppState) -> Router {
    tracing::info!(
        upstream = %state.config.sta_base_url,
        sensors_ttl_secs = state.config.cache_sensors_ttl_seconds,
        observations_ttl_secs = state.config.cache_observations_ttl_seconds,
        "Building router"
    );

    let api_routes = Router::new()
        .route("/sensors", get(sensors::list_sensors))
        .route("/sensors/{sensor_id}", get(sensors::get_sensor))
        .route(
            "/sensors/{sensor_id}/datastreams/{datastream_id}/observations",
            get(observations::get_observations),
        )
        .route(
            "/sensors/{sensor_id}/compare",
            get(observations::compare_datastreams),
        )
        .route("/cache/refresh", post(cache::refresh_cache))
        .layer(RequestBodyLimitLayer::new(64 * 1024));

    // Health check routes
    let health_routes = Router::new().route("/healthz", get(health::healthz));

    // OpenAPI documentation
    let docs_routes = Router::new().merge(Scalar::with_url("/docs", ApiDoc::openapi()));

    // Combine all routes
    Router::new()
        .nest("/api", api_routes)
        .merge(health_routes)
        .merge(docs_routes)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(
                    CorsLayer::new()
                        .allow_origin(Any)
                        .allow_methods(Any)
                        .allow_headers(Any),
                )
                .layer(CompressionLayer::new()),
        )
        .with_state(state)
}
