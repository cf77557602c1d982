use axum::http::StatusCode;

/// Liveness probe
///
/// Answers without touching the SensorThings server or the cache, so an
/// upstream outage never fails the probe.
#[utoipa::path(
    get,
    path = "/healthz",
    responses(
        (status = 200, description = "Service is up"),
    ),
    tag = "health"
)]
pub async fn healthz() -> StatusCode {
    StatusCode::OK
}
