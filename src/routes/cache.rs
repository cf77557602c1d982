use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::common::AppState;

#[derive(Debug, Serialize, ToSchema)]
pub struct RefreshResponse {
    /// Number of cache entries dropped
    pub cleared: usize,
}

/// Clear cached upstream responses
///
/// The next request for any resource goes to the SensorThings server.
/// Requests already in flight are not cancelled.
#[utoipa::path(
    post,
    path = "/api/cache/refresh",
    responses(
        (status = 200, description = "Cache cleared", body = RefreshResponse),
    ),
    tag = "cache"
)]
pub async fn refresh_cache(State(state): State<AppState>) -> Json<RefreshResponse> {
    Json(RefreshResponse {
        cleared: state.explorer.refresh().await,
    })
}
