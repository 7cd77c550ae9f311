use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Ready means the node has replayed the journal up to its own bootstrap
/// sentinel and serves consistent reads.
#[utoipa::path(
    get,
    path = "/ready",
    tag = "Health",
    operation_id = "healthReady",
    responses(
        (status = 200, description = "Node is ready", body = HealthResponse),
        (status = 503, description = "Node is still replaying", body = HealthResponse),
    ),
)]
pub async fn ready(State(state): State<AppState>) -> impl IntoResponse {
    if state.store.is_ready() {
        (StatusCode::OK, Json(HealthResponse { status: "UP" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "DOWN" }),
        )
    }
}

#[utoipa::path(
    get,
    path = "/live",
    tag = "Health",
    operation_id = "healthLive",
    responses(
        (status = 200, description = "Consumer loop is healthy", body = HealthResponse),
        (status = 503, description = "Node is stopped or the consumer loop stalled", body = HealthResponse),
    ),
)]
pub async fn live(State(state): State<AppState>) -> impl IntoResponse {
    if state.store.is_alive() {
        (StatusCode::OK, Json(HealthResponse { status: "UP" }))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(HealthResponse { status: "DOWN" }),
        )
    }
}
