pub mod canon;
pub mod config;
pub mod database;
pub mod entity;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod models;
pub mod replication;
pub mod routes;
pub mod rules;
pub mod sql;
pub mod state;

use crate::state::AppState;

/// Build the application router.
pub fn build_router(state: AppState) -> axum::Router {
    let (router, _api) = utoipa_axum::router::OpenApiRouter::new()
        .nest("/health", routes::health_routes())
        .nest("/api", routes::api_routes())
        .split_for_parts();
    router.with_state(state)
}
