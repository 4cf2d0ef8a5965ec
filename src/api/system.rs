use axum::{Json, extract::State};
use std::sync::Arc;

use super::{AppState, HealthResponse};

/// `GET /health`. Always 200; reports the spoiler cache size and whether a
/// store is wired up.
pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let info = state.movies().health().await;

    Json(HealthResponse {
        status: "healthy",
        cache_size: info.cache_size,
        database: info.database,
    })
}
