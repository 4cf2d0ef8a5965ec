use axum::{Router, http::HeaderValue, middleware, routing::get};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::services::MovieService;
use crate::state::SharedState;

mod error;
mod movies;
mod observability;
mod system;
mod types;
mod validation;

pub use error::ApiError;
pub use types::*;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.shared.config
    }

    #[must_use]
    pub fn movies(&self) -> &Arc<dyn MovieService> {
        &self.shared.movie_service
    }
}

#[must_use]
pub fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> Arc<AppState> {
    Arc::new(AppState {
        shared,
        prometheus_handle,
    })
}

pub fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config)?);
    Ok(create_app_state(shared, prometheus_handle))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = if origins.iter().any(|o| o == "*") {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> = origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    layer.allow_methods(Any).allow_headers(Any)
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.config().server.cors_allowed_origins);

    let api_router = Router::new()
        .route("/movie", get(movies::get_movie))
        .route("/movies", get(movies::discover_movies))
        .route("/search", get(movies::search_movies))
        .route("/trending", get(movies::trending_movies));

    Router::new()
        .route("/health", get(system::health))
        .route("/metrics", get(observability::get_metrics))
        .nest("/api", api_router)
        .with_state(state)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}
