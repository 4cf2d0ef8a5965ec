use axum::{
    Json,
    extract::{Query, State},
};
use serde::Deserialize;
use std::sync::Arc;

use super::{ApiError, AppState, DiscoverResponse, SearchResponse, TrendingResponse};
use crate::api::validation::parse_page;
use crate::models::MovieRecord;
use crate::services::{DiscoverQuery, YearFilter};

#[derive(Deserialize)]
pub struct MovieQuery {
    pub title: Option<String>,
}

#[derive(Deserialize)]
pub struct DiscoverParams {
    pub years: Option<String>,
    pub year: Option<String>,
    pub page: Option<String>,
}

#[derive(Deserialize)]
pub struct SearchParams {
    pub q: Option<String>,
}

/// `GET /api/movie?title=` resolves a title and returns it with its spoiler.
pub async fn get_movie(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MovieQuery>,
) -> Result<Json<MovieRecord>, ApiError> {
    let title = params.title.unwrap_or_default();
    let movie = state.movies().get_movie(&title).await?;
    Ok(Json(movie))
}

/// `GET /api/movies?years=2024,2025&page=2` or `?year=2025`.
pub async fn discover_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DiscoverParams>,
) -> Result<Json<DiscoverResponse>, ApiError> {
    let query = DiscoverQuery {
        years: YearFilter::from_params(params.years.as_deref(), params.year.as_deref()),
        page: parse_page(params.page.as_deref()),
    };

    let result = state.movies().discover(query).await?;

    Ok(Json(DiscoverResponse {
        count: result.movies.len(),
        movies: result.movies,
        year: result.label,
        page: result.page,
        total_pages: result.total_pages,
    }))
}

/// `GET /api/search?q=` returns catalog matches without spoilers.
pub async fn search_movies(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = params.q.unwrap_or_default();
    let movies = state.movies().search(&query).await?;

    Ok(Json(SearchResponse {
        count: movies.len(),
        movies,
        query,
    }))
}

pub async fn trending_movies(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TrendingResponse>, ApiError> {
    let movies = state.movies().trending().await?;

    Ok(Json(TrendingResponse {
        count: movies.len(),
        movies,
    }))
}
