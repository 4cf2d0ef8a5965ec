use serde::Serialize;

use crate::models::MovieRecord;

/// Body of every non-2xx response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct DiscoverResponse {
    pub movies: Vec<MovieRecord>,
    pub count: usize,
    /// Single year, or `start-end` for a range.
    pub year: String,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub movies: Vec<MovieRecord>,
    pub count: usize,
    pub query: String,
}

#[derive(Debug, Serialize)]
pub struct TrendingResponse {
    pub movies: Vec<MovieRecord>,
    pub count: usize,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub cache_size: usize,
    pub database: bool,
}
