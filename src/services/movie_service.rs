//! Domain service for movie lookups and spoiler generation.
//!
//! Handlers talk to [`MovieService`] only; the catalog, generation and store
//! clients stay behind it.

use crate::clients::gemini::GeminiError;
use crate::clients::tmdb::TmdbError;
use crate::constants::discover::DEFAULT_YEAR;
use crate::models::MovieRecord;
use std::fmt;
use thiserror::Error;

/// Domain errors for movie operations.
///
/// Store failures on the lookup/save path never show up here; only the
/// trending listing, which has nothing to fall back to, reports them.
#[derive(Debug, Error)]
pub enum MovieError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{context}: {detail}")]
    Upstream {
        context: &'static str,
        detail: String,
    },

    #[error("failed to generate spoiler explanation: no candidates in Gemini response")]
    EmptyResponse,

    #[error("database not configured")]
    StoreUnavailable,

    #[error("failed to fetch trending movies: {0}")]
    Store(String),
}

impl MovieError {
    pub fn upstream(context: &'static str, detail: impl fmt::Display) -> Self {
        Self::Upstream {
            context,
            detail: detail.to_string(),
        }
    }

    pub fn required_param(name: &str) -> Self {
        Self::Validation(format!("{name} query parameter is required"))
    }
}

impl From<TmdbError> for MovieError {
    fn from(err: TmdbError) -> Self {
        match err {
            TmdbError::NotFound(_) => Self::NotFound(err.to_string()),
            TmdbError::Upstream(e) => Self::upstream("failed to search movie", e),
        }
    }
}

impl From<GeminiError> for MovieError {
    fn from(err: GeminiError) -> Self {
        match err {
            GeminiError::EmptyResponse => Self::EmptyResponse,
            other => Self::upstream("failed to generate spoiler explanation", other),
        }
    }
}

/// Which release years a discover request covers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum YearFilter {
    Single(String),
    Range { start: String, end: String },
}

impl YearFilter {
    /// `years` wins over `year`; of a comma list only the first and last
    /// entries count. Empty parameters are treated as absent.
    #[must_use]
    pub fn from_params(years: Option<&str>, year: Option<&str>) -> Self {
        if let Some(years) = years.filter(|y| !y.is_empty()) {
            let mut parts = years.split(',');
            let start = parts.next().unwrap_or_default().trim().to_string();
            let end = parts
                .next_back()
                .map_or_else(|| start.clone(), |last| last.trim().to_string());
            return Self::Range { start, end };
        }

        let year = year.filter(|y| !y.is_empty()).unwrap_or(DEFAULT_YEAR);
        Self::Single(year.to_string())
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self {
            Self::Single(year) => year.clone(),
            Self::Range { start, end } => format!("{start}-{end}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DiscoverQuery {
    pub years: YearFilter,
    pub page: u32,
}

#[derive(Debug, Clone)]
pub struct DiscoverResult {
    pub movies: Vec<MovieRecord>,
    pub label: String,
    pub page: u32,
    pub total_pages: u32,
}

#[derive(Debug, Clone, Copy)]
pub struct HealthInfo {
    pub cache_size: usize,
    pub database: bool,
}

/// Movie operations exposed over HTTP.
#[async_trait::async_trait]
pub trait MovieService: Send + Sync {
    /// Resolves `title`, then serves the stored record or generates a fresh
    /// spoiler and persists it in the background.
    ///
    /// # Errors
    ///
    /// - [`MovieError::Validation`] for a blank title
    /// - [`MovieError::NotFound`] when the catalog has no match
    /// - [`MovieError::Upstream`] / [`MovieError::EmptyResponse`] when a
    ///   mandatory upstream step fails
    async fn get_movie(&self, title: &str) -> Result<MovieRecord, MovieError>;

    /// Popular releases for a year or year range. No spoilers.
    ///
    /// # Errors
    ///
    /// Returns [`MovieError::Upstream`] if the catalog call fails.
    async fn discover(&self, query: DiscoverQuery) -> Result<DiscoverResult, MovieError>;

    /// Catalog search without spoilers.
    ///
    /// # Errors
    ///
    /// - [`MovieError::Validation`] for a blank query
    /// - [`MovieError::Upstream`] if the catalog call fails
    async fn search(&self, query: &str) -> Result<Vec<MovieRecord>, MovieError>;

    /// Most searched stored movies.
    ///
    /// # Errors
    ///
    /// - [`MovieError::StoreUnavailable`] when no store is configured
    /// - [`MovieError::Store`] when the store call fails
    async fn trending(&self) -> Result<Vec<MovieRecord>, MovieError>;

    async fn health(&self) -> HealthInfo;
}
