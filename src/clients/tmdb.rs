use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::error::{UpstreamError, ensure_success};
use crate::config::TmdbConfig;
use crate::constants::OVERVIEW_ELLIPSIS;
use crate::constants::images::{BACKDROP_SIZE, POSTER_SIZE, TMDB_IMAGE_BASE};
use crate::models::{GenreMap, MovieRecord};

const SERVICE: &str = "TMDB";

#[derive(Debug, Error)]
pub enum TmdbError {
    #[error("no movies found for title: {0}")]
    NotFound(String),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TmdbMovie {
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    pub release_date: Option<String>,
    pub poster_path: Option<String>,
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub vote_average: f64,
    pub overview: Option<String>,
    #[serde(default)]
    pub genre_ids: Vec<i64>,
}

impl TmdbMovie {
    #[must_use]
    pub fn year(&self) -> &str {
        extract_year(self.release_date.as_deref().unwrap_or_default())
    }
}

#[derive(Debug, Deserialize)]
struct PagedResponse {
    #[serde(default)]
    results: Vec<TmdbMovie>,
    #[serde(default = "first_page")]
    total_pages: u32,
}

const fn first_page() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
struct GenreListResponse {
    genres: Vec<TmdbGenre>,
}

#[derive(Debug, Deserialize)]
struct TmdbGenre {
    id: i64,
    name: String,
}

/// One page of a discover query.
#[derive(Debug, Clone)]
pub struct DiscoverPage {
    pub movies: Vec<TmdbMovie>,
    pub total_pages: u32,
}

#[derive(Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    #[must_use]
    pub fn new(config: &TmdbConfig) -> Self {
        Self::with_shared_client(Client::new(), config)
    }

    #[must_use]
    pub fn with_shared_client(client: Client, config: &TmdbConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
        }
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}{}", self.base_url, path))
            .map_err(|e| UpstreamError::url(SERVICE, e))?;

        {
            let mut query = url.query_pairs_mut();
            query.append_pair("api_key", &self.api_key);
            for (key, value) in params {
                query.append_pair(key, value);
            }
        }

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T, UpstreamError> {
        debug!(path = url.path(), "TMDB request");

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e))
    }

    /// Full, unfiltered search result list. An empty list is not an error.
    pub async fn search(&self, title: &str) -> Result<Vec<TmdbMovie>, TmdbError> {
        let url = self.endpoint("/search/movie", &[("query", title)])?;
        let response: PagedResponse = self.get_json(url).await?;
        Ok(response.results)
    }

    /// Takes the catalog's first hit as the canonical match.
    pub async fn resolve(&self, title: &str) -> Result<TmdbMovie, TmdbError> {
        self.search(title)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| TmdbError::NotFound(title.to_string()))
    }

    /// Fetched fresh on every call; callers reuse the result within a request.
    pub async fn genre_map(&self) -> Result<GenreMap, TmdbError> {
        let url = self.endpoint("/genre/movie/list", &[])?;
        let response: GenreListResponse = self.get_json(url).await?;

        Ok(response
            .genres
            .into_iter()
            .map(|genre| (genre.id, genre.name))
            .collect())
    }

    pub async fn discover_by_year(&self, year: &str) -> Result<Vec<TmdbMovie>, TmdbError> {
        let url = self.endpoint(
            "/discover/movie",
            &[
                ("primary_release_year", year),
                ("sort_by", "popularity.desc"),
            ],
        )?;
        let response: PagedResponse = self.get_json(url).await?;
        Ok(response.results)
    }

    pub async fn discover_by_date_range(
        &self,
        start_year: &str,
        end_year: &str,
        page: u32,
    ) -> Result<DiscoverPage, TmdbError> {
        let from = format!("{start_year}-01-01");
        let to = format!("{end_year}-12-31");
        let page = page.max(1).to_string();

        let url = self.endpoint(
            "/discover/movie",
            &[
                ("primary_release_date.gte", from.as_str()),
                ("primary_release_date.lte", to.as_str()),
                ("sort_by", "popularity.desc"),
                ("page", page.as_str()),
            ],
        )?;
        let response: PagedResponse = self.get_json(url).await?;

        Ok(DiscoverPage {
            movies: response.results,
            total_pages: response.total_pages,
        })
    }
}

#[must_use]
pub fn format_poster_url(poster_path: &str) -> String {
    image_url(POSTER_SIZE, poster_path)
}

#[must_use]
pub fn format_backdrop_url(backdrop_path: &str) -> String {
    image_url(BACKDROP_SIZE, backdrop_path)
}

fn image_url(size: &str, path: &str) -> String {
    if path.is_empty() {
        return String::new();
    }
    format!("{TMDB_IMAGE_BASE}/{size}{path}")
}

/// First four bytes of a `YYYY-MM-DD` release date, or empty when shorter.
#[must_use]
pub fn extract_year(release_date: &str) -> &str {
    release_date.get(..4).unwrap_or_default()
}

/// Maps genre ids to names in upstream order, dropping ids the map doesn't know.
#[must_use]
pub fn genre_names(genre_ids: &[i64], genres: &GenreMap) -> Vec<String> {
    genre_ids
        .iter()
        .filter_map(|id| genres.get(id).cloned())
        .collect()
}

/// Cuts `overview` to `max_length` bytes and appends "...".
///
/// The cut is a byte cut, not a word or sentence boundary. When byte
/// `max_length` falls inside a multi-byte character the cut moves back to the
/// preceding character boundary, so the result may be a few bytes shorter.
#[must_use]
pub fn truncate_overview(overview: &str, max_length: usize) -> String {
    if overview.len() <= max_length {
        return overview.to_string();
    }

    let mut end = max_length;
    while !overview.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{OVERVIEW_ELLIPSIS}", &overview[..end])
}

/// Assembles the client-facing record for a catalog result. The spoiler is
/// left empty.
#[must_use]
pub fn to_movie_record(movie: &TmdbMovie, genres: &GenreMap, overview_max: usize) -> MovieRecord {
    MovieRecord {
        title: movie.title.clone(),
        year: movie.year().to_string(),
        poster: format_poster_url(movie.poster_path.as_deref().unwrap_or_default()),
        backdrop: format_backdrop_url(movie.backdrop_path.as_deref().unwrap_or_default()),
        rating: movie.vote_average,
        genres: genre_names(&movie.genre_ids, genres),
        overview: truncate_overview(movie.overview.as_deref().unwrap_or_default(), overview_max),
        spoiler: String::new(),
    }
}
