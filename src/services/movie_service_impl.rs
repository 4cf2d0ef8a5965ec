//! [`MovieService`] backed by the catalog, generation and store clients.

use crate::clients::gemini::GeminiClient;
use crate::clients::supabase::SupabaseClient;
use crate::clients::tmdb::{TmdbClient, TmdbMovie, to_movie_record};
use crate::models::{GenreMap, MovieRecord};
use crate::services::movie_service::{
    DiscoverQuery, DiscoverResult, HealthInfo, MovieError, MovieService, YearFilter,
};
use std::sync::Arc;
use tracing::{info, warn};

/// Resolve, look up, generate, persist.
///
/// The store is optional; every stage that touches it checks for it first
/// and treats its failures as a degraded feature, never as a request error.
pub struct SpoilerPipeline {
    tmdb: Arc<TmdbClient>,
    gemini: Arc<GeminiClient>,
    store: Option<Arc<SupabaseClient>>,
    overview_max_length: usize,
}

impl SpoilerPipeline {
    #[must_use]
    pub const fn new(
        tmdb: Arc<TmdbClient>,
        gemini: Arc<GeminiClient>,
        store: Option<Arc<SupabaseClient>>,
        overview_max_length: usize,
    ) -> Self {
        Self {
            tmdb,
            gemini,
            store,
            overview_max_length,
        }
    }

    async fn lookup_stored(&self, title: &str, year: &str) -> Option<MovieRecord> {
        let store = self.store.as_ref()?;

        match store.find_by_title_and_year(title, year).await {
            Ok(found) => found.map(|record| record.movie),
            Err(e) => {
                warn!("Store lookup failed for '{} ({})': {}", title, year, e);
                None
            }
        }
    }

    fn spawn_save(&self, record: &MovieRecord) {
        let Some(store) = self.store.clone() else {
            return;
        };

        let record = record.clone();
        tokio::spawn(async move {
            match store.save(&record).await {
                Ok(()) => info!("Saved '{} ({})' to store", record.title, record.year),
                Err(e) => warn!(
                    "Failed to save '{} ({})' to store: {}",
                    record.title, record.year, e
                ),
            }
        });
    }

    /// Listing endpoints still answer when the genre list is unavailable.
    async fn genre_map_or_empty(&self) -> GenreMap {
        self.tmdb.genre_map().await.unwrap_or_else(|e| {
            warn!("Failed to fetch genres: {}", e);
            GenreMap::new()
        })
    }

    fn to_records(&self, movies: &[TmdbMovie], genres: &GenreMap) -> Vec<MovieRecord> {
        movies
            .iter()
            .map(|movie| to_movie_record(movie, genres, self.overview_max_length))
            .collect()
    }
}

fn require(value: &str, name: &str) -> Result<(), MovieError> {
    if value.trim().is_empty() {
        return Err(MovieError::required_param(name));
    }
    Ok(())
}

#[async_trait::async_trait]
impl MovieService for SpoilerPipeline {
    async fn get_movie(&self, title: &str) -> Result<MovieRecord, MovieError> {
        require(title, "title")?;

        let movie = self.tmdb.resolve(title).await?;
        let year = movie.year();

        if let Some(stored) = self.lookup_stored(&movie.title, year).await {
            info!("Cache HIT: serving '{} ({})' from store", stored.title, stored.year);
            return Ok(stored);
        }

        info!("Cache MISS: generating spoiler for '{} ({})'", movie.title, year);

        let genres = self
            .tmdb
            .genre_map()
            .await
            .map_err(|e| MovieError::upstream("failed to fetch genres", e))?;

        let spoiler = self.gemini.generate_spoiler(&movie.title, year).await?;

        let record =
            to_movie_record(&movie, &genres, self.overview_max_length).with_spoiler(spoiler);
        self.spawn_save(&record);

        Ok(record)
    }

    async fn discover(&self, query: DiscoverQuery) -> Result<DiscoverResult, MovieError> {
        let label = query.years.label();

        let (movies, total_pages) = match &query.years {
            YearFilter::Range { start, end } => {
                let page = self
                    .tmdb
                    .discover_by_date_range(start, end, query.page)
                    .await
                    .map_err(|e| MovieError::upstream("failed to discover movies", e))?;
                (page.movies, page.total_pages)
            }
            YearFilter::Single(year) => {
                let movies = self
                    .tmdb
                    .discover_by_year(year)
                    .await
                    .map_err(|e| MovieError::upstream("failed to discover movies", e))?;
                (movies, 1)
            }
        };

        let genres = self.genre_map_or_empty().await;

        Ok(DiscoverResult {
            movies: self.to_records(&movies, &genres),
            label,
            page: query.page,
            total_pages,
        })
    }

    async fn search(&self, query: &str) -> Result<Vec<MovieRecord>, MovieError> {
        require(query, "q")?;

        let movies = self
            .tmdb
            .search(query)
            .await
            .map_err(|e| MovieError::upstream("failed to search movies", e))?;

        let genres = self.genre_map_or_empty().await;
        Ok(self.to_records(&movies, &genres))
    }

    async fn trending(&self) -> Result<Vec<MovieRecord>, MovieError> {
        let store = self.store.as_ref().ok_or(MovieError::StoreUnavailable)?;

        let rows = store
            .list_all()
            .await
            .map_err(|e| MovieError::Store(e.to_string()))?;

        Ok(rows.into_iter().map(|row| row.movie).collect())
    }

    async fn health(&self) -> HealthInfo {
        HealthInfo {
            cache_size: self.gemini.cache_size().await,
            database: self.store.is_some(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{GeminiConfig, SupabaseConfig, TmdbConfig};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const GENERATE_PATH: &str = "/models/gemini-2.5-flash:generateContent";

    struct Upstreams {
        tmdb: MockServer,
        gemini: MockServer,
        store: MockServer,
    }

    impl Upstreams {
        async fn start() -> Self {
            Self {
                tmdb: MockServer::start().await,
                gemini: MockServer::start().await,
                store: MockServer::start().await,
            }
        }

        fn pipeline(&self, with_store: bool) -> SpoilerPipeline {
            let tmdb = TmdbClient::new(&TmdbConfig {
                api_key: "tmdb-key".to_string(),
                base_url: self.tmdb.uri(),
                ..TmdbConfig::default()
            });
            let gemini = GeminiClient::new(&GeminiConfig {
                api_key: "gemini-key".to_string(),
                base_url: self.gemini.uri(),
                ..GeminiConfig::default()
            });
            let store = with_store.then(|| {
                Arc::new(
                    SupabaseClient::new(&SupabaseConfig {
                        url: self.store.uri(),
                        key: "store-key".to_string(),
                        request_timeout_seconds: 5,
                    })
                    .unwrap(),
                )
            });

            SpoilerPipeline::new(Arc::new(tmdb), Arc::new(gemini), store, 500)
        }

        async fn catalog_has_inception(&self) {
            Mock::given(method("GET"))
                .and(path("/search/movie"))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "results": [{
                        "id": 27205,
                        "title": "Inception",
                        "release_date": "2010-07-15",
                        "poster_path": "/inception.jpg",
                        "backdrop_path": "/inception-bg.jpg",
                        "vote_average": 8.4,
                        "overview": "Dreams within dreams.",
                        "genre_ids": [28, 878]
                    }]
                })))
                .mount(&self.tmdb)
                .await;
        }

        async fn genres(&self, status: u16) {
            Mock::given(method("GET"))
                .and(path("/genre/movie/list"))
                .respond_with(ResponseTemplate::new(status).set_body_json(serde_json::json!({
                    "genres": [
                        { "id": 28, "name": "Action" },
                        { "id": 878, "name": "Science Fiction" }
                    ]
                })))
                .mount(&self.tmdb)
                .await;
        }

        async fn generation(&self, expected_calls: u64) {
            Mock::given(method("POST"))
                .and(path(GENERATE_PATH))
                .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                    "candidates": [{ "content": { "parts": [{ "text": "The top wobbles." }] } }]
                })))
                .expect(expected_calls)
                .mount(&self.gemini)
                .await;
        }
    }

    #[tokio::test]
    async fn blank_title_is_rejected_before_any_upstream_call() {
        let upstreams = Upstreams::start().await;
        let err = upstreams.pipeline(false).get_movie("   ").await.unwrap_err();

        assert!(matches!(err, MovieError::Validation(_)));
        assert!(upstreams.tmdb.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn miss_generates_and_assembles_record() {
        let upstreams = Upstreams::start().await;
        upstreams.catalog_has_inception().await;
        upstreams.genres(200).await;
        upstreams.generation(1).await;

        let record = upstreams.pipeline(false).get_movie("inception").await.unwrap();

        assert_eq!(record.title, "Inception");
        assert_eq!(record.year, "2010");
        assert_eq!(record.genres, vec!["Action", "Science Fiction"]);
        assert_eq!(record.poster, "https://image.tmdb.org/t/p/w500/inception.jpg");
        assert_eq!(record.spoiler, "The top wobbles.");
        assert!(upstreams.store.received_requests().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn stored_record_short_circuits_generation() {
        let upstreams = Upstreams::start().await;
        upstreams.catalog_has_inception().await;
        upstreams.generation(0).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/movies"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([{
                "id": "row-1",
                "title": "Inception",
                "year": "2010",
                "spoiler": "From the store.",
                "search_count": 2
            }])))
            .mount(&upstreams.store)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/rpc/increment_search_count"))
            .respond_with(ResponseTemplate::new(204))
            .mount(&upstreams.store)
            .await;

        let record = upstreams.pipeline(true).get_movie("Inception").await.unwrap();
        assert_eq!(record.spoiler, "From the store.");
    }

    #[tokio::test]
    async fn store_lookup_failure_falls_through_to_generation() {
        let upstreams = Upstreams::start().await;
        upstreams.catalog_has_inception().await;
        upstreams.genres(200).await;
        upstreams.generation(1).await;
        Mock::given(method("GET"))
            .and(path("/rest/v1/movies"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&upstreams.store)
            .await;
        Mock::given(method("POST"))
            .and(path("/rest/v1/movies"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&upstreams.store)
            .await;

        let record = upstreams.pipeline(true).get_movie("Inception").await.unwrap();
        assert_eq!(record.spoiler, "The top wobbles.");
    }

    #[tokio::test]
    async fn genre_failure_aborts_spoiler_request() {
        let upstreams = Upstreams::start().await;
        upstreams.catalog_has_inception().await;
        upstreams.genres(503).await;
        upstreams.generation(0).await;

        let err = upstreams.pipeline(false).get_movie("Inception").await.unwrap_err();
        assert!(err.to_string().starts_with("failed to fetch genres"));
    }

    #[tokio::test]
    async fn search_degrades_to_no_genres() {
        let upstreams = Upstreams::start().await;
        upstreams.catalog_has_inception().await;
        upstreams.genres(500).await;

        let movies = upstreams.pipeline(false).search("Inception").await.unwrap();
        assert_eq!(movies.len(), 1);
        assert!(movies[0].genres.is_empty());
        assert!(movies[0].spoiler.is_empty());
    }

    #[tokio::test]
    async fn single_year_discover_reports_one_page() {
        let upstreams = Upstreams::start().await;
        upstreams.genres(200).await;
        Mock::given(method("GET"))
            .and(path("/discover/movie"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "results": [{ "id": 1, "title": "One", "release_date": "2025-03-01" }],
                "total_pages": 40
            })))
            .mount(&upstreams.tmdb)
            .await;

        let result = upstreams
            .pipeline(false)
            .discover(DiscoverQuery {
                years: YearFilter::Single("2025".to_string()),
                page: 3,
            })
            .await
            .unwrap();

        assert_eq!(result.label, "2025");
        assert_eq!(result.total_pages, 1);
        assert_eq!(result.page, 3);
        assert_eq!(result.movies[0].year, "2025");
    }

    #[tokio::test]
    async fn trending_requires_store() {
        let upstreams = Upstreams::start().await;
        let err = upstreams.pipeline(false).trending().await.unwrap_err();
        assert!(matches!(err, MovieError::StoreUnavailable));
    }

    #[tokio::test]
    async fn health_reports_cache_and_store() {
        let upstreams = Upstreams::start().await;
        let info = upstreams.pipeline(true).health().await;
        assert_eq!(info.cache_size, 0);
        assert!(info.database);
    }
}
