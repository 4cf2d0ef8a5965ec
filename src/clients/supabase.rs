use reqwest::header::{AUTHORIZATION, CONTENT_TYPE, HeaderMap, HeaderValue, InvalidHeaderValue};
use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use thiserror::Error;
use tracing::debug;
use url::Url;

use super::error::{UpstreamError, ensure_success};
use crate::config::SupabaseConfig;
use crate::constants::limits::TRENDING_LIMIT;
use crate::models::movie::{MovieRecord, NewMovieRow, PersistedRecord};

const SERVICE: &str = "Supabase";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("failed to build Supabase client: {0}")]
    Client(#[source] reqwest::Error),

    #[error("invalid Supabase key: {0}")]
    InvalidKey(#[from] InvalidHeaderValue),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),
}

/// PostgREST client for the `movies` table.
#[derive(Clone)]
pub struct SupabaseClient {
    client: Client,
    base_url: String,
}

impl SupabaseClient {
    /// Builds a dedicated HTTP client carrying the auth headers and the
    /// configured request timeout.
    pub fn new(config: &SupabaseConfig) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(&config.key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", config.key))?,
        );
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(StoreError::Client)?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str, params: &[(&str, &str)]) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, path))
            .map_err(|e| UpstreamError::url(SERVICE, e))?;

        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    async fn send(request: RequestBuilder) -> Result<reqwest::Response, UpstreamError> {
        let response = request
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;
        ensure_success(SERVICE, response).await
    }

    async fn get_rows<T: DeserializeOwned>(&self, url: Url) -> Result<Vec<T>, StoreError> {
        let rows = Self::send(self.client.get(url))
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e))?;
        Ok(rows)
    }

    /// Case-insensitive title match plus exact year. A hit bumps the row's
    /// popularity counter in the background.
    pub async fn find_by_title_and_year(
        &self,
        title: &str,
        year: &str,
    ) -> Result<Option<PersistedRecord>, StoreError> {
        let title_filter = format!("ilike.{title}");
        let year_filter = format!("eq.{year}");
        let url = self.endpoint(
            "movies",
            &[
                ("title", title_filter.as_str()),
                ("year", year_filter.as_str()),
                ("limit", "1"),
            ],
        )?;

        let rows: Vec<PersistedRecord> = self.get_rows(url).await?;
        let found = rows.into_iter().next();

        let result = if found.is_some() { "hit" } else { "miss" };
        metrics::counter!("store_lookups_total", "result" => result).increment(1);

        if let Some(record) = found.as_ref().filter(|r| !r.id.is_empty()) {
            self.spawn_increment_search_count(record.id.clone());
        }

        Ok(found)
    }

    /// Upserts on the store's unique key; the merge policy is the store's.
    pub async fn save(&self, movie: &MovieRecord) -> Result<(), StoreError> {
        let url = self.endpoint("movies", &[])?;

        let response = self
            .client
            .post(url)
            .header("Prefer", "resolution=merge-duplicates")
            .json(&NewMovieRow::new(movie))
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let status = response.status();
        if status != StatusCode::OK && status != StatusCode::CREATED {
            let body = response.text().await.unwrap_or_default();
            return Err(UpstreamError::Status {
                service: SERVICE,
                status,
                body,
            }
            .into());
        }

        Ok(())
    }

    pub async fn increment_search_count(&self, id: &str) -> Result<(), StoreError> {
        let url = self.endpoint("rpc/increment_search_count", &[])?;
        Self::send(
            self.client
                .post(url)
                .json(&serde_json::json!({ "movie_id": id })),
        )
        .await?;
        Ok(())
    }

    /// Detached; the outcome is only logged.
    pub fn spawn_increment_search_count(&self, id: String) {
        let store = self.clone();
        tokio::spawn(async move {
            if let Err(e) = store.increment_search_count(&id).await {
                debug!("Failed to increment search count for {}: {}", id, e);
            }
        });
    }

    /// Most searched first, capped at the trending limit.
    pub async fn list_all(&self) -> Result<Vec<PersistedRecord>, StoreError> {
        let limit = TRENDING_LIMIT.to_string();
        let url = self.endpoint(
            "movies",
            &[("order", "search_count.desc"), ("limit", limit.as_str())],
        )?;
        self.get_rows(url).await
    }
}
