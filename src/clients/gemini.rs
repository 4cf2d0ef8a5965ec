use reqwest::Client;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info};
use url::Url;

use super::error::{UpstreamError, ensure_success};
use crate::config::GeminiConfig;

const SERVICE: &str = "Gemini";

#[derive(Debug, Error)]
pub enum GeminiError {
    #[error("failed to build Gemini request: {0}")]
    Prompt(#[source] serde_json::Error),

    #[error(transparent)]
    Upstream(#[from] UpstreamError),

    #[error("no candidates in Gemini response")]
    EmptyResponse,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    contents: [RequestContent<'a>; 1],
}

#[derive(Serialize)]
struct RequestContent<'a> {
    parts: [RequestPart<'a>; 1],
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: String,
}

impl GenerateResponse {
    /// `None` when there is no candidate at all; a candidate without text
    /// yields an empty string.
    fn into_text(self) -> Option<String> {
        let candidate = self.candidates.into_iter().next()?;
        Some(
            candidate
                .content
                .and_then(|content| content.parts.into_iter().next())
                .map(|part| part.text)
                .unwrap_or_default(),
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct SpoilerKey {
    title: String,
    year: String,
}

impl SpoilerKey {
    fn new(title: &str, year: &str) -> Self {
        Self {
            title: title.to_string(),
            year: year.to_string(),
        }
    }
}

/// Process-lifetime cache of generated spoilers, keyed by exact (title, year).
///
/// Lookups take the shared lock and inserts the exclusive one. There is no
/// expiry and no eviction.
#[derive(Debug, Clone, Default)]
pub struct SpoilerCache {
    entries: Arc<RwLock<HashMap<SpoilerKey, String>>>,
}

impl SpoilerCache {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self, title: &str, year: &str) -> Option<String> {
        self.entries
            .read()
            .await
            .get(&SpoilerKey::new(title, year))
            .cloned()
    }

    pub async fn insert(&self, title: &str, year: &str, spoiler: String) {
        self.entries
            .write()
            .await
            .insert(SpoilerKey::new(title, year), spoiler);
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    api_key: String,
    base_url: String,
    model: String,
    cache: SpoilerCache,
}

impl GeminiClient {
    #[must_use]
    pub fn new(config: &GeminiConfig) -> Self {
        Self::with_shared_client(Client::new(), config)
    }

    #[must_use]
    pub fn with_shared_client(client: Client, config: &GeminiConfig) -> Self {
        Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model.clone(),
            cache: SpoilerCache::new(),
        }
    }

    fn endpoint(&self) -> Result<Url, UpstreamError> {
        let mut url = Url::parse(&format!(
            "{}/models/{}:generateContent",
            self.base_url, self.model
        ))
        .map_err(|e| UpstreamError::url(SERVICE, e))?;

        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }

    /// Returns the cached spoiler for (title, year) or generates and caches a
    /// new one. Concurrent misses for the same key may both reach upstream;
    /// the later insert wins.
    pub async fn generate_spoiler(&self, title: &str, year: &str) -> Result<String, GeminiError> {
        if let Some(cached) = self.cache.get(title, year).await {
            debug!("Spoiler cache hit for '{} ({})'", title, year);
            metrics::counter!("spoiler_cache_hits_total").increment(1);
            return Ok(cached);
        }

        let prompt = build_prompt(title, year);
        let body = serde_json::to_vec(&GenerateRequest {
            contents: [RequestContent {
                parts: [RequestPart { text: &prompt }],
            }],
        })
        .map_err(GeminiError::Prompt)?;

        info!("Requesting spoiler for '{} ({})' from {}", title, year, self.model);
        metrics::counter!("spoiler_generations_total").increment(1);

        let response = self
            .client
            .post(self.endpoint()?)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| UpstreamError::transport(SERVICE, e))?;

        let response: GenerateResponse = ensure_success(SERVICE, response)
            .await?
            .json()
            .await
            .map_err(|e| UpstreamError::decode(SERVICE, e))?;

        let spoiler = response.into_text().ok_or(GeminiError::EmptyResponse)?;

        self.cache.insert(title, year, spoiler.clone()).await;

        Ok(spoiler)
    }

    pub async fn cache_size(&self) -> usize {
        self.cache.len().await
    }

    pub async fn clear_cache(&self) {
        self.cache.clear().await;
    }
}

fn build_prompt(title: &str, year: &str) -> String {
    format!(
        r#"You are a professional film analyst and movie explainer.

Movie Title: {title}
Release Year: {year}

Instructions:
1. Provide a short non-spoiler summary.
2. Clearly display:
   "⚠️ SPOILER WARNING"
3. Provide:
   - Full plot breakdown
   - Major twists
   - Character arcs
   - Ending explanation
   - Hidden clues
   - If ambiguous ending, include interpretations
4. Keep explanation between 600-1000 words.
5. Structure output with markdown headings:
   - Movie Overview
   - Full Spoiler Breakdown
   - Ending Explained
   - Themes & Meaning

Do not fabricate unknown facts."#
    )
}
