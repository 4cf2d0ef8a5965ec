use std::sync::Arc;
use tracing::{info, warn};

use crate::clients::gemini::GeminiClient;
use crate::clients::supabase::SupabaseClient;
use crate::clients::tmdb::TmdbClient;
use crate::config::Config;
use crate::services::{MovieService, SpoilerPipeline};

/// Catalog and generation calls share one pooled client and rely on the
/// transport's default timeouts.
fn build_shared_http_client() -> anyhow::Result<reqwest::Client> {
    reqwest::Client::builder()
        .user_agent(concat!("SpoilerHub/", env!("CARGO_PKG_VERSION")))
        .pool_max_idle_per_host(10)
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to build shared HTTP client: {e}"))
}

#[derive(Clone)]
pub struct SharedState {
    pub config: Arc<Config>,

    pub movie_service: Arc<dyn MovieService>,
}

impl SharedState {
    pub fn new(config: Config) -> anyhow::Result<Self> {
        let http_client = build_shared_http_client()?;

        let tmdb = TmdbClient::with_shared_client(http_client.clone(), &config.tmdb);
        let gemini = GeminiClient::with_shared_client(http_client, &config.gemini);

        let store = if config.supabase.is_enabled() {
            let client = SupabaseClient::new(&config.supabase)
                .map_err(|e| anyhow::anyhow!("Failed to initialize Supabase client: {e}"))?;
            info!("Supabase persistence enabled");
            Some(Arc::new(client))
        } else {
            warn!("Supabase not configured; spoilers are cached in memory only");
            None
        };

        let movie_service: Arc<dyn MovieService> = Arc::new(SpoilerPipeline::new(
            Arc::new(tmdb),
            Arc::new(gemini),
            store,
            config.tmdb.overview_max_length,
        ));

        Ok(Self {
            config: Arc::new(config),
            movie_service,
        })
    }
}
