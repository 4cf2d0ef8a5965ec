use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub general: GeneralConfig,

    pub server: ServerConfig,

    pub tmdb: TmdbConfig,

    pub gemini: GeminiConfig,

    pub supabase: SupabaseConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,

    /// File the config was read from; `None` means built-in defaults.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    pub log_level: String,

    /// "production" switches log output to JSON lines.
    pub environment: String,

    /// Number of tokio worker threads (default: 0)
    /// Set to 0 to use the number of CPU cores
    pub worker_threads: usize,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            environment: "development".to_string(),
            worker_threads: 0,
        }
    }
}

impl GeneralConfig {
    #[must_use]
    pub fn is_production(&self) -> bool {
        self.environment.eq_ignore_ascii_case("production")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,

    pub cors_allowed_origins: Vec<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            cors_allowed_origins: vec!["*".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TmdbConfig {
    pub api_key: String,

    pub base_url: String,

    /// Overviews longer than this many bytes are cut and suffixed with "..."
    pub overview_max_length: usize,
}

impl Default for TmdbConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://api.themoviedb.org/3".to_string(),
            overview_max_length: 500,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeminiConfig {
    pub api_key: String,

    pub base_url: String,

    pub model: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: "https://generativelanguage.googleapis.com/v1".to_string(),
            model: "gemini-2.5-flash".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SupabaseConfig {
    pub url: String,

    pub key: String,

    /// Request timeout in seconds (default: 10)
    pub request_timeout_seconds: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            key: String::new(),
            request_timeout_seconds: 10,
        }
    }
}

impl SupabaseConfig {
    /// Persistence is only wired up when both the URL and the key are present.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.url.is_empty() && !self.key.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: true,
        }
    }
}

impl Config {
    /// Loads the first config file found (or defaults), then applies
    /// environment overrides. A `.env` file in the working directory is honored.
    pub fn load() -> Result<Self> {
        let _ = dotenvy::dotenv();

        let mut config = Self::load_file()?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    pub fn load_with_path(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Self::load();
        };

        let _ = dotenvy::dotenv();

        let mut config = Self::load_from_path(path)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        Ok(config)
    }

    fn load_file() -> Result<Self> {
        let paths = Self::config_paths();

        for path in &paths {
            if path.exists() {
                return Self::load_from_path(path);
            }
        }

        Ok(Self::default())
    }

    pub fn load_from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
        config.source = Some(path.to_path_buf());

        Ok(config)
    }

    /// Loading happens before the subscriber exists, so the chosen source is
    /// reported once tracing is up.
    pub fn log_source(&self) {
        match &self.source {
            Some(path) => info!("Loaded config from: {}", path.display()),
            None => info!("No config file found, using defaults"),
        }
    }

    /// Overrides file values with environment variables. The lookup is injected
    /// so tests don't have to mutate the process environment.
    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(key) = lookup("TMDB_API_KEY") {
            self.tmdb.api_key = key;
        }
        if let Some(key) = lookup("GEMINI_API_KEY") {
            self.gemini.api_key = key;
        }
        if let Some(url) = lookup("SUPABASE_URL") {
            self.supabase.url = url;
        }
        if let Some(key) = lookup("SUPABASE_KEY") {
            self.supabase.key = key;
        }
        if let Some(port) = lookup("PORT").and_then(|p| p.parse().ok()) {
            self.server.port = port;
        }
        if let Some(env) = lookup("ENVIRONMENT") {
            self.general.environment = env;
        }
        if let Some(level) = lookup("LOG_LEVEL") {
            self.general.log_level = level;
        }
    }

    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        info!("Config saved to: {}", path.display());
        Ok(())
    }

    fn config_paths() -> Vec<PathBuf> {
        let mut paths = vec![];

        paths.push(PathBuf::from("config.toml"));

        if let Some(config_dir) = dirs::config_dir() {
            paths.push(config_dir.join("spoilerhub").join("config.toml"));
        }

        if let Some(home) = dirs::home_dir() {
            paths.push(home.join(".spoilerhub").join("config.toml"));
        }

        paths
    }

    fn default_config_path() -> PathBuf {
        PathBuf::from("config.toml")
    }

    /// Writes the default config to `path` (or `./config.toml`). An existing
    /// file is left untouched and `false` is returned.
    pub fn create_default_if_missing(path: Option<&Path>) -> Result<bool> {
        let path = path.map_or_else(Self::default_config_path, Path::to_path_buf);
        if path.exists() {
            Ok(false)
        } else {
            let config = Self::default();
            config.save_to_path(&path)?;
            info!("Created default config file: {}", path.display());
            Ok(true)
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.tmdb.api_key.is_empty() {
            anyhow::bail!("TMDB_API_KEY environment variable is required");
        }

        if self.gemini.api_key.is_empty() {
            anyhow::bail!("GEMINI_API_KEY environment variable is required");
        }

        if self.server.port == 0 {
            anyhow::bail!("Server port must be > 0");
        }

        if self.tmdb.overview_max_length == 0 {
            anyhow::bail!("tmdb.overview_max_length must be > 0");
        }

        if self.supabase.url.is_empty() != self.supabase.key.is_empty() {
            tracing::warn!(
                "Only one of SUPABASE_URL/SUPABASE_KEY is set; both are needed for database caching"
            );
        }

        Ok(())
    }

    /// Copy of the config safe to print: API keys are replaced with a mask.
    #[must_use]
    pub fn masked(&self) -> Self {
        let mut masked = self.clone();
        for secret in [
            &mut masked.tmdb.api_key,
            &mut masked.gemini.api_key,
            &mut masked.supabase.key,
        ] {
            if !secret.is_empty() {
                *secret = crate::constants::SECRET_MASK.to_string();
            }
        }
        masked
    }
}
