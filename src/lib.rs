pub mod api;
pub mod cli;
pub mod clients;
pub mod config;
pub mod constants;
pub mod models;
pub mod services;
pub mod state;

use anyhow::Context;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use tokio::signal;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

fn init_tracing(config: &Config) -> anyhow::Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    // Production ships JSON lines; everything else gets human-readable output.
    let (json_layer, text_layer) = if config.general.is_production() {
        (Some(tracing_subscriber::fmt::layer().json()), None)
    } else {
        (None, Some(tracing_subscriber::fmt::layer()))
    };

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .try_init()
        .context("Failed to initialize tracing")
}

fn init_metrics(config: &Config) -> anyhow::Result<Option<PrometheusHandle>> {
    if !config.observability.metrics_enabled {
        return Ok(None);
    }

    let handle = PrometheusBuilder::new()
        .install_recorder()
        .context("Failed to install Prometheus recorder")?;
    info!("Prometheus metrics recorder initialized");
    Ok(Some(handle))
}

pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
    init_tracing(&config)?;

    let command = cli.command.unwrap_or(Commands::Serve);
    if command != Commands::InitConfig {
        config.log_source();
    }

    match command {
        Commands::Serve => run_server(config).await,
        Commands::Check => cli::cmd_check(&config),
        Commands::InitConfig => cli::cmd_init_config(cli.config.as_deref()),
    }
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    config.validate()?;

    info!("SpoilerHub v{} starting...", env!("CARGO_PKG_VERSION"));

    let prometheus_handle = init_metrics(&config)?;
    let port = config.server.port;

    let state = api::create_app_state_from_config(config, prometheus_handle)?;
    let app = api::router(state);

    let addr = format!("0.0.0.0:{port}");
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("🌐 Server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Server stopped");
    Ok(())
}
