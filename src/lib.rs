pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod domain;
pub mod entities;
pub mod models;
pub mod services;

use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;

/// How often expired entries are pruned from the refresh token blacklist.
const BLACKLIST_PRUNE_INTERVAL: Duration = Duration::from_secs(60 * 60);

/// Parses the command line and runs it against an already loaded config.
pub async fn run(config: Config) -> anyhow::Result<()> {
    let cli = Cli::parse();
    config.validate()?;

    init_tracing(&config);

    let prometheus_handle = if config.observability.metrics_enabled {
        use metrics_exporter_prometheus::PrometheusBuilder;
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .context("Failed to install Prometheus recorder")?;
        info!("Prometheus metrics recorder initialized");
        Some(handle)
    } else {
        None
    };

    match cli.command {
        None => run_server(config, prometheus_handle).await,

        Some(Commands::Serve { host, port }) => {
            let mut config = config;
            if let Some(host) = host {
                config.server.host = host;
            }
            if let Some(port) = port {
                config.server.port = port;
            }
            run_server(config, prometheus_handle).await
        }

        Some(Commands::CreateSuperuser {
            email,
            first_name,
            last_name,
            password,
        }) => {
            cli::commands::cmd_create_superuser(&config, email, first_name, last_name, password)
                .await
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    if config.general.log_format.eq_ignore_ascii_case("json") {
        registry
            .with(tracing_subscriber::fmt::layer().json().flatten_event(true))
            .init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn run_server(
    config: Config,
    prometheus_handle: Option<metrics_exporter_prometheus::PrometheusHandle>,
) -> anyhow::Result<()> {
    info!(
        "QuickCheck v{} starting...",
        env!("CARGO_PKG_VERSION")
    );

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let state = api::create_app_state_from_config(config, prometheus_handle).await?;

    let prune_store = state.store.clone();
    let prune_handle = tokio::spawn(async move {
        let mut interval = tokio::time::interval(BLACKLIST_PRUNE_INTERVAL);
        loop {
            interval.tick().await;
            match prune_store.prune_expired_tokens().await {
                Ok(0) => {}
                Ok(removed) => info!(removed, "Pruned expired blacklisted tokens"),
                Err(e) => warn!(error = %e, "Failed to prune token blacklist"),
            }
        }
    });

    let app = api::router(state);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;

    info!("Web server running at http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Web server error")?;

    prune_handle.abort();
    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }
}
