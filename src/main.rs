use anyhow::Result;
use std::sync::Arc;
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use charger_status_api::{
    api::{self, AppState},
    config::Config,
    db,
    repositories::MappingsRepository,
    services::StatusService,
    upstream::StatusClient,
};

#[tokio::main]
async fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();

    info!("Starting charger-status-api");

    let cfg_path = std::env::var("APP_CONFIG").unwrap_or_else(|_| "config/config.yaml".into());
    let cfg = Config::load_or_default(&cfg_path)?;
    info!("Configuration loaded");

    let pool = db::connect(&cfg.database.url, cfg.database.max_connections).await?;
    db::init_schema(&pool).await?;
    info!("Database ready at {}", cfg.database.url);

    let repository = Arc::new(MappingsRepository::new(pool));
    let client = StatusClient::new(&cfg.upstream)?;
    let status_service = StatusService::new(repository.clone(), client, cfg.upstream.concurrency);
    info!(
        base_url = %cfg.upstream.base_url,
        timeout_secs = cfg.upstream.timeout_secs,
        concurrency = cfg.upstream.concurrency,
        "Status client configured"
    );

    let app = api::create_router(AppState::new(repository, status_service), &cfg.cors);

    let addr = cfg.api_bind_address();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to bind to {}: {}", addr, e))?;
    info!("API server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Application shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    info!("Shutdown signal received");
}
