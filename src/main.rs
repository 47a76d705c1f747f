use std::sync::Arc;
use std::time::Duration;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsblend::config::Config;
use newsblend::routes::{self, AppState};
use newsblend::service::{start_background_refresh, NewsService};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "newsblend=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config_path =
        std::env::var("NEWSBLEND_CONFIG").unwrap_or_else(|_| "feeds.toml".to_string());
    let config = Config::load(&config_path)?;
    info!("Loaded {} feeds from {}", config.feeds.len(), config_path);

    let service = Arc::new(NewsService::from_config(&config)?);

    // Start background refresh task
    if config.refresh_interval_secs > 0 {
        let bg_service = service.clone();
        let interval = Duration::from_secs(config.refresh_interval_secs);
        tokio::spawn(async move {
            start_background_refresh(bg_service, interval).await;
        });
    }

    let app = routes::router(Arc::new(AppState { service }));

    // Start server
    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!("Server starting on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}
