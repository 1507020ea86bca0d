use anyhow::Context;
use link_aggregator::routes::create_routes;
use link_aggregator::{AppConfig, AppState};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // A missing .env file is fine
    dotenvy::dotenv().ok();

    // Initialize tracing for logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Starting link aggregator server...");

    // Load configuration from environment
    let config = AppConfig::from_env();
    info!(
        cache_after_upvotes = config.cache_after_upvotes,
        page_size = config.infinite_scroll_pagination_results,
        "Server configuration loaded"
    );

    // Initialize application state
    let app_state = AppState::new(config.clone())
        .await
        .context("failed to initialize application state")?;
    info!(
        storage = app_state.db.backend(),
        cache = app_state.cache.backend(),
        "Application state initialized"
    );

    // Build our application with routes
    let app = create_routes()
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state);

    let addr: SocketAddr = config
        .server_address()
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server_address()))?;
    let listener = TcpListener::bind(&addr).await?;

    info!("Server running on http://{}", addr);

    // Start serving requests
    axum::serve(listener, app).await?;

    Ok(())
}
