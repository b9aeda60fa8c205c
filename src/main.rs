mod application;
mod config;
mod domain;
mod infrastructure;
mod persistence;
mod rate_limit;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::application::handlers::admin_handler::{self, AppState};
use crate::application::services::ingestion_service::IngestionService;
use crate::application::services::odds_writer::OddsWriter;
use crate::application::services::rollup_service::RollupService;
use crate::application::services::settlement_service::SettlementService;
use crate::config::PipelineConfig;
use crate::infrastructure::game_catalog_client::{CatalogConfig, HttpGameCatalogClient};
use crate::infrastructure::odds_feed_client::{FeedConfig, HttpOddsFeedClient};
use crate::persistence::odds_repository::OddsRepository;
use crate::persistence::strategy_repository::StrategyRepository;
use crate::persistence::wager_repository::WagerRepository;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "linekeeper=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = PipelineConfig::from_env();
    info!(
        league = %config.league,
        lookahead_hours = config.lookahead_hours,
        "Linekeeper odds pipeline starting"
    );

    let pool = persistence::init_database(&config.database_url).await?;

    // External clients
    let feed = Arc::new(HttpOddsFeedClient::new(FeedConfig {
        base_url: config.feed_base_url.clone(),
        api_key: config.feed_api_key.clone(),
        timeout: Duration::from_secs(config.feed_timeout_seconds),
    })?);
    let catalog = Arc::new(HttpGameCatalogClient::new(CatalogConfig {
        base_url: config.catalog_base_url.clone(),
        api_key: config.catalog_api_key.clone(),
        timeout: Duration::from_secs(config.catalog_timeout_seconds),
    })?);

    // Repositories
    let odds_repo = Arc::new(OddsRepository::new(pool.clone()));
    let wager_repo = Arc::new(WagerRepository::new(pool.clone()));
    let strategy_repo = Arc::new(StrategyRepository::new(pool.clone()));

    // Services
    let writer = Arc::new(OddsWriter::new(odds_repo.clone()));
    let rollups = Arc::new(RollupService::new(strategy_repo.clone()));
    let ingestion = Arc::new(IngestionService::new(
        feed.clone(),
        catalog.clone(),
        writer,
        config.league.clone(),
        config.lookahead_hours,
        config.include_alternate_lines,
        config.ingest_concurrency,
    ));
    let settlement = Arc::new(SettlementService::new(
        feed,
        catalog,
        odds_repo,
        wager_repo,
        rollups.clone(),
    ));

    let state = AppState {
        ingestion,
        settlement,
        rollups,
    };

    let limiter = rate_limit::admin_rate_limiter(config.admin_requests_per_minute);
    let app = Router::new()
        .route("/", get(|| async { "Linekeeper odds pipeline is running" }))
        .route("/health", get(admin_handler::health_check))
        .route("/admin/ingest", post(admin_handler::ingest_upcoming))
        .route("/admin/ingest/:event_id", post(admin_handler::ingest_event))
        .route("/admin/settle/:event_id", post(admin_handler::settle_event))
        .route(
            "/admin/strategies/:strategy_id/recompute",
            post(admin_handler::recompute_rollup),
        )
        .route(
            "/admin/strategies/:strategy_id/links/:wager_id",
            post(admin_handler::link_wager).delete(admin_handler::unlink_wager),
        )
        .route(
            "/strategies/:strategy_id/rollup",
            get(admin_handler::get_rollup),
        )
        .layer(middleware::from_fn(move |request, next| {
            rate_limit::rate_limit_middleware(limiter.clone(), request, next)
        }))
        .layer(TraceLayer::new_for_http())
        .layer(RequestBodyLimitLayer::new(64 * 1024))
        .with_state(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_address).await?;
    info!("Listening on {}", config.bind_address);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    match tokio::signal::ctrl_c().await {
        Ok(()) => info!("Received Ctrl+C signal"),
        Err(e) => error!("Failed to install Ctrl+C handler: {}", e),
    }
}
