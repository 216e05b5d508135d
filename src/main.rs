use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{middleware as axum_middleware, routing::get, Router};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod accrual;
mod api;
mod auth;
mod bots;
mod config;
mod contest;
mod db;
mod ledger;
mod locks;
mod matching;
mod metrics;
mod models;
mod scheduler;
mod sports_data;
mod timeutil;
mod utils;
mod websocket;

use crate::accrual::AccrualEngine;
use crate::api::middleware::metrics_middleware;
use crate::bots::BotFleet;
use crate::config::AppConfig;
use crate::contest::ContestEngine;
use crate::db::Database;
use crate::locks::LockManager;
use crate::matching::MatchingEngine;
use crate::scheduler::Scheduler;
use crate::sports_data::SportsDataClient;
use crate::websocket::messages::Broadcaster;

const BOT_TICK_INTERVAL: Duration = Duration::from_secs(15);

/// Shared handles every handler, engine, and background job reaches through.
/// Each engine owns its own slice of the pool plus whatever other engines it
/// needs to call into -- there is no central lock.
pub struct AppState {
    pub config: AppConfig,
    pub db: Database,
    pub locks: Arc<LockManager>,
    pub matching: Arc<MatchingEngine>,
    pub accrual: Arc<AccrualEngine>,
    pub contests: Arc<ContestEngine>,
    pub bots: Arc<BotFleet>,
    pub scheduler: Arc<Scheduler>,
    pub broadcast: Broadcaster,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AppConfig::load()?;
    tracing::info!(port = config.port, node_env = %config.node_env, "starting up");

    let db = Database::connect(&config.database_url).await?;
    let broadcast = websocket::messages::new_hub();

    let locks = Arc::new(LockManager::new(db.pool.clone()));
    let matching = Arc::new(MatchingEngine::new(db.pool.clone(), locks.clone(), broadcast.clone()));
    matching.recover_books(&db.pool).await?;

    let accrual = Arc::new(AccrualEngine::new(db.pool.clone()));
    let contests = Arc::new(ContestEngine::new(db.pool.clone(), locks.clone()));
    let bots = Arc::new(BotFleet::new(
        db.pool.clone(),
        locks.clone(),
        matching.clone(),
        accrual.clone(),
        contests.clone(),
        broadcast.clone(),
    ));
    let sports_data = Arc::new(SportsDataClient::new(config.mysportsfeeds_api_key.clone()));

    let current_season = current_season_slug();
    let scheduler = Arc::new(Scheduler::new(
        db.pool.clone(),
        current_season,
        contests.clone(),
        bots.clone(),
        sports_data.clone(),
        broadcast.clone(),
    ));
    scheduler.spawn_all(BOT_TICK_INTERVAL);

    let prometheus_handle = metrics::init_metrics();

    let state = Arc::new(AppState {
        config: config.clone(),
        db,
        locks,
        matching,
        accrual,
        contests,
        bots,
        scheduler,
        broadcast,
    });

    let app = Router::new()
        .route("/health", get(health_check))
        .route(
            "/metrics",
            get(move || {
                let handle = prometheus_handle.clone();
                async move { handle.render() }
            }),
        )
        .nest("/api", api::routes::create_router(state.clone()))
        .nest("/ws", websocket::routes::create_router(state.clone()))
        .layer(axum_middleware::from_fn(metrics_middleware))
        .layer(CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check() -> &'static str {
    "OK"
}

/// The sports-data provider keys seasons like `2024-2025-regular`; the
/// league year rolls over in August, not January.
fn current_season_slug() -> String {
    use chrono::Datelike;
    let today = timeutil::now_et().date_naive();
    let start_year = if today.month() >= 8 { today.year() } else { today.year() - 1 };
    format!("{start_year}-{}-regular", start_year + 1)
}
