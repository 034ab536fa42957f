use axum::extract::State;
use axum::{http::Method, response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

mod commands;
mod config;
mod database;
mod errors;
mod handlers;
mod models;
mod routes;
mod scoring;
mod services;
mod state;
#[cfg(test)]
mod testutil;

use config::AppConfig;
use database::connection::{ensure_indexes, get_db_client};
use database::match_repo::MongoMatchRepository;
use database::prediction_repo::MongoPredictionRepository;
use services::clock::SystemClock;
use services::fixture_source::LiveScoreFixtureClient;
use services::predictions::PredictionService;
use services::scheduler::{MatchScheduler, SchedulerConfig};
use services::whatsapp::WhatsAppNotifier;
use state::AppState;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let config = Arc::new(AppConfig::from_env());
    tracing::info!("Starting Takhmin...");
    tracing::info!("GROUP_ID: {}", config.group_id);
    tracing::info!("PORT: {}", config.port);

    let db = get_db_client(&config.database_url).await;
    if let Err(e) = ensure_indexes(&db).await {
        tracing::warn!("⚠️ Failed to ensure indexes: {}", e);
    }

    let app_state = initialize_app_state(db, config.clone()).await;
    start_scheduler(&app_state, &config);

    let app = build_router(app_state);
    start_server(app, &config).await;
}

async fn initialize_app_state(db: mongodb::Database, config: Arc<AppConfig>) -> AppState {
    let match_repo = Arc::new(MongoMatchRepository::new(&db));
    let prediction_repo = Arc::new(MongoPredictionRepository::new(&db));
    let notifier = Arc::new(WhatsAppNotifier::new(
        config.whatsapp_token.clone(),
        config.phone_number_id.clone(),
    ));
    let clock = Arc::new(SystemClock);

    let predictions = Arc::new(PredictionService::new(
        match_repo.clone(),
        prediction_repo.clone(),
        clock.clone(),
    ));

    tracing::info!("✅ Repositories and services initialized");

    AppState::new(db, config, predictions, match_repo, notifier, clock)
}

fn start_scheduler(state: &AppState, config: &Arc<AppConfig>) {
    let db = state.db.as_ref().expect("scheduler needs a database");
    let prediction_repo = Arc::new(MongoPredictionRepository::new(db));
    let fixture_source = Arc::new(LiveScoreFixtureClient::new(config.livescore_api_key.clone()));

    let scheduler = Arc::new(MatchScheduler::new(
        state.match_repo.clone(),
        prediction_repo,
        fixture_source,
        state.notifier.clone(),
        state.clock.clone(),
        SchedulerConfig::new(config.group_id.clone(), config.admin_id.clone()),
    ));
    scheduler.spawn();
}

fn build_router(app_state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers(Any)
        .allow_credentials(false);

    Router::new()
        .route("/", get(root_handler))
        .route("/health", get(health_check))
        .route("/api/health", get(api_health_check))
        .nest("/webhook", routes::webhook::routes())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(app_state)
}

async fn start_server(app: Router, config: &AppConfig) {
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .expect("HOST/PORT must form a valid socket address");

    tracing::info!("🚀 Takhmin Bot is ONLINE, listening on {}", addr);

    match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => {
            axum::serve(listener, app).await.unwrap();
        }
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            std::process::exit(1);
        }
    }
}

async fn root_handler() -> &'static str {
    "⚽ Takhmin Prediction Bot"
}

async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "healthy",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}

async fn api_health_check(State(state): State<AppState>) -> Json<Value> {
    use mongodb::bson::doc;

    let db_status = match &state.db {
        Some(db) => match db.run_command(doc! {"ping": 1}).await {
            Ok(_) => "connected",
            Err(_) => "disconnected",
        },
        None => "disconnected",
    };

    Json(json!({
        "status": "healthy",
        "database": db_status,
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
